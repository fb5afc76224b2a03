//! # relayhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** over the hub: action metadata, remote invocation
//!   and interrupt, the dashboard catalog, schedules and links
//! - Ingest external signal values (`PUT /api/signals/{source}`) and stream
//!   value changes to subscribers as Server-Sent Events
//! - Map [`RelayHubError`](relayhub_domain::error::RelayHubError) into HTTP
//!   status codes
//!
//! ## Dependency rule
//! Depends on `relayhub-app` (for the hub) and `relayhub-domain` (for the
//! types used in request/response mapping). Never leaks axum types into the
//! domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod testing;
