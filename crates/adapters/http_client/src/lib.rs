//! # relayhub-adapter-http-client
//!
//! Client half of cross-process invocation, built on
//! [reqwest](https://docs.rs/reqwest).
//!
//! ## Responsibilities
//! - Implement the [`RemoteResolver`](relayhub_app::ports::RemoteResolver)
//!   port against the action API served by `relayhub-adapter-http-axum`
//! - Ask the configured peers, in order, which one defines an identifier,
//!   and remember the answer
//! - Map HTTP error answers back onto
//!   [`RelayHubError`](relayhub_domain::error::RelayHubError)
//!
//! ## Dependency rule
//! Depends on `relayhub-app` (for the port) and `relayhub-domain` (for the
//! wire types). Never leaks reqwest types into the domain.

mod resolver;

pub use resolver::{HttpResolver, ResolverError};
