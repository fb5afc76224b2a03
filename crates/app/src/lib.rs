//! # relayhub-app
//!
//! Application layer: the action runtime and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Run **actions**: synchronous, time-bounded and asynchronous invocation,
//!   cooperative exit flags and interrupt handlers ([`action`])
//! - Keep the **registry** of actions, falling back to a remote resolver for
//!   identifiers defined elsewhere ([`registry`])
//! - Fire actions on **schedules** from one background clock loop
//!   ([`scheduler`])
//! - Fire and interrupt actions on **links** to value-changed signals
//!   ([`link_engine`]) delivered by the in-process [`signal_bus`]
//! - Record **dashboard controls** ([`dashboard`]) and compose everything into
//!   a [`hub::Hub`] with a process lifecycle
//! - Define **port traits** adapters implement: remote peers, clocks, signal
//!   publishers and signal sources ([`ports`])
//!
//! ## Dependency rule
//! Depends on `relayhub-domain` only (plus `tokio` for tasks and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod action;
pub mod dashboard;
pub mod hub;
pub mod link_engine;
pub mod ports;
pub mod registry;
pub mod scheduler;
pub mod signal_bus;
