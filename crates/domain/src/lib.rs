//! # relayhub-domain
//!
//! Pure domain model for the relayhub action framework.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **call arguments** ([`value::Args`]) and their binding onto the
//!   parameters an action declares
//! - Define **action metadata** (what a dashboard or a remote peer needs to
//!   know about an action)
//! - Define **recurrences** (the time rules schedules fire on)
//! - Define **links** (trigger evaluation against value-changed notifications)
//! - Define **signals** (value-changed notifications) and the reserved
//!   system identifiers
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod link;
pub mod recurrence;
pub mod signal;
pub mod system;
pub mod value;
