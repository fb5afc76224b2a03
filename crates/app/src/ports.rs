//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the action runtime and the outside world.
//! They are defined here (in `app`) so that both the runtime and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod clock;
pub mod integration;
pub mod remote;
pub mod signal;

pub use clock::{Clock, SystemClock};
pub use integration::SignalSource;
pub use remote::RemoteResolver;
pub use signal::SignalPublisher;
