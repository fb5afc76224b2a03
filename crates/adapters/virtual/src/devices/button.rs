//! Virtual push button on a GPIO channel.

use std::sync::atomic::{AtomicBool, Ordering};

use relayhub_domain::id::SignalId;

/// A simulated button whose level flips each time it is pressed.
#[derive(Debug)]
pub struct VirtualButton {
    source: SignalId,
    level: AtomicBool,
}

impl VirtualButton {
    #[must_use]
    pub fn new(pin: u8) -> Self {
        Self {
            source: SignalId::gpio(pin),
            level: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn source(&self) -> &SignalId {
        &self.source
    }

    #[must_use]
    pub fn level(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    /// Flip the level and return the new one.
    pub fn toggle(&self) -> bool {
        !self.level.fetch_xor(true, Ordering::SeqCst)
    }
}
