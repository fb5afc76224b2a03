//! Virtual temperature sensor: a slow, deterministic sine wave.

use std::f64::consts::TAU;

use relayhub_domain::error::ValidationError;
use relayhub_domain::id::SignalId;

/// Readings complete one cycle every this many steps.
const PERIOD_STEPS: u32 = 24;

/// A simulated temperature sensor publishing on `sensor.<name>`.
#[derive(Debug, Clone)]
pub struct VirtualSensor {
    source: SignalId,
    base: f64,
    amplitude: f64,
}

impl VirtualSensor {
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `name` is not a valid identifier
    /// segment.
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            source: SignalId::sensor(name)?,
            base: 21.5,
            amplitude: 3.0,
        })
    }

    #[must_use]
    pub fn source(&self) -> &SignalId {
        &self.source
    }

    /// Reading at `step`, in °C rounded to a tenth of a degree.
    #[must_use]
    pub fn reading(&self, step: u32) -> f64 {
        let phase = TAU * f64::from(step % PERIOD_STEPS) / f64::from(PERIOD_STEPS);
        let value = self.base + self.amplitude * phase.sin();
        (value * 10.0).round() / 10.0
    }
}
