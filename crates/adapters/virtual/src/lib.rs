//! # relayhub-adapter-virtual
//!
//! Virtual/demo integration that simulates signal sources and devices for
//! testing and demonstration purposes.
//!
//! ## Provided signals and actions
//!
//! | Kind | Identifier | Behaviour |
//! |------|------------|-----------|
//! | Signal | `sensor.virtual_temperature` | Sine wave around 21.5 °C, one reading per sensor interval |
//! | Signal | `gpio.<pin>` | Button level flipping once per button interval |
//! | Action | `light.turn_on` / `light.turn_off` | Switch the virtual light |
//! | Action | `fan.run` | Spin the virtual fan until its duration elapses; interruptible |
//!
//! ## Dependency rule
//!
//! Depends on `relayhub-app` (port traits) and `relayhub-domain` only.

mod devices;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use relayhub_app::action::Action;
use relayhub_app::ports::{SignalPublisher, SignalSource};
use relayhub_domain::error::RelayHubError;
use relayhub_domain::value::Value;

pub use devices::{VirtualButton, VirtualFan, VirtualLight, VirtualSensor};

/// Settings of the virtual integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualConfig {
    pub sensor_interval: Duration,
    pub button_interval: Duration,
    pub button_pin: u8,
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            sensor_interval: Duration::from_secs(5),
            button_interval: Duration::from_secs(30),
            button_pin: 17,
        }
    }
}

/// Virtual integration publishing simulated readings.
pub struct VirtualIntegration {
    config: VirtualConfig,
    sensor: VirtualSensor,
    button: Arc<VirtualButton>,
    light: VirtualLight,
    fan: VirtualFan,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl VirtualIntegration {
    /// # Errors
    ///
    /// Returns [`RelayHubError::Validation`] if a simulated source cannot be
    /// named.
    pub fn new(config: VirtualConfig) -> Result<Self, RelayHubError> {
        Ok(Self {
            config,
            sensor: VirtualSensor::new("virtual_temperature")?,
            button: Arc::new(VirtualButton::new(config.button_pin)),
            light: VirtualLight::default(),
            fan: VirtualFan::default(),
            shutdown: CancellationToken::new(),
            tasks: Vec::new(),
        })
    }

    #[must_use]
    pub fn light(&self) -> &VirtualLight {
        &self.light
    }

    #[must_use]
    pub fn fan(&self) -> &VirtualFan {
        &self.fan
    }

    #[must_use]
    pub fn button(&self) -> &VirtualButton {
        &self.button
    }
}

impl SignalSource for VirtualIntegration {
    fn name(&self) -> &'static str {
        "virtual"
    }

    fn actions(&self) -> Result<Vec<Action>, RelayHubError> {
        let mut actions = self.light.actions()?;
        actions.push(self.fan.action()?);
        Ok(actions)
    }

    async fn start(
        &mut self,
        publisher: impl SignalPublisher + Clone + Send + Sync + 'static,
    ) -> Result<(), RelayHubError> {
        let sensor = self.sensor.clone();
        let sensor_publisher = publisher.clone();
        self.tasks.push(every(
            self.config.sensor_interval,
            self.shutdown.child_token(),
            move |step| {
                let publisher = sensor_publisher.clone();
                let source = sensor.source().clone();
                let reading = sensor.reading(step);
                async move { publisher.publish(source, Value::from(reading)).await }
            },
        ));

        let button = Arc::clone(&self.button);
        self.tasks.push(every(
            self.config.button_interval,
            self.shutdown.child_token(),
            move |_| {
                let publisher = publisher.clone();
                let source = button.source().clone();
                let level = button.toggle();
                async move { publisher.publish(source, Value::from(level)).await }
            },
        ));

        tracing::info!(
            sensor = %self.sensor.source(),
            button = %self.button.source(),
            "virtual integration started"
        );
        Ok(())
    }

    async fn teardown(&mut self) -> Result<(), RelayHubError> {
        self.shutdown.cancel();
        for task in self.tasks.drain(..) {
            if let Err(err) = task.await {
                tracing::warn!(%err, "virtual task ended abnormally");
            }
        }
        Ok(())
    }
}

/// Run `publish(step)` every `period`, the first time immediately.
fn every<F, Fut>(period: Duration, shutdown: CancellationToken, publish: F) -> JoinHandle<()>
where
    F: Fn(u32) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), RelayHubError>> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        let mut step = 0_u32;
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(err) = publish(step).await {
                        tracing::warn!(%err, "failed to publish virtual reading");
                    }
                    step = step.wrapping_add(1);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayhub_app::signal_bus::SignalBus;
    use relayhub_domain::id::SignalId;

    fn fast() -> VirtualConfig {
        VirtualConfig {
            sensor_interval: Duration::from_millis(10),
            button_interval: Duration::from_millis(10),
            button_pin: 4,
        }
    }

    #[test]
    fn should_return_virtual_as_name() {
        let integration = VirtualIntegration::new(VirtualConfig::default()).unwrap();
        assert_eq!(integration.name(), "virtual");
    }

    #[test]
    fn should_provide_light_and_fan_actions() {
        let integration = VirtualIntegration::new(VirtualConfig::default()).unwrap();
        let ids: Vec<String> = integration
            .actions()
            .unwrap()
            .iter()
            .map(|action| action.id().to_string())
            .collect();
        assert_eq!(ids, ["light.turn_on", "light.turn_off", "fan.run"]);
    }

    #[tokio::test]
    async fn should_publish_sensor_and_button_values_until_teardown() {
        let bus = Arc::new(SignalBus::new(64));
        let mut integration = VirtualIntegration::new(fast()).unwrap();
        integration.start(Arc::clone(&bus)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        integration.teardown().await.unwrap();

        let temperature = SignalId::sensor("virtual_temperature").unwrap();
        assert!(bus.latest(&temperature).and_then(|v| v.as_f64()).is_some());
        assert!(bus.latest(&SignalId::gpio(4)).is_some_and(|v| v.is_boolean()));
    }
}
