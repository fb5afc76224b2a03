//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `relayhub.toml` in the working directory (or the file named by
//! `RELAYHUB_CONFIG`). Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use relayhub_adapter_virtual::VirtualConfig;
use relayhub_app::hub::HubConfig;
use relayhub_domain::error::ValidationError;
use relayhub_domain::id::{ActionId, SignalId};
use relayhub_domain::link::{LinkConfig, Trigger};
use relayhub_domain::recurrence::{ClockTime, Recurrence, Unit};
use relayhub_domain::value::{Args, Map, Value};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Scheduler clock loop.
    pub scheduler: SchedulerConfig,
    /// Signal bus.
    pub signals: SignalsConfig,
    /// Exit hooks and host power control.
    pub lifecycle: LifecycleConfig,
    /// Integration toggles.
    pub integrations: IntegrationsConfig,
    /// Peer hubs that resolve actions not registered here.
    pub remote: RemoteConfig,
    /// Declarative schedules.
    pub schedules: Vec<ScheduleEntry>,
    /// Declarative links.
    pub links: Vec<LinkEntry>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Resolution of the clock loop in milliseconds.
    pub tick_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    /// Capacity of the broadcast channel behind the signal bus.
    pub capacity: usize,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Bound on the `app_exit` hook.
    pub exit_timeout_secs: u64,
    /// Program and arguments run after `app.shutdown`.
    pub shutdown_command: Vec<String>,
    /// Program and arguments run after `app.reboot`.
    pub reboot_command: Vec<String>,
}

/// Per-integration toggles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    /// Enable the virtual/demo integration.
    pub virtual_enabled: bool,
    pub sensor_interval_secs: u64,
    pub button_interval_secs: u64,
    pub button_pin: u8,
}

/// Peer hubs asked about identifiers this hub does not define.
///
/// ```toml
/// [remote]
/// peers = ["http://10.0.0.7:3000"]
/// ```
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URLs of the peers, asked in order.
    pub peers: Vec<String>,
    /// Bound on one lookup at one peer, in milliseconds.
    pub describe_timeout_ms: u64,
}

impl RemoteConfig {
    #[must_use]
    pub fn describe_timeout(&self) -> Duration {
        Duration::from_millis(self.describe_timeout_ms)
    }
}

/// One `[[schedules]]` table.
///
/// ```toml
/// [[schedules]]
/// action = "fan.run"
/// every = 1
/// unit = "days"
/// at = "07:00"
/// kwargs = { speed = 2, duration_secs = 600 }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleEntry {
    pub action: ActionId,
    #[serde(default = "one")]
    pub every: u32,
    pub unit: ScheduleUnit,
    #[serde(default)]
    pub at: Option<ClockTime>,
    #[serde(default)]
    pub until: Option<ClockTime>,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

fn one() -> u32 {
    1
}

impl ScheduleEntry {
    /// The validated recurrence rule of this entry.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the rule is inconsistent.
    pub fn recurrence(&self) -> Result<Recurrence, ValidationError> {
        let mut builder = Recurrence::every(self.every).unit(self.unit.0);
        if let Some(at) = self.at {
            builder = builder.at(at);
        }
        if let Some(until) = self.until {
            builder = builder.until(until);
        }
        builder.build()
    }

    #[must_use]
    pub fn args(&self) -> Args {
        Args {
            positional: self.args.clone(),
            keyword: self.kwargs.clone(),
        }
    }
}

/// Schedule unit as written in the config file: `minutes`, `hours`, `days`
/// (singular accepted) or a weekday name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct ScheduleUnit(pub Unit);

impl TryFrom<String> for ScheduleUnit {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let unit = match value.to_ascii_lowercase().as_str() {
            "minute" | "minutes" => Unit::Minute,
            "hour" | "hours" => Unit::Hour,
            "day" | "days" => Unit::Day,
            other => other
                .parse::<chrono::Weekday>()
                .map(Unit::Weekday)
                .map_err(|_| format!("unknown schedule unit `{value}`"))?,
        };
        Ok(Self(unit))
    }
}

/// One `[[links]]` table.
///
/// ```toml
/// [[links]]
/// action = "fan.run"
/// source = "sensor.virtual_temperature"
/// trigger = { above = 23.0 }
/// interrupt = { below = 21.0 }
/// parameters = { keyword = { speed = 3 } }
/// ```
///
/// With neither `trigger` nor `interrupt`, truthy values invoke and falsy
/// values interrupt.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkEntry {
    pub action: ActionId,
    pub source: SignalId,
    #[serde(default)]
    pub trigger: Option<Trigger>,
    #[serde(default)]
    pub interrupt: Option<Trigger>,
    #[serde(default)]
    pub pass_value: bool,
    #[serde(default)]
    pub parameters: Args,
    #[serde(default)]
    pub interrupt_parameters: Args,
}

impl LinkEntry {
    #[must_use]
    pub fn link_config(&self) -> LinkConfig {
        let mut builder = LinkConfig::builder()
            .pass_value(self.pass_value)
            .action_parameters(self.parameters.clone())
            .interrupt_parameters(self.interrupt_parameters.clone());
        if let Some(trigger) = self.trigger.clone() {
            builder = builder.trigger_value(trigger);
        }
        if let Some(trigger) = self.interrupt.clone() {
            builder = builder.trigger_interrupt_value(trigger);
        }
        builder.build()
    }
}

impl Config {
    /// Load configuration from `relayhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("RELAYHUB_CONFIG").unwrap_or_else(|_| "relayhub.toml".to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RELAYHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("RELAYHUB_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("RELAYHUB_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("RELAYHUB_PEERS") {
            self.remote.peers = val
                .split(',')
                .map(str::trim)
                .filter(|peer| !peer.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(val) = std::env::var("RELAYHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.scheduler.tick_ms == 0 {
            return Err(ConfigError::Validation(
                "scheduler tick must be non-zero".to_string(),
            ));
        }
        if self.signals.capacity == 0 {
            return Err(ConfigError::Validation(
                "signal capacity must be non-zero".to_string(),
            ));
        }
        if !self.remote.peers.is_empty() && self.remote.describe_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "remote lookup timeout must be non-zero".to_string(),
            ));
        }
        for entry in &self.schedules {
            entry.recurrence().map_err(|err| {
                ConfigError::Validation(format!("schedule of `{}`: {err}", entry.action))
            })?;
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn hub(&self) -> HubConfig {
        HubConfig {
            tick: Duration::from_millis(self.scheduler.tick_ms),
            signal_capacity: self.signals.capacity,
            exit_timeout: Duration::from_secs(self.lifecycle.exit_timeout_secs),
        }
    }

    #[must_use]
    pub fn virtual_integration(&self) -> VirtualConfig {
        VirtualConfig {
            sensor_interval: Duration::from_secs(self.integrations.sensor_interval_secs.max(1)),
            button_interval: Duration::from_secs(self.integrations.button_interval_secs.max(1)),
            button_pin: self.integrations.button_pin,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "relayhubd=info,relayhub_app=info,relayhub_adapter_virtual=info,tower_http=debug"
                .to_string(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { tick_ms: 250 }
    }
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            exit_timeout_secs: 10,
            shutdown_command: vec!["systemctl".to_string(), "poweroff".to_string()],
            reboot_command: vec!["systemctl".to_string(), "reboot".to_string()],
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            virtual_enabled: true,
            sensor_interval_secs: 5,
            button_interval_secs: 30,
            button_pin: 17,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            peers: Vec::new(),
            describe_timeout_ms: 2000,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
