//! Virtual fan: `fan.run` spins until its duration elapses or it is
//! interrupted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;

use relayhub_app::action::{Action, Invocation};
use relayhub_domain::action::ParamSpec;
use relayhub_domain::error::ValidationError;
use relayhub_domain::value::Value;

/// How often a running fan looks at its exit flag.
const POLL: Duration = Duration::from_millis(100);

/// A simulated fan with a speed level (0 is off).
#[derive(Debug, Clone, Default)]
pub struct VirtualFan {
    speed: Arc<AtomicU64>,
}

impl VirtualFan {
    #[must_use]
    pub fn speed(&self) -> u64 {
        self.speed.load(Ordering::SeqCst)
    }

    /// The interruptible `fan.run` action.
    ///
    /// Parameters: `speed` (default 1) and `duration_secs` (default: run
    /// until interrupted).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the action cannot be built.
    pub fn action(&self) -> Result<Action, ValidationError> {
        let speed = Arc::clone(&self.speed);
        let stop = Arc::clone(&self.speed);
        Action::builder("run")
            .controller("fan")
            .name("Run fan")
            .param(ParamSpec::optional("speed", 1))
            .param(ParamSpec::optional("duration_secs", Value::Null))
            .work(move |invocation| spin(Arc::clone(&speed), invocation))
            .on_interrupt(move |_| {
                stop.store(0, Ordering::SeqCst);
                tracing::info!("virtual fan interrupted");
                async { Ok(()) }
            })
            .build()
    }
}

async fn spin(speed: Arc<AtomicU64>, invocation: Invocation) -> anyhow::Result<Value> {
    let level = invocation
        .param("speed")
        .and_then(Value::as_u64)
        .unwrap_or(1);
    let duration = invocation
        .param("duration_secs")
        .and_then(Value::as_f64)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok());

    speed.store(level, Ordering::SeqCst);
    tracing::info!(speed = level, ?duration, "virtual fan running");

    let started = Instant::now();
    let mut ticks = 0_u64;
    let interrupted = loop {
        if invocation.exit_flag().sleep(POLL).await {
            break true;
        }
        ticks += 1;
        if duration.is_some_and(|d| started.elapsed() >= d) {
            break false;
        }
    };

    speed.store(0, Ordering::SeqCst);
    Ok(json!({ "ticks": ticks, "interrupted": interrupted }))
}
