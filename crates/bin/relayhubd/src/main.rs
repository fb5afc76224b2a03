//! # relayhubd: relayhub daemon
//!
//! Composition root that wires the hub, the integrations and the HTTP
//! adapter together and runs them.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Construct the hub (with the HTTP resolver when peers are configured),
//!   register integration actions, apply declarative schedules and links
//! - Build the axum router and serve it until an exit is requested
//!   (`app.stop`, `app.restart`, `app.shutdown`, `app.reboot`, or
//!   SIGINT/SIGTERM)
//! - Tear down, then exit, start over, or ask the host to power off/reboot
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod power;
mod wiring;

use std::error::Error;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use relayhub_adapter_http_axum::router;
use relayhub_adapter_http_axum::state::AppState;
use relayhub_adapter_http_client::HttpResolver;
use relayhub_adapter_virtual::VirtualIntegration;
use relayhub_app::hub::Hub;
use relayhub_app::ports::SignalSource;
use relayhub_domain::system::ExitReason;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    loop {
        match run(&config).await? {
            ExitReason::Stop => break,
            ExitReason::Restart => tracing::info!("restarting"),
            ExitReason::Shutdown => {
                power::run(&config.lifecycle.shutdown_command).await?;
                break;
            }
            ExitReason::Reboot => {
                power::run(&config.lifecycle.reboot_command).await?;
                break;
            }
        }
    }
    Ok(())
}

/// One lifetime of the hub, from construction to teardown.
async fn run(config: &Config) -> Result<ExitReason, Box<dyn Error>> {
    let hub = Arc::new(build_hub(config)?);

    let mut integration = if config.integrations.virtual_enabled {
        let mut integration = VirtualIntegration::new(config.virtual_integration())?;
        for action in integration.actions()? {
            hub.register(action)?;
        }
        integration.start(Arc::clone(hub.signals())).await?;
        Some(integration)
    } else {
        None
    };

    wiring::apply(&hub, config)?;
    hub.start().await?;

    let app = router::build(AppState::new(Arc::clone(&hub)));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "relayhubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(exit_requested(Arc::clone(&hub)))
        .await?;

    let reason = hub.exit_requested().unwrap_or(ExitReason::Stop);
    hub.shutdown().await;
    if let Some(integration) = integration.as_mut()
        && let Err(err) = integration.teardown().await
    {
        tracing::warn!(%err, integration = integration.name(), "teardown failed");
    }
    tracing::info!(?reason, "relayhubd stopped");
    Ok(reason)
}

/// The hub, asking the configured peers about identifiers it does not know.
fn build_hub(config: &Config) -> Result<Hub, Box<dyn Error>> {
    let builder = Hub::builder().config(config.hub());
    if config.remote.peers.is_empty() {
        return Ok(builder.build()?);
    }
    let resolver = HttpResolver::new(
        config.remote.peers.iter().cloned(),
        config.remote.describe_timeout(),
    )?;
    tracing::info!(peers = ?resolver.peers(), "remote peers configured");
    Ok(builder.remote(Arc::new(resolver)).build()?)
}

/// Resolves once a system action asked to exit or the process received
/// SIGINT/SIGTERM (which counts as `app.stop`).
async fn exit_requested(hub: Arc<Hub>) {
    let exit = hub.wait_for_exit();
    tokio::select! {
        () = terminate() => hub.request_exit(ExitReason::Stop),
        reason = exit => tracing::info!(?reason, "exit requested by system action"),
    }
}

async fn terminate() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = sigterm => {},
    }
}
