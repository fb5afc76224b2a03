//! Hub: composition of registry, signal bus, link engine, scheduler and
//! dashboard catalog, plus the process lifecycle.
//!
//! The hub registers the reserved system actions (`app.stop`,
//! `app.restart`, `app.shutdown`, `app.reboot`) on construction. Calling one
//! of them records an [`ExitReason`] that the daemon waits on. The optional
//! `app_main` and `app_exit` actions are ordinary registrations the hub calls
//! on [`start`](Hub::start) and [`shutdown`](Hub::shutdown).

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use relayhub_domain::error::RelayHubError;
use relayhub_domain::id::{ActionId, LinkId, SignalId};
use relayhub_domain::link::LinkConfig;
use relayhub_domain::signal::ValueChanged;
use relayhub_domain::system::{APP_EXIT, APP_MAIN, ExitReason};
use relayhub_domain::value::{Args, Value};

use crate::action::{Action, CallOptions, Outcome};
use crate::dashboard::{Dashboard, DashboardOptions};
use crate::link_engine::LinkEngine;
use crate::ports::{Clock, RemoteResolver, SystemClock};
use crate::registry::{ActionRef, Registry};
use crate::scheduler::{DEFAULT_TICK, ScheduleBuilder, Scheduler};
use crate::signal_bus::SignalBus;

/// Tunables of a [`Hub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubConfig {
    /// Resolution of the scheduler's clock loop.
    pub tick: Duration,
    /// Capacity of the signal bus broadcast channel.
    pub signal_capacity: usize,
    /// Bound on the `app_exit` hook.
    pub exit_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            signal_capacity: 256,
            exit_timeout: Duration::from_secs(10),
        }
    }
}

/// The running action framework.
pub struct Hub {
    config: HubConfig,
    registry: Arc<Registry>,
    signals: Arc<SignalBus>,
    links: Arc<LinkEngine>,
    scheduler: Arc<Scheduler>,
    dashboard: Dashboard,
    exit: Arc<watch::Sender<Option<ExitReason>>>,
    shutdown: CancellationToken,
    started: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Hub {
    #[must_use]
    pub fn builder() -> HubBuilder {
        HubBuilder::default()
    }

    /// Hub with the system clock and no remote peers.
    ///
    /// # Errors
    ///
    /// See [`HubBuilder::build`].
    pub fn new(config: HubConfig) -> Result<Self, RelayHubError> {
        Self::builder().config(config).build()
    }

    #[must_use]
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    #[must_use]
    pub fn signals(&self) -> &Arc<SignalBus> {
        &self.signals
    }

    #[must_use]
    pub fn links(&self) -> &LinkEngine {
        &self.links
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Register `action` and route its return values onto the signal bus as
    /// `action.<id>`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::DuplicateIdentifier`] if the identifier is
    /// taken (reserved system identifiers always are).
    pub fn register(&self, action: Action) -> Result<ActionHandle<'_>, RelayHubError> {
        let action = self.registry.register(action)?;
        let signals = Arc::clone(&self.signals);
        action.attach_sink(Arc::new(move |id, value| {
            signals.emit(SignalId::action(id), value.clone());
        }));
        tracing::info!(action = %action.id(), "action registered");
        Ok(ActionHandle { hub: self, action })
    }

    /// Handle on an already registered local action.
    #[must_use]
    pub fn handle(&self, id: &ActionId) -> Option<ActionHandle<'_>> {
        self.registry
            .get(id)
            .map(|action| ActionHandle { hub: self, action })
    }

    /// Resolve `id`, locally or through the remote resolver.
    ///
    /// # Errors
    ///
    /// See [`Registry::resolve`].
    pub async fn action(&self, id: &ActionId) -> Result<ActionRef, RelayHubError> {
        self.registry.resolve(id).await
    }

    /// Record a new value of `source` on the signal bus.
    pub fn publish(&self, source: SignalId, value: Value) -> Option<ValueChanged> {
        self.signals.update(source, value)
    }

    /// Spawn the link engine and the scheduler, then invoke `app_main` in the
    /// background if it is registered. Starting twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the error of invoking `app_main` (argument binding only; its
    /// own failures are logged).
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> Result<(), RelayHubError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        {
            let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            tasks.push(
                Arc::clone(&self.links).spawn(self.signals.subscribe(), self.shutdown.child_token()),
            );
            tasks.push(
                Arc::clone(&self.scheduler).spawn(self.config.tick, self.shutdown.child_token()),
            );
        }
        tracing::info!(
            actions = self.registry.list().len(),
            tick = ?self.config.tick,
            "hub started"
        );

        if let Some(main) = self.registry.get(&ActionId::new(APP_MAIN)?) {
            main.call_with(Args::new(), CallOptions::background()).await?;
        }
        Ok(())
    }

    /// Ask the process to leave its run loop. The first request wins.
    pub fn request_exit(&self, reason: ExitReason) {
        request_exit(&self.exit, reason);
    }

    #[must_use]
    pub fn exit_requested(&self) -> Option<ExitReason> {
        *self.exit.borrow()
    }

    /// Wait until a system action (or [`request_exit`](Self::request_exit))
    /// asks the process to exit.
    pub fn wait_for_exit(&self) -> impl Future<Output = ExitReason> + Send + 'static {
        let mut receiver = self.exit.subscribe();
        async move {
            receiver
                .wait_for(Option::is_some)
                .await
                .ok()
                .and_then(|reason| *reason)
                .unwrap_or(ExitReason::Stop)
        }
    }

    /// Stop the background loops, then run `app_exit` bounded by the
    /// configured exit timeout.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for task in tasks {
            if let Err(err) = task.await {
                tracing::warn!(%err, "background task ended abnormally");
            }
        }

        if let Ok(id) = ActionId::new(APP_EXIT)
            && let Some(exit) = self.registry.get(&id)
        {
            let options = CallOptions::sync().with_timeout(self.config.exit_timeout);
            match exit.call_with(Args::new(), options).await {
                Ok(_) => tracing::debug!("app_exit completed"),
                Err(err) => tracing::warn!(%err, "app_exit did not complete"),
            }
        }
        tracing::info!("hub stopped");
    }

    fn register_system_actions(&self) -> Result<(), RelayHubError> {
        for reason in ExitReason::all() {
            let exit = Arc::clone(&self.exit);
            let action = Action::builder(format!("{reason:?}").to_lowercase())
                .id(reason.action_id())
                .work(move |_| {
                    request_exit(&exit, reason);
                    let value = serde_json::to_value(reason).map_err(anyhow::Error::from);
                    async move { value }
                })
                .build()?;
            self.register(action)?;
        }
        Ok(())
    }
}

fn request_exit(exit: &watch::Sender<Option<ExitReason>>, reason: ExitReason) {
    let accepted = exit.send_if_modified(|current| {
        if current.is_some() {
            return false;
        }
        *current = Some(reason);
        true
    });
    if accepted {
        tracing::info!(?reason, "exit requested");
    }
}

/// Builder for [`Hub`], for swapping the clock or adding a remote resolver.
#[derive(Default)]
#[must_use]
pub struct HubBuilder {
    config: HubConfig,
    clock: Option<Arc<dyn Clock>>,
    remote: Option<Arc<dyn RemoteResolver>>,
}

impl HubBuilder {
    pub fn config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn remote(mut self, resolver: Arc<dyn RemoteResolver>) -> Self {
        self.remote = Some(resolver);
        self
    }

    /// Assemble the hub and register the system actions.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::Validation`] if a system action cannot be
    /// built.
    pub fn build(self) -> Result<Hub, RelayHubError> {
        let registry = Arc::new(match self.remote {
            Some(resolver) => Registry::with_remote(resolver),
            None => Registry::new(),
        });
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let (exit, _) = watch::channel(None);

        let hub = Hub {
            config: self.config,
            signals: Arc::new(SignalBus::new(self.config.signal_capacity)),
            links: Arc::new(LinkEngine::new(Arc::clone(&registry))),
            scheduler: Arc::new(Scheduler::new(Arc::clone(&registry), clock)),
            dashboard: Dashboard::new(Arc::clone(&registry)),
            registry,
            exit: Arc::new(exit),
            shutdown: CancellationToken::new(),
            started: AtomicBool::new(false),
            tasks: Mutex::default(),
        };
        hub.register_system_actions()?;
        Ok(hub)
    }
}

/// A registered action together with the hub it lives in.
///
/// Returned by [`Hub::register`]; chains schedules, links and dashboard
/// controls onto the action.
pub struct ActionHandle<'a> {
    hub: &'a Hub,
    action: Arc<Action>,
}

impl<'a> ActionHandle<'a> {
    #[must_use]
    pub fn id(&self) -> &ActionId {
        self.action.id()
    }

    #[must_use]
    pub fn action(&self) -> &Arc<Action> {
        &self.action
    }

    /// # Errors
    ///
    /// See [`Action::call_with`].
    pub async fn call(&self, args: Args) -> Result<Value, RelayHubError> {
        self.action.call(args).await
    }

    /// # Errors
    ///
    /// See [`Action::call_with`].
    pub async fn call_with(
        &self,
        args: Args,
        options: CallOptions,
    ) -> Result<Outcome, RelayHubError> {
        self.action.call_with(args, options).await
    }

    /// Attach the interrupt handler.
    #[must_use]
    pub fn set_interrupt<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.action.set_interrupt(handler);
        self
    }

    /// # Errors
    ///
    /// See [`Action::interrupt`].
    pub async fn interrupt(&self, args: Args) -> Result<bool, RelayHubError> {
        self.action.interrupt(args).await
    }

    /// React to value changes of `source`.
    pub fn link_to(&self, source: SignalId, config: LinkConfig) -> LinkId {
        self.hub.links.add(source, self.id().clone(), config)
    }

    /// React to the return values of another action.
    pub fn link_to_action(&self, other: &ActionId, config: LinkConfig) -> LinkId {
        self.link_to(SignalId::action(other), config)
    }

    /// Show this action on the dashboard.
    pub fn link_to_dashboard(&self, options: DashboardOptions) -> &Self {
        self.hub.dashboard.add(self.id().clone(), options);
        self
    }

    /// Start describing a schedule for this action.
    pub fn run_every(&self, interval: u32) -> ScheduleBuilder<'a> {
        self.hub.scheduler.every(self.id().clone(), interval)
    }
}
