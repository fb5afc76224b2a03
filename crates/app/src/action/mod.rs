//! Action: a named, invocable unit of work.
//!
//! An action wraps a work function together with its declared parameters,
//! an optional default timeout and an optional interrupt handler. Each call
//! gets its own [`Invocation`] carrying a fresh [`ExitFlag`]; interrupting the
//! action sets the flag of every invocation still running and then runs the
//! handler. Nothing is ever aborted: work functions stop by looking at their
//! flag.

mod call;
mod invocation;

pub use call::{CallOptions, InvocationHandle, Outcome};
pub use invocation::{ExitFlag, Invocation};

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use tokio::task::JoinError;

use relayhub_domain::action::{ActionInfo, Origin, ParamSpec, bind};
use relayhub_domain::error::{RelayHubError, TimeoutError, ValidationError};
use relayhub_domain::id::{ActionId, InvocationId};
use relayhub_domain::value::{Args, Value};

/// Boxed `Send` future, used where traits must stay object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type AsyncWork = Arc<dyn Fn(Invocation) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;
type BlockingWork = Arc<dyn Fn(Invocation) -> anyhow::Result<Value> + Send + Sync>;
type InterruptFn = Arc<dyn Fn(Args) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Receives the return value of every completed invocation.
pub type ResultSink = Arc<dyn Fn(&ActionId, &Value) + Send + Sync>;

type RunningMap = Arc<Mutex<HashMap<InvocationId, ExitFlag>>>;

enum Work {
    Async(AsyncWork),
    /// Runs on the blocking thread pool.
    Blocking(BlockingWork),
}

/// A registered unit of work.
pub struct Action {
    id: ActionId,
    name: String,
    params: Vec<ParamSpec>,
    timeout: Option<Duration>,
    work: Work,
    interrupt: RwLock<Option<InterruptFn>>,
    running: RunningMap,
    sink: OnceLock<ResultSink>,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("timeout", &self.timeout)
            .field("interruptible", &self.is_interruptible())
            .finish_non_exhaustive()
    }
}

impl Action {
    /// Start building an action around the work function called `function`.
    #[must_use]
    pub fn builder(function: impl Into<String>) -> ActionBuilder {
        ActionBuilder::new(function.into())
    }

    #[must_use]
    pub fn id(&self) -> &ActionId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Default bound on synchronous calls.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[must_use]
    pub fn is_interruptible(&self) -> bool {
        self.interrupt_handler().is_some()
    }

    /// Number of invocations currently running.
    #[must_use]
    pub fn running(&self) -> usize {
        lock(&self.running).len()
    }

    #[must_use]
    pub fn info(&self) -> ActionInfo {
        ActionInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            params: self.params.clone(),
            interruptible: self.is_interruptible(),
            timeout_ms: self
                .timeout
                .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
            origin: Origin::Local,
        }
    }

    /// Attach (or replace) the interrupt handler.
    pub fn set_interrupt<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let handler = boxed_interrupt(handler);
        *self
            .interrupt
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
        self
    }

    /// Route return values to `sink`. Only the first sink is kept.
    pub(crate) fn attach_sink(&self, sink: ResultSink) {
        if self.sink.set(sink).is_err() {
            tracing::debug!(action = %self.id, "result sink already attached");
        }
    }

    /// Call synchronously with the default options.
    ///
    /// # Errors
    ///
    /// See [`call_with`](Self::call_with).
    pub async fn call(self: &Arc<Self>, args: Args) -> Result<Value, RelayHubError> {
        self.call_with(args, CallOptions::sync())
            .await
            .map(Outcome::into_value)
    }

    /// Invoke the action.
    ///
    /// - asynchronous: spawn the work and return [`Outcome::Spawned`] at once;
    ///   failures are only logged
    /// - synchronous: run the work on its own task and wait for it, at most
    ///   for the timeout (per call, else the action's default) if any; on
    ///   expiry, or when the caller's future is dropped, the work keeps
    ///   running
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::Binding`] if `args` do not fit the declared
    /// parameters, [`RelayHubError::Timeout`] when the bound expires,
    /// [`RelayHubError::Work`] with the work function's own error, or
    /// [`RelayHubError::Panicked`] if its task panicked.
    #[tracing::instrument(skip(self, args), fields(action = %self.id))]
    pub async fn call_with(
        self: &Arc<Self>,
        args: Args,
        options: CallOptions,
    ) -> Result<Outcome, RelayHubError> {
        let (invocation, guard) = self.begin(args)?;

        if options.run_async {
            let invocation_id = invocation.id();
            let exit = invocation.exit_flag().clone();
            let action = Arc::clone(self);
            let action_id = self.id.clone();
            let task = tokio::spawn(async move {
                let result = action.run(invocation, guard).await;
                if let Err(err) = &result {
                    tracing::warn!(action = %action_id, invocation = %invocation_id, %err, "background invocation failed");
                }
                result
            });
            return Ok(Outcome::Spawned(InvocationHandle::new(
                invocation_id,
                self.id.clone(),
                exit,
                task,
            )));
        }

        let invocation_id = invocation.id();
        let task = tokio::spawn(Arc::clone(self).run(invocation, guard));
        let Some(after) = options.timeout.or(self.timeout) else {
            return self.joined(task.await).map(Outcome::Returned);
        };

        match tokio::time::timeout(after, task).await {
            Ok(joined) => self.joined(joined).map(Outcome::Returned),
            Err(_) => {
                tracing::debug!(invocation = %invocation_id, ?after, "call timed out, work keeps running");
                Err(TimeoutError {
                    action: self.id.clone(),
                    after,
                }
                .into())
            }
        }
    }

    fn joined(
        &self,
        joined: Result<Result<Value, RelayHubError>, JoinError>,
    ) -> Result<Value, RelayHubError> {
        joined.unwrap_or_else(|_| {
            Err(RelayHubError::Panicked {
                action: self.id.clone(),
            })
        })
    }

    /// Interrupt every running invocation.
    ///
    /// Sets their exit flags, then awaits the interrupt handler with `args`.
    /// Does not wait for the work itself to stop. Returns `false` without
    /// doing anything when the action has no interrupt handler.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::Work`] if the handler fails.
    pub async fn interrupt(&self, args: Args) -> Result<bool, RelayHubError> {
        let Some(handler) = self.interrupt_handler() else {
            tracing::debug!(action = %self.id, "no interrupt handler, ignoring interrupt");
            return Ok(false);
        };

        let flags: Vec<ExitFlag> = lock(&self.running).values().cloned().collect();
        for flag in &flags {
            flag.set();
        }
        tracing::debug!(action = %self.id, running = flags.len(), "interrupt");

        handler(args)
            .await
            .map_err(|err| RelayHubError::work(self.id.clone(), err))?;
        Ok(true)
    }

    fn interrupt_handler(&self) -> Option<InterruptFn> {
        self.interrupt
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn begin(&self, args: Args) -> Result<(Invocation, RunningGuard), RelayHubError> {
        let bound = bind(&self.params, &args)?;
        let invocation = Invocation::new(self.id.clone(), args, bound);
        let guard = RunningGuard::register(
            Arc::clone(&self.running),
            invocation.id(),
            invocation.exit_flag().clone(),
        );
        Ok((invocation, guard))
    }

    async fn run(
        self: Arc<Self>,
        invocation: Invocation,
        guard: RunningGuard,
    ) -> Result<Value, RelayHubError> {
        let invocation_id = invocation.id();
        tracing::debug!(action = %self.id, invocation = %invocation_id, "invocation started");

        let result = match &self.work {
            Work::Async(work) => work(invocation).await,
            Work::Blocking(work) => {
                let work = Arc::clone(work);
                tokio::task::spawn_blocking(move || work(invocation))
                    .await
                    .map_err(|_| RelayHubError::Panicked {
                        action: self.id.clone(),
                    })?
            }
        };
        drop(guard);

        match result {
            Ok(value) => {
                tracing::debug!(action = %self.id, invocation = %invocation_id, "invocation finished");
                if let Some(sink) = self.sink.get() {
                    sink(&self.id, &value);
                }
                Ok(value)
            }
            Err(err) => Err(RelayHubError::work(self.id.clone(), err)),
        }
    }
}

/// Keeps an invocation's exit flag reachable by `interrupt` while it runs.
struct RunningGuard {
    running: RunningMap,
    id: InvocationId,
}

impl RunningGuard {
    fn register(running: RunningMap, id: InvocationId, flag: ExitFlag) -> Self {
        lock(&running).insert(id, flag);
        Self { running, id }
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        lock(&self.running).remove(&self.id);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn boxed_interrupt<F, Fut>(handler: F) -> InterruptFn
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |args| -> BoxFuture<'static, anyhow::Result<()>> { Box::pin(handler(args)) })
}

/// Step-by-step builder for [`Action`].
///
/// The identifier is either set explicitly with [`id`](Self::id) or derived
/// from the function name and the optional [`controller`](Self::controller).
#[must_use]
pub struct ActionBuilder {
    function: String,
    controller: Option<String>,
    id: Option<String>,
    name: Option<String>,
    params: Vec<ParamSpec>,
    timeout: Option<Duration>,
    work: Option<Work>,
    interrupt: Option<InterruptFn>,
}

impl ActionBuilder {
    fn new(function: String) -> Self {
        Self {
            function,
            controller: None,
            id: None,
            name: None,
            params: Vec::new(),
            timeout: None,
            work: None,
            interrupt: None,
        }
    }

    /// Name of the controller owning the function; prefixes the derived id.
    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    /// Explicit identifier, overriding the derived one.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Display name. Defaults to the function name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = ParamSpec>) -> Self {
        self.params.extend(params);
        self
    }

    /// Default bound on synchronous calls.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Asynchronous work function.
    pub fn work<F, Fut>(mut self, work: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.work = Some(Work::Async(Arc::new(
            move |invocation| -> BoxFuture<'static, anyhow::Result<Value>> {
                Box::pin(work(invocation))
            },
        )));
        self
    }

    /// Blocking work function, run on the blocking thread pool. It should
    /// poll [`Invocation::should_exit`] between steps.
    pub fn blocking_work<F>(mut self, work: F) -> Self
    where
        F: Fn(Invocation) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.work = Some(Work::Blocking(Arc::new(work)));
        self
    }

    /// Interrupt handler; makes the action interruptible.
    pub fn on_interrupt<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.interrupt = Some(boxed_interrupt(handler));
        self
    }

    /// Consume the builder and return an [`Action`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the identifier is invalid or no work
    /// function was given.
    pub fn build(self) -> Result<Action, ValidationError> {
        let id = match self.id {
            Some(id) => ActionId::new(id)?,
            None => ActionId::derive(self.controller.as_deref(), &self.function)?,
        };
        let work = self
            .work
            .ok_or_else(|| ValidationError::MissingWork(id.to_string()))?;
        Ok(Action {
            id,
            name: self.name.unwrap_or(self.function),
            params: self.params,
            timeout: self.timeout,
            work,
            interrupt: RwLock::new(self.interrupt),
            running: Arc::default(),
            sink: OnceLock::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayhub_domain::error::BindingError;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Instant;

    async fn echo(invocation: Invocation) -> anyhow::Result<Value> {
        Ok(json!({
            "times": invocation.param("times").cloned(),
            "delay": invocation.param("delay").cloned(),
        }))
    }

    async fn fail(_invocation: Invocation) -> anyhow::Result<Value> {
        anyhow::bail!("pump jammed")
    }

    /// Runs until its exit flag is set, polling every 5 ms.
    async fn spin(invocation: Invocation) -> anyhow::Result<Value> {
        while !invocation.exit_flag().sleep(Duration::from_millis(5)).await {}
        Ok(json!("stopped"))
    }

    fn action(builder: ActionBuilder) -> Arc<Action> {
        Arc::new(builder.build().unwrap())
    }

    #[test]
    fn should_derive_id_from_controller_and_function() {
        let action = Action::builder("blink")
            .controller("led")
            .work(echo)
            .build()
            .unwrap();
        assert_eq!(action.id().as_str(), "led.blink");
        assert_eq!(action.name(), "blink");
    }

    #[test]
    fn should_prefer_explicit_id_and_name() {
        let action = Action::builder("blink")
            .controller("led")
            .id("status.blink")
            .name("Blink status LED")
            .work(echo)
            .build()
            .unwrap();
        assert_eq!(action.id().as_str(), "status.blink");
        assert_eq!(action.info().name, "Blink status LED");
    }

    #[test]
    fn should_reject_action_without_work_function() {
        let err = Action::builder("blink").build().unwrap_err();
        assert_eq!(err, ValidationError::MissingWork("blink".to_string()));
    }

    #[tokio::test]
    async fn should_return_value_of_sync_call() {
        let blink = action(
            Action::builder("blink")
                .param(ParamSpec::required("times"))
                .param(ParamSpec::optional("delay", 0.5))
                .work(echo),
        );
        let value = blink.call(Args::new().arg(3)).await.unwrap();
        assert_eq!(value, json!({"times": 3, "delay": 0.5}));
    }

    #[tokio::test]
    async fn should_reject_arguments_before_running_work() {
        let ran = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&ran);
        let blink = action(
            Action::builder("blink")
                .param(ParamSpec::required("times"))
                .work(move |_| {
                    seen.store(true, Ordering::SeqCst);
                    async { Ok(Value::Null) }
                }),
        );
        let err = blink.call(Args::new()).await.unwrap_err();
        assert!(matches!(err, RelayHubError::Binding(BindingError::Missing(_))));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn should_return_work_failure_of_sync_call() {
        let pump = action(Action::builder("pump").work(fail));
        let err = pump.call(Args::new()).await.unwrap_err();
        assert!(matches!(err, RelayHubError::Work { .. }));
        assert!(err.to_string().contains("pump jammed"));
    }

    #[tokio::test]
    async fn should_time_out_and_let_work_finish_later() {
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        let slow = action(Action::builder("slow").work(move |_| {
            let flag = Arc::clone(&flag);
            async move {
                tokio::time::sleep(Duration::from_millis(150)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(json!("late"))
            }
        }));

        let started = Instant::now();
        let err = slow
            .call_with(
                Args::new(),
                CallOptions::sync().with_timeout(Duration::from_millis(30)),
            )
            .await
            .unwrap_err();
        let waited = started.elapsed();

        assert!(matches!(err, RelayHubError::Timeout(_)));
        assert!(waited >= Duration::from_millis(30));
        assert!(waited < Duration::from_millis(140));
        assert!(!done.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(slow.running(), 0);
    }

    #[tokio::test]
    async fn should_keep_sync_work_running_when_caller_goes_away() {
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        let slow = action(Action::builder("slow").work(move |invocation: Invocation| {
            let flag = Arc::clone(&flag);
            async move {
                tokio::time::sleep(Duration::from_millis(60)).await;
                flag.store(!invocation.should_exit(), Ordering::SeqCst);
                Ok(Value::Null)
            }
        }));

        let caller = tokio::spawn({
            let slow = Arc::clone(&slow);
            async move { slow.call(Args::new()).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        caller.abort();
        assert_eq!(slow.running(), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(slow.running(), 0);
    }

    #[tokio::test]
    async fn should_apply_action_default_timeout() {
        let slow = action(
            Action::builder("slow")
                .timeout(Duration::from_millis(20))
                .work(spin),
        );
        let err = slow.call(Args::new()).await.unwrap_err();
        assert!(matches!(err, RelayHubError::Timeout(_)));
        assert_eq!(slow.info().timeout_ms, Some(20));
    }

    #[tokio::test]
    async fn should_return_immediately_for_async_call() {
        let spinning = action(Action::builder("spin").work(spin));
        let outcome = spinning
            .call_with(Args::new(), CallOptions::background())
            .await
            .unwrap();
        let Outcome::Spawned(handle) = outcome else {
            panic!("expected a spawned invocation");
        };
        assert!(!handle.is_finished());
        handle.exit_flag().set();
        assert_eq!(handle.join().await.unwrap(), json!("stopped"));
    }

    #[tokio::test]
    async fn should_report_async_failure_only_through_handle() {
        let pump = action(Action::builder("pump").work(fail));
        let outcome = pump
            .call_with(Args::new(), CallOptions::background())
            .await
            .unwrap();
        let Outcome::Spawned(handle) = outcome else {
            panic!("expected a spawned invocation");
        };
        assert!(matches!(handle.join().await, Err(RelayHubError::Work { .. })));
    }

    #[tokio::test]
    async fn should_ignore_interrupt_without_handler() {
        let spinning = action(Action::builder("spin").work(spin));
        let Outcome::Spawned(handle) = spinning
            .call_with(Args::new(), CallOptions::background())
            .await
            .unwrap()
        else {
            panic!("expected a spawned invocation");
        };

        assert!(!spinning.is_interruptible());
        assert!(!spinning.interrupt(Args::new()).await.unwrap());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.exit_flag().is_set());
        assert!(!handle.is_finished());
        handle.exit_flag().set();
    }

    #[tokio::test]
    async fn should_stop_running_invocation_within_poll_interval_when_interrupted() {
        let handled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&handled);
        let spinning = action(Action::builder("spin").work(spin).on_interrupt(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        }));

        let Outcome::Spawned(handle) = spinning
            .call_with(Args::new(), CallOptions::background())
            .await
            .unwrap()
        else {
            panic!("expected a spawned invocation");
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let started = Instant::now();
        assert!(spinning.interrupt(Args::new()).await.unwrap());
        assert_eq!(handle.join().await.unwrap(), json!("stopped"));
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn should_interrupt_every_running_invocation_but_not_later_ones() {
        let spinning = action(Action::builder("spin").work(spin));
        spinning.set_interrupt(|_| async { Ok(()) });

        let mut handles = Vec::new();
        for _ in 0..3 {
            if let Outcome::Spawned(handle) = spinning
                .call_with(Args::new(), CallOptions::background())
                .await
                .unwrap()
            {
                handles.push(handle);
            }
        }
        assert_eq!(spinning.running(), 3);

        assert!(spinning.interrupt(Args::new()).await.unwrap());
        for handle in handles {
            assert!(handle.exit_flag().is_set());
            handle.join().await.unwrap();
        }

        let Outcome::Spawned(fresh) = spinning
            .call_with(Args::new(), CallOptions::background())
            .await
            .unwrap()
        else {
            panic!("expected a spawned invocation");
        };
        assert!(!fresh.exit_flag().is_set());
        fresh.exit_flag().set();
    }

    #[tokio::test]
    async fn should_pass_interrupt_arguments_to_handler() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let spinning = action(Action::builder("spin").work(spin).on_interrupt(move |args| {
            let _ = tx.send(args);
            async { Ok(()) }
        }));
        spinning
            .interrupt(Args::new().kwarg("reason", "manual"))
            .await
            .unwrap();
        let args = rx.recv().await.unwrap();
        assert_eq!(args.keyword["reason"], json!("manual"));
    }

    #[tokio::test]
    async fn should_run_blocking_work_until_flag_is_set() {
        let stepper = action(
            Action::builder("stepper")
                .blocking_work(|invocation| {
                    let mut steps = 0_u64;
                    while !invocation.should_exit() {
                        steps += 1;
                        std::thread::sleep(Duration::from_millis(2));
                    }
                    Ok(json!(steps))
                })
                .on_interrupt(|_| async { Ok(()) }),
        );
        let Outcome::Spawned(handle) = stepper
            .call_with(Args::new(), CallOptions::background())
            .await
            .unwrap()
        else {
            panic!("expected a spawned invocation");
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        stepper.interrupt(Args::new()).await.unwrap();
        let steps = handle.join().await.unwrap();
        assert!(steps.as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn should_send_return_values_to_sink() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let blink = action(Action::builder("blink").work(echo));
        blink.attach_sink(Arc::new(move |id, value| {
            let _ = tx.send((id.clone(), value.clone()));
        }));
        blink.call(Args::new().kwarg("times", 1)).await.unwrap();
        let (id, value) = rx.recv().await.unwrap();
        assert_eq!(id.as_str(), "blink");
        assert_eq!(value["times"], json!(1));
    }
}
