use crate::{Async, AsyncError, ExecutionResult, Lifecycle, Liveness, RefreshPolicy, Settlement};
use futures_signals::signal::{Mutable, MutableSignalCloned, SignalExt, SignalStream};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

type SettlementFuture<T> = Pin<Box<dyn Future<Output = Settlement<T>> + Send>>;
type Producer<T, D> = Arc<dyn Fn(D, Liveness) -> SettlementFuture<T> + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&AsyncError) + Send + Sync>;

/// Runs an async producer on every dependency change and applies only the
/// outcome of the latest activation, and only while the component is mounted.
///
/// The host drives it: `mount`/`unmount` once per mount, `render` on every
/// render. `activate`/`deactivate` are exposed separately for hosts that
/// replay effects, such as a strict mode that runs activate, deactivate,
/// activate in a single tick.
///
/// Methods that start work spawn tokio tasks and must be called inside a
/// runtime.
pub struct AsyncEffect<T, D> {
    state: Mutable<Async<T>>,
    lifecycle: Lifecycle,
    producer: Producer<T, D>,
    on_error: Option<ErrorCallback>,
    policy: RefreshPolicy,
    deps: Option<D>,
    current: Option<Liveness>,
    generation: u64,
    tasks: Vec<JoinHandle<()>>,
}

pub struct AsyncEffectBuilder<T, D> {
    producer: Producer<T, D>,
    on_error: Option<ErrorCallback>,
    policy: RefreshPolicy,
    lifecycle: Option<Lifecycle>,
}

impl<T, D> AsyncEffectBuilder<T, D>
where
    T: Clone + Send + Sync + 'static,
    D: PartialEq + Clone + Send + 'static,
{
    /// Called with every genuine error committed to the state.
    pub fn on_error<E>(mut self, on_error: E) -> Self
    where
        E: Fn(&AsyncError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(on_error));
        self
    }

    pub fn refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shares the mount state of a component with other effects. Without
    /// this the effect gets a lifecycle of its own.
    pub fn lifecycle(mut self, lifecycle: &Lifecycle) -> Self {
        self.lifecycle = Some(lifecycle.clone());
        self
    }

    pub fn build(self) -> AsyncEffect<T, D> {
        AsyncEffect {
            state: Mutable::new(Async::Uninitialized),
            lifecycle: self.lifecycle.unwrap_or_default(),
            producer: self.producer,
            on_error: self.on_error,
            policy: self.policy,
            deps: None,
            current: None,
            generation: 0,
            tasks: Vec::new(),
        }
    }
}

impl<T, D> AsyncEffect<T, D>
where
    T: Clone + Send + Sync + 'static,
    D: PartialEq + Clone + Send + 'static,
{
    pub fn builder<F, Fut, R>(producer: F) -> AsyncEffectBuilder<T, D>
    where
        F: Fn(D, Liveness) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: ExecutionResult<T> + 'static,
    {
        let producer: Producer<T, D> = Arc::new(move |deps, liveness| -> SettlementFuture<T> {
            let fut = producer(deps, liveness);
            Box::pin(async move { fut.await.into_settlement() })
        });
        AsyncEffectBuilder {
            producer,
            on_error: None,
            policy: RefreshPolicy::default(),
            lifecycle: None,
        }
    }

    /// After [`AsyncEffect::unmount`] the next `render` activates again, even
    /// with the deps it had before. An effect torn down only through a shared
    /// [`Lifecycle`] keeps its deps and needs an explicit `activate`.
    pub fn mount(&self) {
        self.lifecycle.mount();
    }

    /// Stales the live activation, forgets the rendered deps and marks the
    /// component unmounted. The state is frozen until the next mount.
    pub fn unmount(&mut self) {
        self.deactivate();
        self.deps = None;
        self.lifecycle.unmount();
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Activates when `deps` differs from the previous render's, and returns
    /// whether it did.
    pub fn render(&mut self, deps: D) -> bool {
        if self.deps.as_ref() == Some(&deps) {
            trace!(generation = self.generation, "effect deps unchanged");
            return false;
        }
        self.deps = Some(deps);
        self.activate()
    }

    /// Starts a new activation with the current deps, staling the previous
    /// one. Returns false when nothing has been rendered yet.
    pub fn activate(&mut self) -> bool {
        let Some(deps) = self.deps.clone() else {
            debug!("effect activated before first render");
            return false;
        };
        self.deactivate();
        self.tasks.retain(|task| !task.is_finished());

        self.generation += 1;
        let liveness = Liveness::new(
            self.lifecycle.clone(),
            self.lifecycle.generation_token(),
            self.generation,
        );
        self.current = Some(liveness.clone());
        debug!(generation = self.generation, "effect activation started");

        let activation = Activation {
            state: self.state.clone(),
            producer: self.producer.clone(),
            on_error: self.on_error.clone(),
            policy: self.policy,
            liveness,
        };
        self.tasks.push(tokio::spawn(activation.run(deps)));
        true
    }

    /// Sequence number of the latest activation, 0 before the first one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> Async<T> {
        self.state.get_cloned()
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock_ref().is_ready()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock_ref().is_initialized()
    }

    pub fn result(&self) -> Option<T> {
        self.state.lock_ref().result().cloned()
    }

    pub fn error(&self) -> Option<AsyncError> {
        self.state.lock_ref().error().cloned()
    }

    pub fn ensure_result(&self) -> Result<T, AsyncError> {
        self.state.lock_ref().ensure_result()
    }

    pub fn to_signal(&self) -> MutableSignalCloned<Async<T>> {
        self.state.signal_cloned()
    }

    pub fn to_stream(&self) -> SignalStream<MutableSignalCloned<Async<T>>> {
        self.state.signal_cloned().to_stream()
    }

    /// Waits until every activation task spawned so far has finished,
    /// including superseded ones.
    pub async fn settled(&mut self) {
        for task in std::mem::take(&mut self.tasks) {
            if let Err(error) = task.await {
                debug!(%error, "effect activation task ended abnormally");
            }
        }
    }
}

impl<T, D> AsyncEffect<T, D> {
    /// Tears down the live activation, if any. Its task may keep running but
    /// can no longer touch the state.
    pub fn deactivate(&mut self) {
        if let Some(liveness) = self.current.take() {
            // holding the read lock keeps a commit from straddling the teardown
            let _state = self.state.lock_ref();
            liveness.stale();
            debug!(generation = liveness.generation(), "effect activation torn down");
        }
    }
}

impl<T, D> Drop for AsyncEffect<T, D> {
    fn drop(&mut self) {
        self.deactivate();
    }
}

struct Activation<T, D> {
    state: Mutable<Async<T>>,
    producer: Producer<T, D>,
    on_error: Option<ErrorCallback>,
    policy: RefreshPolicy,
    liveness: Liveness,
}

impl<T, D> Activation<T, D>
where
    T: Clone + Send + Sync + 'static,
    D: Send + 'static,
{
    async fn run(self, deps: D) {
        let generation = self.liveness.generation();
        // First suspension point: a teardown issued in the same tick lands first
        tokio::task::yield_now().await;

        let policy = self.policy;
        if !self.commit(|state| state.begin_refresh(policy)) {
            debug!(generation, "effect activation stale before start");
            return;
        }

        // The producer runs in its own task so a panic settles as an error
        let producer = (self.producer)(deps, self.liveness.clone());
        let settlement = match tokio::spawn(producer).await {
            Ok(settlement) => settlement,
            Err(error) => Settlement::Error(AsyncError::error(error.to_string())),
        };
        let skipped = settlement.is_skip();

        let mut reported = None;
        let applied = self.commit(|state| {
            let (next, error) = state.settle(settlement);
            reported = error;
            next
        });

        if !applied {
            debug!(generation, "effect settlement discarded");
            return;
        }
        if skipped {
            debug!(generation, "effect skipped");
        }
        if let Some(error) = reported {
            debug!(generation, %error, "effect failed");
            if let Some(on_error) = &self.on_error {
                on_error(&error);
            }
        }
    }

    /// Replaces the state only if this activation is still live. The check
    /// and the write happen under the state lock and the epoch lock, so
    /// neither `deactivate` nor a shared `Lifecycle::unmount` can fall in
    /// between.
    fn commit<F>(&self, transition: F) -> bool
    where
        F: FnOnce(Async<T>) -> Async<T>,
    {
        let mut state = self.state.lock_mut();
        let _epoch = self.liveness.lifecycle().hold_epoch();
        if !self.liveness.is_live() {
            return false;
        }
        *state = transition(std::mem::take(&mut *state));
        true
    }
}
