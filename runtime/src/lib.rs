//! # Composable Todos Runtime
//!
//! Runtime implementation for the Composable Todos architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Cancellation Registry**: Tracks in-flight effects by [`EffectId`] so they can be cancelled
//! - **Debug Reducer**: Logs every action and resulting state change
//!
//! ## Example
//!
//! ```ignore
//! use composable_todos_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use composable_todos_core::effect::{Effect, EffectId};
use composable_todos_core::reducer::Reducer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::AbortHandle;

/// Reducer wrapper that logs actions and state changes
pub mod debug;

/// Metric names and descriptions recorded by the Store
pub mod metrics;

pub use debug::{DebugReducer, DebugReducerExt};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for effects to complete
        ///
        /// Returned by [`EffectHandle::wait_with_timeout`](crate::EffectHandle::wait_with_timeout)
        /// when the timeout expires first.
        #[error("Timeout waiting for effects")]
        Timeout,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use composable_todos_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.broadcast_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of effect-produced actions buffered for observers
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects started
/// by that action to complete. Effects started later by feedback actions
/// are not tracked.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // All effects from Action::Start are now complete (or cancelled)
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new effect handle
    ///
    /// # Returns
    ///
    /// A tuple of `(EffectHandle, EffectTracking)` where:
    /// - `EffectHandle` is returned to the caller for waiting
    /// - `EffectTracking` is used internally for effect execution
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: tx,
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    ///
    /// Cancelled effects count as complete.
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Runs when the effect finishes, panics, or is aborted by cancellation.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Internal: Cancellation flag shared between a task and the registry
///
/// Checked under the state write lock before an effect's action is reduced.
#[derive(Clone, Default)]
struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Internal: A cancellable task registered under an [`EffectId`]
struct InFlight {
    task: u64,
    token: CancelToken,
    abort: AbortHandle,
}

/// Internal: In-flight cancellable effects, keyed by id
#[derive(Clone, Default)]
struct CancellationRegistry {
    in_flight: Arc<Mutex<HashMap<EffectId, Vec<InFlight>>>>,
    next_task: Arc<AtomicU64>,
}

impl CancellationRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<EffectId, Vec<InFlight>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_task(&self) -> u64 {
        self.next_task.fetch_add(1, Ordering::Relaxed)
    }

    /// Cancel every task under `id`, returning how many were cancelled
    fn cancel(&self, id: EffectId) -> usize {
        Self::cancel_locked(&mut self.lock(), id)
    }

    /// Same as [`Self::cancel`], for a caller already holding the lock
    fn cancel_locked(in_flight: &mut HashMap<EffectId, Vec<InFlight>>, id: EffectId) -> usize {
        let cancelled = in_flight.remove(&id).unwrap_or_default();

        for task in &cancelled {
            task.token.cancel();
            task.abort.abort();
        }

        cancelled.len()
    }

    /// Remove a finished task
    fn finish(&self, id: EffectId, task: u64) {
        let mut in_flight = self.lock();
        if let Some(tasks) = in_flight.get_mut(&id) {
            tasks.retain(|t| t.task != task);
            if tasks.is_empty() {
                in_flight.remove(&id);
            }
        }
    }

    fn count(&self, id: EffectId) -> usize {
        self.lock().get(&id).map_or(0, Vec::len)
    }
}

/// Internal: Where an action entering the store came from
enum Origin {
    /// Sent by a caller through [`Store::send`]
    External,
    /// Produced by an effect; dropped if the effect was cancelled meanwhile
    Effect(CancelToken),
}

/// Store module - The runtime for reducers
///
/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        metrics, Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, CancelToken,
        CancellationRegistry, DecrementGuard, Duration, Effect, EffectHandle, EffectId,
        EffectTracking, InFlight, Ordering, Origin, Reducer, RwLock, StoreConfig, StoreError,
    };
    use futures::future::{join_all, BoxFuture};
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// All state transitions are serialized through the write lock, whether
    /// the action came from a caller or from an effect.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        shutdown_timeout: Duration,
        pending_effects: Arc<AtomicUsize>,
        cancellations: CancellationRegistry,
        /// Action broadcast channel for observing actions produced by effects.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default()`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        ///
        /// # Example
        ///
        /// ```ignore
        /// let config = StoreConfig::default().with_shutdown_timeout(Duration::from_secs(5));
        /// let store = Store::with_config(AppState::default(), app_reducer(), env, config);
        /// ```
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                shutdown_timeout: config.default_shutdown_timeout,
                pending_effects: Arc::new(AtomicUsize::new(0)),
                cancellations: CancellationRegistry::default(),
                action_broadcast,
            }
        }

        /// Default timeout used by [`Store::shutdown_gracefully`]
        #[must_use]
        pub const fn shutdown_timeout(&self) -> Duration {
            self.shutdown_timeout
        }

        /// Number of effects currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Number of in-flight effects registered under `id`
        #[must_use]
        pub fn in_flight(&self, id: EffectId) -> usize {
            self.cancellations.count(id)
        }

        /// Initiate graceful shutdown of the store
        ///
        /// This method:
        /// 1. Sets the shutdown flag (rejecting new actions from callers)
        /// 2. Waits for pending effects to complete (with timeout)
        ///
        /// Effects that are already running still feed their actions back.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!(metrics::SHUTDOWN_INITIATED).increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = tokio::time::Instant::now();
            let poll_interval = Duration::from_millis(50);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running", pending
                    );
                    metrics::counter!(metrics::SHUTDOWN_TIMEOUT).increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tracing::debug!(
                    pending_effects = pending,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Waiting for effects to complete"
                );

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Shut down using the configured default timeout
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects outlive the timeout.
        pub async fn shutdown_gracefully(&self) -> Result<(), StoreError> {
            self.shutdown(self.shutdown_timeout).await
        }

        /// Send an action to the store
        ///
        /// This is the primary way to interact with the store:
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Starts the returned effects, applying their cancellations, before
        ///    releasing the lock
        ///
        /// # Concurrency and Effect Execution
        ///
        /// - The reducer executes synchronously while holding a write lock
        /// - Effects execute asynchronously in spawned tasks
        /// - `send()` returns after starting effect execution, not completion
        /// - Cancellation takes effect before the write lock is released, so a
        ///   cancelled effect never delivers an action afterwards
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic will propagate and halt the store.
        /// Reducers should be pure functions that do not panic.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            self.send_internal(action, Origin::External).await
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Only actions that were actually reduced are broadcast: an action
        /// from a cancelled effect is dropped before it reaches observers.
        ///
        /// # Example
        ///
        /// ```ignore
        /// let mut rx = store.subscribe_actions();
        /// while let Ok(action) = rx.recv().await {
        ///     render(&store.state(Clone::clone).await);
        /// }
        /// ```
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let todo_count = store.state(|s| s.todos.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        async fn send_internal(&self, action: A, origin: Origin) -> Result<EffectHandle, StoreError> {
            // Effects already running may still deliver during shutdown
            if matches!(origin, Origin::External) && self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!(metrics::REJECTED_ACTIONS).increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            let (handle, tracking) = EffectHandle::new();

            {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");

                if let Origin::Effect(token) = &origin {
                    if token.is_cancelled() {
                        tracing::trace!("Dropping action from cancelled effect");
                        metrics::counter!(metrics::DROPPED_ACTIONS).increment(1);
                        return Ok(EffectHandle::completed());
                    }
                    // Broadcast to observers
                    let _ = self.action_broadcast.send(action.clone());
                }

                tracing::debug!("Processing action");
                metrics::counter!(metrics::COMMANDS_TOTAL).increment(1);

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut state, action, &self.environment);
                metrics::histogram!(metrics::REDUCER_DURATION)
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());

                // Start effects before releasing the write lock: cancellations
                // and registrations from concurrent sends apply in reducer order.
                for effect in effects {
                    self.execute_effect_internal(effect, tracking.clone());
                }
            }
            tracing::trace!("Action processing completed, returning handle");

            Ok(handle)
        }

        fn cancel_effects(&self, id: EffectId) {
            Self::record_cancelled(id, self.cancellations.cancel(id));
        }

        fn record_cancelled(id: EffectId, cancelled: usize) {
            if cancelled > 0 {
                tracing::debug!(effect_id = %id, cancelled, "Cancelled in-flight effects");
                metrics::counter!(metrics::EFFECTS_CANCELLED, "id" => id.as_str())
                    .increment(cancelled as u64);
            }
        }

        /// Execute an effect with tracking
        ///
        /// # Error Handling Strategy
        ///
        /// **Reducer panics**: Propagate (fail fast).
        ///
        /// **Effect execution failures**: Log and continue. Effects run in
        /// spawned tasks; a panic there is isolated from the store. The
        /// [`DecrementGuard`] keeps the counters right on panic or abort.
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned, so pass by value is intentional
        fn execute_effect_internal(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                    metrics::counter!(metrics::EFFECTS_EXECUTED, "type" => "none").increment(1);
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    metrics::counter!(metrics::EFFECTS_EXECUTED, "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute_effect_internal(effect, tracking.clone());
                    }
                },
                Effect::Cancel(id) => {
                    tracing::trace!(effect_id = %id, "Executing Effect::Cancel");
                    metrics::counter!(metrics::EFFECTS_EXECUTED, "type" => "cancel").increment(1);
                    self.cancel_effects(id);
                },
                Effect::Cancellable {
                    id,
                    cancel_in_flight,
                    effect,
                } => {
                    tracing::trace!(effect_id = %id, cancel_in_flight, "Executing Effect::Cancellable");
                    metrics::counter!(metrics::EFFECTS_EXECUTED, "type" => "cancellable")
                        .increment(1);
                    self.spawn_effect(Some((id, cancel_in_flight)), *effect, tracking);
                },
                effect @ (Effect::Future(_) | Effect::Delay { .. } | Effect::Sequential(_)) => {
                    self.spawn_effect(None, effect, tracking);
                },
            }
        }

        /// Run an effect in its own task
        ///
        /// `cancellable` is the id to register the task under and whether
        /// tasks already registered there are cancelled first.
        fn spawn_effect(
            &self,
            cancellable: Option<(EffectId, bool)>,
            effect: Effect<A>,
            tracking: EffectTracking,
        ) {
            tracking.increment();
            // Built outside the task: an abort before the first poll still drops it
            let guard = DecrementGuard(tracking.clone());

            // Track global pending effects for shutdown
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

            let token = CancelToken::default();
            let task = self.cancellations.next_task();
            let store = self.clone();
            let task_token = token.clone();
            let id = cancellable.map(|(id, _)| id);

            let future = async move {
                let _guard = guard;
                let _pending_guard = pending_guard;

                store.run_effect(effect, &task_token, &tracking).await;

                if let Some(id) = id {
                    store.cancellations.finish(id, task);
                }
            };

            match cancellable {
                None => {
                    tokio::spawn(future);
                },
                Some((id, cancel_in_flight)) => {
                    // Cancel, spawn and register under one registry lock: the
                    // task cannot finish before it is registered, and two
                    // concurrent sends never both leave a task under `id`.
                    let mut in_flight = self.cancellations.lock();
                    if cancel_in_flight {
                        let cancelled = CancellationRegistry::cancel_locked(&mut in_flight, id);
                        Self::record_cancelled(id, cancelled);
                    }
                    let join = tokio::spawn(future);
                    in_flight.entry(id).or_default().push(InFlight {
                        task,
                        token,
                        abort: join.abort_handle(),
                    });
                },
            }
        }

        /// Drive an effect to completion inside the current task
        fn run_effect<'a>(
            &'a self,
            effect: Effect<A>,
            token: &'a CancelToken,
            tracking: &'a EffectTracking,
        ) -> BoxFuture<'a, ()> {
            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => {
                        metrics::counter!(metrics::EFFECTS_EXECUTED, "type" => "future")
                            .increment(1);
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            self.feed_back(action, token).await;
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    },
                    Effect::Delay { duration, action } => {
                        tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                        metrics::counter!(metrics::EFFECTS_EXECUTED, "type" => "delay")
                            .increment(1);
                        tokio::time::sleep(duration).await;
                        tracing::trace!("Effect::Delay completed, sending action");
                        self.feed_back(*action, token).await;
                    },
                    Effect::Parallel(effects) => {
                        join_all(
                            effects
                                .into_iter()
                                .map(|effect| self.run_effect(effect, token, tracking)),
                        )
                        .await;
                    },
                    Effect::Sequential(effects) => {
                        let effect_count = effects.len();
                        metrics::counter!(metrics::EFFECTS_EXECUTED, "type" => "sequential")
                            .increment(1);
                        for (idx, effect) in effects.into_iter().enumerate() {
                            tracing::trace!(
                                "Executing sequential effect {} of {}",
                                idx + 1,
                                effect_count
                            );
                            self.run_effect(effect, token, tracking).await;
                        }
                    },
                    nested @ (Effect::Cancellable { .. } | Effect::Cancel(_)) => {
                        self.execute_effect_internal(nested, tracking.clone());
                    },
                }
            })
        }

        async fn feed_back(&self, action: A, token: &CancelToken) {
            if let Err(error) = self
                .send_internal(action, Origin::Effect(token.clone()))
                .await
            {
                tracing::warn!(%error, "Dropped action produced by effect");
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                shutdown_timeout: self.shutdown_timeout,
                pending_effects: Arc::clone(&self.pending_effects),
                cancellations: self.cancellations.clone(),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;

// Test module
#[cfg(test)]
#[allow(clippy::panic)] // Tests are allowed to panic on failures
mod tests {
    use super::*;
    use composable_todos_core::{smallvec, SmallVec};

    const TIMER: EffectId = EffectId::new("timer");

    #[derive(Debug, Clone)]
    struct TestState {
        value: i32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Increment,
        Decrement,
        NoOp,
        ProduceEffect,
        ProduceDelayedAction,
        ProduceParallelEffects,
        ProduceSequentialEffects,
        ProducePanickingEffect,
        StartTimer,
        StopTimer,
        TimerFired,
    }

    #[derive(Debug, Clone)]
    struct TestEnv;

    #[derive(Debug, Clone)]
    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.value += 1;
                    smallvec![Effect::None]
                },
                TestAction::Decrement => {
                    state.value -= 1;
                    smallvec![Effect::None]
                },
                TestAction::NoOp => smallvec![Effect::None],
                TestAction::ProduceEffect => {
                    smallvec![Effect::Future(Box::pin(async {
                        Some(TestAction::Increment)
                    }))]
                },
                TestAction::ProduceDelayedAction => {
                    smallvec![Effect::Delay {
                        duration: Duration::from_millis(10),
                        action: Box::new(TestAction::Increment),
                    }]
                },
                TestAction::ProduceParallelEffects => {
                    smallvec![Effect::Parallel(vec![
                        Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                        Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                        Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                    ])]
                },
                TestAction::ProduceSequentialEffects => {
                    smallvec![Effect::Sequential(vec![
                        Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                        Effect::Future(Box::pin(async { Some(TestAction::Increment) })),
                        Effect::Future(Box::pin(async { Some(TestAction::Decrement) })),
                    ])]
                },
                TestAction::ProducePanickingEffect => {
                    smallvec![Effect::Future(Box::pin(async {
                        panic!("Intentional panic in effect for testing");
                    }))]
                },
                TestAction::StartTimer => smallvec![
                    Effect::Delay {
                        duration: Duration::from_secs(1),
                        action: Box::new(TestAction::TimerFired),
                    }
                    .cancellable(TIMER, true)
                ],
                TestAction::StopTimer => smallvec![Effect::cancel(TIMER)],
                TestAction::TimerFired => {
                    state.value += 100;
                    smallvec![Effect::None]
                },
            }
        }
    }

    fn store() -> Store<TestState, TestAction, TestEnv, TestReducer> {
        Store::new(TestState { value: 0 }, TestReducer, TestEnv)
    }

    #[tokio::test]
    async fn test_store_creation() {
        let store = store();

        let value = store.state(|s| s.value).await;
        assert_eq!(value, 0);
    }

    #[tokio::test]
    async fn test_multiple_actions() {
        let store = store();

        let _ = store.send(TestAction::Increment).await;
        let _ = store.send(TestAction::Increment).await;
        let _ = store.send(TestAction::Decrement).await;
        let _ = store.send(TestAction::NoOp).await;

        let value = store.state(|s| s.value).await;
        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn test_effect_future() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(TestAction::ProduceEffect).await?;
        handle.wait().await;

        let value = store.state(|s| s.value).await;
        assert_eq!(value, 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_effect_delay() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(TestAction::ProduceDelayedAction).await?;

        // Value should still be 0 immediately
        assert_eq!(store.state(|s| s.value).await, 0);

        handle.wait().await;
        assert_eq!(store.state(|s| s.value).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_effect_parallel() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(TestAction::ProduceParallelEffects).await?;
        handle.wait().await;

        assert_eq!(store.state(|s| s.value).await, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_effect_sequential() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(TestAction::ProduceSequentialEffects).await?;
        handle.wait().await;

        // Net result: +1 +1 -1 = 1
        assert_eq!(store.state(|s| s.value).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_sends() {
        let store = store();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let _ = store.send(TestAction::Increment).await;
                })
            })
            .collect();

        for handle in handles {
            if let Err(e) = handle.await {
                panic!("concurrent send task panicked: {e}");
            }
        }

        assert_eq!(store.state(|s| s.value).await, 10);
    }

    #[tokio::test]
    async fn test_effect_panic_isolation() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(TestAction::ProducePanickingEffect).await?;
        handle.wait().await;

        // Store should still be functional after effect panic
        let _ = store.send(TestAction::Increment).await?;
        assert_eq!(store.state(|s| s.value).await, 1);
        assert_eq!(store.pending_effects(), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_in_flight_keeps_single_timer() -> Result<(), StoreError> {
        let store = store();

        let mut first = store.send(TestAction::StartTimer).await?;
        tokio::time::advance(Duration::from_millis(500)).await;
        let mut second = store.send(TestAction::StartTimer).await?;

        assert_eq!(store.in_flight(TIMER), 1);

        first.wait().await;
        // First timer was cancelled: nothing fired yet
        assert_eq!(store.state(|s| s.value).await, 0);

        second.wait().await;
        assert_eq!(store.state(|s| s.value).await, 100);
        assert_eq!(store.in_flight(TIMER), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_poll_settles_handle() -> Result<(), StoreError> {
        let store = store();

        // The second send aborts the first timer before its task ever runs
        let mut first = store.send(TestAction::StartTimer).await?;
        let _second = store.send(TestAction::StartTimer).await?;

        first.wait_with_timeout(Duration::from_millis(10)).await?;
        assert_eq!(first.pending(), 0);
        assert_eq!(store.in_flight(TIMER), 1);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_restarts_keep_single_timer() {
        for _ in 0..200 {
            let store = store();

            let sends: Vec<_> = (0..2)
                .map(|_| {
                    let store = store.clone();
                    tokio::spawn(async move { store.send(TestAction::StartTimer).await })
                })
                .collect();

            for send in sends {
                match send.await {
                    Ok(Ok(_)) => {},
                    Ok(Err(e)) => panic!("send failed: {e}"),
                    Err(e) => panic!("send task panicked: {e}"),
                }
            }

            assert_eq!(store.in_flight(TIMER), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_effect() -> Result<(), StoreError> {
        let store = store();

        let mut handle = store.send(TestAction::StartTimer).await?;
        let _ = store.send(TestAction::StopTimer).await?;
        handle.wait().await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.state(|s| s.value).await, 0);
        assert_eq!(store.in_flight(TIMER), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_shutdown_rejects_actions() -> Result<(), StoreError> {
        let store = store();

        store.shutdown(Duration::from_secs(1)).await?;

        let result = store.send(TestAction::Increment).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_timeout() -> Result<(), StoreError> {
        let store = store();

        let _ = store.send(TestAction::StartTimer).await?;
        let result = store.shutdown(Duration::from_millis(100)).await;

        assert!(matches!(result, Err(StoreError::ShutdownTimeout(1))));
        Ok(())
    }

    #[tokio::test]
    async fn test_config_sets_shutdown_timeout() {
        let config = StoreConfig::default().with_shutdown_timeout(Duration::from_secs(2));
        let store = Store::with_config(TestState { value: 0 }, TestReducer, TestEnv, config);

        assert_eq!(store.shutdown_timeout(), Duration::from_secs(2));
        assert_eq!(store.shutdown_gracefully().await.ok(), Some(()));
    }

    #[tokio::test]
    async fn test_completed_handle() {
        let mut handle = EffectHandle::completed();
        assert_eq!(handle.pending(), 0);
        assert!(handle.wait_with_timeout(Duration::from_millis(10)).await.is_ok());
    }
}
