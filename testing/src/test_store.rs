//! Exhaustive, deterministic store for testing reducers together with their effects.
//!
//! [`TestStore`] runs effects against a virtual clock instead of the tokio
//! runtime. Time only moves when the test calls [`TestStore::advance`], and
//! every action an effect feeds back must be acknowledged with
//! [`TestStore::receive`] in order. State changes are asserted after every
//! step.
//!
//! ```ignore
//! let mut store = TestStore::new(AppState::sample(), app_reducer(), env);
//!
//! store
//!     .send(AppAction::todo(0, TodoAction::CheckboxTapped), |s| {
//!         s.todos[0].is_complete = true;
//!     })
//!     .await;
//! store.advance(Duration::from_secs(1)).await;
//! store.receive(AppAction::TodoDelayCompleted, |s| s.todos.swap(0, 1)).await;
//! store.finish();
//! ```
//!
//! Futures are awaited when they are scheduled, and their actions are due at
//! the virtual time at which the future was started.

#![allow(clippy::module_name_repetitions)] // TestStore is the natural name

use composable_todos_core::effect::{Effect, EffectId};
use composable_todos_core::reducer::Reducer;
use futures::future::LocalBoxFuture;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::time::Duration;

/// An action waiting for its due time
struct Scheduled<A> {
    due: Duration,
    seq: u64,
    ids: Vec<EffectId>,
    action: A,
}

/// An action fed back by an effect, reduced but not yet acknowledged
struct Received<S, A> {
    action: A,
    before: S,
    after: S,
}

/// Deterministic store driven by a virtual clock
pub struct TestStore<R>
where
    R: Reducer,
{
    reducer: R,
    environment: R::Environment,
    state: R::State,
    now: Duration,
    next_seq: u64,
    scheduled: Vec<Scheduled<R::Action>>,
    received: VecDeque<Received<R::State, R::Action>>,
}

impl<R> TestStore<R>
where
    R: Reducer,
    R::State: Clone + PartialEq + Debug,
    R::Action: Clone + PartialEq + Debug,
{
    /// Create a test store at virtual time zero
    #[must_use]
    pub fn new(initial_state: R::State, reducer: R, environment: R::Environment) -> Self {
        Self {
            reducer,
            environment,
            state: initial_state,
            now: Duration::ZERO,
            next_seq: 0,
            scheduled: Vec::new(),
            received: VecDeque::new(),
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &R::State {
        &self.state
    }

    /// Virtual time elapsed since creation
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of actions scheduled but not yet due
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.scheduled.len()
    }

    /// Send an action and assert the state change it makes
    ///
    /// `update` receives a copy of the state before the action and must
    /// mutate it into the state expected afterwards.
    ///
    /// # Panics
    ///
    /// Panics if received actions are still unacknowledged, or if the
    /// resulting state differs from the expected one.
    #[allow(clippy::panic)] // Test assertion
    pub async fn send<F>(&mut self, action: R::Action, update: F)
    where
        F: FnOnce(&mut R::State),
    {
        assert!(
            self.received.is_empty(),
            "Must handle {} received action(s) before sending {action:?}: {:?}",
            self.received.len(),
            self.received.iter().map(|r| &r.action).collect::<Vec<_>>()
        );

        let mut expected = self.state.clone();
        update(&mut expected);

        tracing::trace!(?action, "TestStore sending action");
        self.reduce(action).await;

        assert_eq!(
            self.state, expected,
            "State after send did not match expectation"
        );
    }

    /// Move the virtual clock forward, delivering every action that falls due
    ///
    /// Delivered actions are reduced immediately, in due-time order, and
    /// queued for [`TestStore::receive`].
    pub async fn advance(&mut self, by: Duration) {
        let target = self.now + by;

        while let Some(index) = self.next_due(target) {
            let next = self.scheduled.remove(index);
            self.now = next.due;

            let before = self.state.clone();
            tracing::trace!(action = ?next.action, now = ?self.now, "TestStore delivering action");
            self.reduce(next.action.clone()).await;
            self.received.push_back(Received {
                action: next.action,
                before,
                after: self.state.clone(),
            });
        }

        self.now = target;
    }

    /// Assert that the next action fed back by an effect is `expected`
    ///
    /// `update` mutates a copy of the state before that action into the
    /// expected state after it. Actions already due are delivered first.
    ///
    /// # Panics
    ///
    /// Panics if no action was received, if a different action was received,
    /// or if the state change does not match.
    #[allow(clippy::panic)] // Test assertion
    pub async fn receive<F>(&mut self, expected: R::Action, update: F)
    where
        F: FnOnce(&mut R::State),
    {
        self.advance(Duration::ZERO).await;

        let Some(received) = self.received.pop_front() else {
            panic!(
                "Expected to receive {expected:?}, but no action was received ({} still scheduled)",
                self.scheduled.len()
            );
        };

        assert_eq!(
            received.action, expected,
            "Received an unexpected action"
        );

        let mut expected_state = received.before;
        update(&mut expected_state);
        assert_eq!(
            received.after, expected_state,
            "State after receiving {expected:?} did not match expectation"
        );
    }

    /// Assert that nothing is left to receive and no effect is still scheduled
    ///
    /// # Panics
    ///
    /// Panics if any action is unacknowledged or any effect is still in flight.
    #[allow(clippy::panic)] // Test assertion
    pub fn finish(self) {
        assert!(
            self.received.is_empty(),
            "Unhandled received actions: {:?}",
            self.received.iter().map(|r| &r.action).collect::<Vec<_>>()
        );
        assert!(
            self.scheduled.is_empty(),
            "Effects still in flight: {:?}",
            self.scheduled
                .iter()
                .map(|s| (&s.action, s.due))
                .collect::<Vec<_>>()
        );
    }

    fn next_due(&self, target: Duration) -> Option<usize> {
        self.scheduled
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= target)
            .min_by_key(|(_, s)| (s.due, s.seq))
            .map(|(index, _)| index)
    }

    async fn reduce(&mut self, action: R::Action) {
        let effects = self
            .reducer
            .reduce(&mut self.state, action, &self.environment);
        let now = self.now;
        for effect in effects {
            self.schedule(effect, now, Vec::new()).await;
        }
    }

    fn cancel(&mut self, id: EffectId) {
        self.scheduled.retain(|s| !s.ids.contains(&id));
    }

    fn push(&mut self, due: Duration, ids: Vec<EffectId>, action: R::Action) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.scheduled.push(Scheduled {
            due,
            seq,
            ids,
            action,
        });
    }

    /// Schedule an effect started at `start`, returning when it ends
    fn schedule(
        &mut self,
        effect: Effect<R::Action>,
        start: Duration,
        ids: Vec<EffectId>,
    ) -> LocalBoxFuture<'_, Duration> {
        Box::pin(async move {
            match effect {
                Effect::None => start,
                Effect::Delay { duration, action } => {
                    let due = start + duration;
                    self.push(due, ids, *action);
                    due
                },
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        self.push(start, ids, action);
                    }
                    start
                },
                Effect::Parallel(effects) => {
                    let mut end = start;
                    for effect in effects {
                        end = end.max(self.schedule(effect, start, ids.clone()).await);
                    }
                    end
                },
                Effect::Sequential(effects) => {
                    let mut at = start;
                    for effect in effects {
                        at = self.schedule(effect, at, ids.clone()).await;
                    }
                    at
                },
                Effect::Cancellable {
                    id,
                    cancel_in_flight,
                    effect,
                } => {
                    if cancel_in_flight {
                        self.cancel(id);
                    }
                    let mut ids = ids;
                    ids.push(id);
                    self.schedule(*effect, start, ids).await
                },
                Effect::Cancel(id) => {
                    self.cancel(id);
                    start
                },
            }
        })
    }
}
