//! # Composable Todos Core
//!
//! Core traits and types for the Composable Todos architecture.
//!
//! This crate provides the fundamental abstractions for building UI state
//! machines with unidirectional data flow using the Reducer pattern.
//!
//! ## Core Concepts
//!
//! - **State**: Plain value types describing what the user sees
//! - **Action**: Every input to a reducer (user gestures, timer firings)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution), optionally cancellable
//! - **Environment**: Injected dependencies via traits
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Unidirectional Data Flow
//! - Explicit Effects (no hidden I/O, no hidden timers)
//! - Dependency Injection via Environment
//!
//! ## Example
//!
//! ```
//! use composable_todos_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct ToggleState {
//!     on: bool,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum ToggleAction {
//!     Flip,
//! }
//!
//! struct ToggleReducer;
//!
//! impl Reducer for ToggleReducer {
//!     type State = ToggleState;
//!     type Action = ToggleAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut ToggleState,
//!         action: ToggleAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<ToggleAction>; 4]> {
//!         match action {
//!             ToggleAction::Flip => state.on = !state.on,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = ToggleState::default();
//! let _ = ToggleReducer.reduce(&mut state, ToggleAction::Flip, &());
//! assert!(state.on);
//! ```

// Re-export commonly used types
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Reducer composition utilities (`combine_reducers`, `for_each`)
pub mod composition;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for AppReducer {
    ///     type State = AppState;
    ///     type Action = AppAction;
    ///     type Environment = AppEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut AppState,
    ///         action: AppAction,
    ///         env: &AppEnvironment,
    ///     ) -> SmallVec<[Effect<AppAction>; 4]> {
    ///         match action {
    ///             AppAction::AddButtonTapped => {
    ///                 state.todos.insert(0, Todo::new(env.ids.next_id()));
    ///                 smallvec![Effect::None]
    ///             }
    ///             _ => smallvec![Effect::None],
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// Effects to be executed by the runtime
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable and cancellable.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;

    /// Identity of a logical effect, used for cancellation
    ///
    /// Effects tagged with the same id are considered the same kind: a new
    /// `Cancellable` with `cancel_in_flight` set replaces any in-flight
    /// effect sharing its id.
    ///
    /// # Example
    ///
    /// ```
    /// use composable_todos_core::effect::EffectId;
    ///
    /// const REORDER: EffectId = EffectId::new("reorder");
    /// assert_eq!(REORDER.as_str(), "reorder");
    /// ```
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct EffectId(&'static str);

    impl EffectId {
        /// Creates an effect id from a static key
        #[must_use]
        pub const fn new(key: &'static str) -> Self {
            Self(key)
        }

        /// Returns the key this id was created with
        #[must_use]
        pub const fn as_str(&self) -> &'static str {
            self.0
        }
    }

    impl std::fmt::Display for EffectId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    /// Boxed future produced by [`Effect::Future`]
    pub type EffectFuture<Action> = Pin<Box<dyn Future<Output = Option<Action>> + Send>>;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (for timeouts, debounced reorders)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(EffectFuture<Action>),

        /// Effect registered under an id so it can be cancelled later
        Cancellable {
            /// Identity of the effect
            id: EffectId,
            /// Cancel every in-flight effect with the same id before starting
            cancel_in_flight: bool,
            /// The wrapped effect
            effect: Box<Effect<Action>>,
        },

        /// Cancel every in-flight effect registered under the id
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable {
                    id,
                    cancel_in_flight,
                    effect,
                } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("cancel_in_flight", cancel_in_flight)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    /// Shared action transform used while lifting effects
    type ActionMap<A, B> = Arc<dyn Fn(A) -> B + Send + Sync>;

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Cancel every in-flight effect registered under `id`
        #[must_use]
        pub const fn cancel(id: EffectId) -> Effect<Action> {
            Effect::Cancel(id)
        }

        /// Register this effect under `id` so it can be cancelled
        ///
        /// With `cancel_in_flight`, starting this effect cancels any
        /// previous effect with the same id, so at most one stays in flight.
        ///
        /// # Example
        ///
        /// ```
        /// use composable_todos_core::effect::{Effect, EffectId};
        /// use std::time::Duration;
        ///
        /// const DEBOUNCE: EffectId = EffectId::new("debounce");
        ///
        /// let effect = Effect::Delay {
        ///     duration: Duration::from_secs(1),
        ///     action: Box::new("fire"),
        /// }
        /// .cancellable(DEBOUNCE, true);
        ///
        /// assert!(matches!(effect, Effect::Cancellable { cancel_in_flight: true, .. }));
        /// ```
        #[must_use]
        pub fn cancellable(self, id: EffectId, cancel_in_flight: bool) -> Effect<Action> {
            Effect::Cancellable {
                id,
                cancel_in_flight,
                effect: Box::new(self),
            }
        }

        /// Returns true if this effect does nothing
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    effects.iter().all(Effect::is_none)
                },
                _ => false,
            }
        }

        /// Transform the actions this effect produces
        ///
        /// Used to lift effects of a child reducer into the parent's action type.
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            F: Fn(Action) -> B + Send + Sync + 'static,
            Action: Send + 'static,
            B: Send + 'static,
        {
            let f: ActionMap<Action, B> = Arc::new(f);
            self.map_shared(&f)
        }

        fn map_shared<B>(self, f: &ActionMap<Action, B>) -> Effect<B>
        where
            Action: Send + 'static,
            B: Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => {
                    Effect::Parallel(effects.into_iter().map(|e| e.map_shared(f)).collect())
                },
                Effect::Sequential(effects) => {
                    Effect::Sequential(effects.into_iter().map(|e| e.map_shared(f)).collect())
                },
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Effect::Future(fut) => {
                    let f = Arc::clone(f);
                    Effect::Future(Box::pin(async move { fut.await.map(|action| f(action)) }))
                },
                Effect::Cancellable {
                    id,
                    cancel_in_flight,
                    effect,
                } => Effect::Cancellable {
                    id,
                    cancel_in_flight,
                    effect: Box::new(effect.map_shared(f)),
                },
                Effect::Cancel(id) => Effect::Cancel(id),
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter, so reducers never reach for ambient state.
pub mod environment {
    use uuid::Uuid;

    /// `IdGenerator` trait - abstracts identifier creation for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use composable_todos_core::environment::{IdGenerator, UuidGenerator};
    ///
    /// let ids = UuidGenerator;
    /// assert_ne!(ids.next_id(), ids.next_id());
    /// ```
    pub trait IdGenerator: Send + Sync {
        /// Produce a fresh identifier
        fn next_id(&self) -> Uuid;
    }

    /// Production id generator backed by random v4 UUIDs
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UuidGenerator;

    impl IdGenerator for UuidGenerator {
        fn next_id(&self) -> Uuid {
            Uuid::new_v4()
        }
    }
}
