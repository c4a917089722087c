//! Action and state logging for any reducer.
//!
//! [`DebugReducer`] wraps a reducer and emits a `debug` event for every
//! action it receives, followed by the state before and after when the
//! action changed it. Nothing is cloned or formatted unless `debug` events
//! are enabled for this target.
//!
//! ```ignore
//! use composable_todos_runtime::DebugReducerExt;
//!
//! let reducer = AppReducer.debug("todos");
//! ```

use composable_todos_core::effect::Effect;
use composable_todos_core::reducer::Reducer;
use composable_todos_core::SmallVec;
use std::fmt::Debug;
use tracing::Level;

/// Reducer wrapper that logs received actions and resulting state changes
#[derive(Debug, Clone)]
pub struct DebugReducer<R> {
    reducer: R,
    prefix: &'static str,
}

impl<R> DebugReducer<R> {
    /// Wrap `reducer`, tagging its log events with `prefix`
    #[must_use]
    pub const fn new(reducer: R, prefix: &'static str) -> Self {
        Self { reducer, prefix }
    }
}

impl<R> Reducer for DebugReducer<R>
where
    R: Reducer,
    R::State: Clone + PartialEq + Debug,
    R::Action: Debug,
{
    type State = R::State;
    type Action = R::Action;
    type Environment = R::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if !tracing::enabled!(Level::DEBUG) {
            return self.reducer.reduce(state, action, env);
        }

        tracing::debug!(prefix = self.prefix, ?action, "received action");
        let before = state.clone();

        let effects = self.reducer.reduce(state, action, env);

        if before == *state {
            tracing::debug!(prefix = self.prefix, "(no state changes)");
        } else {
            tracing::debug!(
                prefix = self.prefix,
                before = ?before,
                after = ?state,
                "state changed"
            );
        }

        effects
    }
}

/// Adds `.debug()` to every reducer
pub trait DebugReducerExt: Reducer + Sized {
    /// Log every action and state change of this reducer at `debug` level
    fn debug(self, prefix: &'static str) -> DebugReducer<Self> {
        DebugReducer::new(self, prefix)
    }
}

impl<R: Reducer> DebugReducerExt for R {}
