//! Reducers for the todo list.
//!
//! [`TodoReducer`] edits one item. [`AppReducer`] owns the list itself: adding
//! items and scheduling the debounced reorder. [`app_reducer`] wires the two
//! together, routing indexed actions to the items with
//! [`for_each`](composable_todos_core::composition::for_each).

use crate::environment::{AppEnvironment, REORDER_CANCEL_ID};
use crate::types::{AppAction, AppState, Todo, TodoAction, TodoId};
use composable_todos_core::composition::{
    combine_reducers, for_each, CombinedReducer, ElementError,
};
use composable_todos_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use composable_todos_runtime::{DebugReducer, DebugReducerExt};

/// Reducer for a single todo
#[derive(Clone, Copy, Debug, Default)]
pub struct TodoReducer;

impl Reducer for TodoReducer {
    type State = Todo;
    type Action = TodoAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TodoAction::CheckboxTapped => {
                state.is_complete = !state.is_complete;
            },
            TodoAction::TextFieldChanged(text) => {
                state.description = text;
            },
        }
        SmallVec::new()
    }
}

/// Reducer for the list as a whole
#[derive(Clone, Copy, Debug, Default)]
pub struct AppReducer;

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AppAction::AddButtonTapped => {
                let todo = Todo::new(TodoId::new(env.ids.next_id()), "");
                tracing::debug!(id = %todo.id, "Adding todo");
                state.todos.insert(0, todo);
                state.last_error = None;
                SmallVec::new()
            },

            // The item itself was updated by TodoReducer; a missing one was reported there.
            AppAction::Todo { index, .. } if index >= state.todos.len() => SmallVec::new(),

            AppAction::Todo {
                action: TodoAction::CheckboxTapped,
                ..
            } => {
                state.last_error = None;
                smallvec![
                    Effect::Delay {
                        duration: env.reorder_delay,
                        action: Box::new(AppAction::TodoDelayCompleted),
                    }
                    .cancellable(REORDER_CANCEL_ID, true)
                ]
            },

            AppAction::Todo {
                action: TodoAction::TextFieldChanged(_),
                ..
            } => {
                state.last_error = None;
                SmallVec::new()
            },

            AppAction::TodoDelayCompleted => {
                state.reorder();
                state.last_error = None;
                tracing::debug!(remaining = state.remaining(), "Reordered todos");
                SmallVec::new()
            },
        }
    }
}

fn todos(state: &mut AppState) -> &mut Vec<Todo> {
    &mut state.todos
}

const fn todo_environment(_env: &AppEnvironment) -> &() {
    &()
}

fn record_error(state: &mut AppState, error: ElementError) {
    state.last_error = Some(error);
}

/// The reducer the application runs
pub type TodosReducer = DebugReducer<CombinedReducer<AppState, AppAction, AppEnvironment>>;

/// Builds the application reducer
///
/// Item actions are reduced by [`TodoReducer`] first, then [`AppReducer`]
/// sees every action. Every action and state change is logged at `debug`
/// level under the `todos` prefix.
#[must_use]
pub fn app_reducer() -> TodosReducer {
    combine_reducers(vec![
        Box::new(for_each(
            TodoReducer,
            todos,
            AppAction::into_todo,
            AppAction::todo,
            todo_environment,
            record_error,
        )),
        Box::new(AppReducer),
    ])
    .debug("todos")
}
