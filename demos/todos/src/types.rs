//! Domain types for the todo list.
//!
//! The list is an ordered `Vec<Todo>`: insertion order is what the user sees,
//! and it is the tie-break when completed items sink to the bottom.

use composable_todos_core::composition::ElementError;
use composable_todos_core::environment::IdGenerator;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a todo item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TodoId(Uuid);

impl TodoId {
    /// Creates a `TodoId` from a UUID
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single todo item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier, fixed for the item's lifetime
    pub id: TodoId,
    /// Free-form text
    pub description: String,
    /// Whether the item is done
    pub is_complete: bool,
}

impl Todo {
    /// Creates an incomplete todo
    #[must_use]
    pub fn new(id: TodoId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            is_complete: false,
        }
    }

    /// Marks the todo as done
    #[must_use]
    pub fn completed(mut self) -> Self {
        self.is_complete = true;
        self
    }
}

/// State of the whole list
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// Items in display order
    pub todos: Vec<Todo>,
    /// Set when the last action addressed a missing item; any other action clears it
    pub last_error: Option<ElementError>,
}

impl AppState {
    /// Creates a state holding `todos`
    #[must_use]
    pub const fn new(todos: Vec<Todo>) -> Self {
        Self {
            todos,
            last_error: None,
        }
    }

    /// The list shown on first launch
    #[must_use]
    pub fn sample(ids: &dyn IdGenerator) -> Self {
        Self::new(vec![
            Todo::new(TodoId::new(ids.next_id()), "Milk"),
            Todo::new(TodoId::new(ids.next_id()), "Eggs"),
            Todo::new(TodoId::new(ids.next_id()), "Hand Soap").completed(),
        ])
    }

    /// Moves completed items after incomplete ones
    ///
    /// Stable: items keep their relative order inside each group.
    pub fn reorder(&mut self) {
        self.todos.sort_by_key(|todo| todo.is_complete);
    }

    /// Number of items not yet done
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.is_complete).count()
    }
}

/// Actions on a single todo
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoAction {
    /// Flip the completion flag
    CheckboxTapped,
    /// Replace the description
    TextFieldChanged(String),
}

/// Actions on the list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppAction {
    /// Insert an empty todo at the top
    AddButtonTapped,
    /// Route `action` to the todo at `index`
    Todo {
        /// Position in the list
        index: usize,
        /// Action for that todo
        action: TodoAction,
    },
    /// The debounce after a checkbox tap elapsed
    TodoDelayCompleted,
}

impl AppAction {
    /// Builds an action for the todo at `index`
    #[must_use]
    pub const fn todo(index: usize, action: TodoAction) -> Self {
        Self::Todo { index, action }
    }

    /// Splits an action for a single todo into its parts
    #[must_use]
    pub fn into_todo(self) -> Option<(usize, TodoAction)> {
        match self {
            Self::Todo { index, action } => Some((index, action)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(n: u128, complete: bool) -> Todo {
        let todo = Todo::new(TodoId::new(Uuid::from_u128(n)), format!("item {n}"));
        if complete { todo.completed() } else { todo }
    }

    #[test]
    fn test_reorder_is_stable_partition() {
        // [A(incomplete), B(complete), C(incomplete)] with A toggled to complete
        let mut state = AppState::new(vec![todo(1, true), todo(2, true), todo(3, false)]);

        state.reorder();

        let ids: Vec<u128> = state.todos.iter().map(|t| t.id.as_uuid().as_u128()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_reorder_keeps_incomplete_order() {
        let mut state = AppState::new(vec![
            todo(1, false),
            todo(2, true),
            todo(3, false),
            todo(4, true),
            todo(5, false),
        ]);

        state.reorder();

        let ids: Vec<u128> = state.todos.iter().map(|t| t.id.as_uuid().as_u128()).collect();
        assert_eq!(ids, vec![1, 3, 5, 2, 4]);
        assert_eq!(state.remaining(), 3);
    }

    #[test]
    fn test_into_todo() {
        assert_eq!(
            AppAction::todo(2, TodoAction::CheckboxTapped).into_todo(),
            Some((2, TodoAction::CheckboxTapped))
        );
        assert_eq!(AppAction::AddButtonTapped.into_todo(), None);
    }

    #[test]
    fn test_state_json_shape() {
        let state = AppState::new(vec![todo(1, false)]);
        let json = serde_json::to_value(&state).unwrap_or_default();

        assert_eq!(json["todos"][0]["description"], "item 1");
        assert_eq!(json["todos"][0]["is_complete"], false);
        assert!(json["last_error"].is_null());
    }
}
