//! Property tests for the todo reducers

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use composable_todos_core::reducer::Reducer;
use composable_todos_testing::SequentialIdGenerator;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use todos::{app_reducer, AppAction, AppEnvironment, AppState, Todo, TodoAction, TodoId};
use uuid::Uuid;

fn env() -> AppEnvironment {
    AppEnvironment::new(
        Arc::new(SequentialIdGenerator::starting_at(1_000)),
        Duration::from_secs(1),
    )
}

fn state_strategy() -> impl Strategy<Value = AppState> {
    prop::collection::vec(any::<bool>(), 0..24).prop_map(|flags| {
        AppState::new(
            flags
                .into_iter()
                .enumerate()
                .map(|(n, complete)| {
                    let todo = Todo::new(TodoId::new(Uuid::from_u128(n as u128)), format!("#{n}"));
                    if complete { todo.completed() } else { todo }
                })
                .collect(),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn reorder_partitions_and_preserves_relative_order(state in state_strategy()) {
        let before = state.clone();
        let mut after = state;
        let _ = app_reducer().reduce(&mut after, AppAction::TodoDelayCompleted, &env());

        // Every incomplete item precedes every complete item
        let first_complete = after.todos.iter().position(|t| t.is_complete).unwrap_or(after.todos.len());
        prop_assert!(after.todos[first_complete..].iter().all(|t| t.is_complete));

        // Each group keeps its original relative order
        for complete in [false, true] {
            let ids = |s: &AppState| -> Vec<TodoId> {
                s.todos.iter().filter(|t| t.is_complete == complete).map(|t| t.id).collect()
            };
            prop_assert_eq!(ids(&before), ids(&after));
        }
    }

    #[test]
    fn adding_n_items_puts_latest_first(n in 1usize..16) {
        let reducer = app_reducer();
        let env = env();
        let mut state = AppState::default();

        for _ in 0..n {
            let _ = reducer.reduce(&mut state, AppAction::AddButtonTapped, &env);
        }

        prop_assert_eq!(state.todos.len(), n);
        prop_assert_eq!(*state.todos[0].id.as_uuid(), Uuid::from_u128(999 + n as u128));

        let ids: HashSet<TodoId> = state.todos.iter().map(|t| t.id).collect();
        prop_assert_eq!(ids.len(), n);
    }

    #[test]
    fn toggle_flips_only_target(state in state_strategy(), pick in any::<prop::sample::Index>()) {
        prop_assume!(!state.todos.is_empty());
        let index = pick.index(state.todos.len());

        let mut after = state.clone();
        let _ = app_reducer().reduce(&mut after, AppAction::todo(index, TodoAction::CheckboxTapped), &env());

        for (i, (old, new)) in state.todos.iter().zip(&after.todos).enumerate() {
            prop_assert_eq!(old.id, new.id);
            prop_assert_eq!(&old.description, &new.description);
            prop_assert_eq!(old.is_complete != new.is_complete, i == index);
        }
    }

    #[test]
    fn edit_replaces_only_description(
        state in state_strategy(),
        pick in any::<prop::sample::Index>(),
        text in ".{0,20}",
    ) {
        prop_assume!(!state.todos.is_empty());
        let index = pick.index(state.todos.len());

        let mut after = state.clone();
        let _ = app_reducer().reduce(
            &mut after,
            AppAction::todo(index, TodoAction::TextFieldChanged(text.clone())),
            &env(),
        );

        prop_assert_eq!(&after.todos[index].description, &text);
        prop_assert_eq!(after.todos[index].id, state.todos[index].id);
        prop_assert_eq!(after.todos[index].is_complete, state.todos[index].is_complete);
        prop_assert_eq!(after.todos.len(), state.todos.len());
    }
}
