//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers in various ways:
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`for_each`**: Run an element reducer on one item of a collection, addressed by index
//!
//! # Examples
//!
//! ## Combining Reducers
//!
//! ```
//! use composable_todos_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//! use composable_todos_core::composition::combine_reducers;
//!
//! #[derive(Clone)]
//! struct MyState {
//!     count: i32,
//!     name: String,
//! }
//!
//! #[derive(Clone)]
//! enum MyAction {
//!     Increment,
//!     SetName(String),
//! }
//!
//! struct CounterReducer;
//! struct NameReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = MyState;
//!     type Action = MyAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut MyState, action: MyAction, _env: &()) -> SmallVec<[Effect<MyAction>; 4]> {
//!         if let MyAction::Increment = action {
//!             state.count += 1;
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! impl Reducer for NameReducer {
//!     type State = MyState;
//!     type Action = MyAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut MyState, action: MyAction, _env: &()) -> SmallVec<[Effect<MyAction>; 4]> {
//!         if let MyAction::SetName(name) = action {
//!             state.name = name;
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let combined = combine_reducers(vec![Box::new(CounterReducer), Box::new(NameReducer)]);
//! let mut state = MyState { count: 0, name: String::new() };
//! let _ = combined.reduce(&mut state, MyAction::Increment, &());
//! assert_eq!(state.count, 1);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Errors raised while routing an action to an element of a collection
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementError {
    /// The action addressed an index past the end of the collection
    #[error("Index {index} out of range for collection of length {len}")]
    IndexOutOfRange {
        /// Index carried by the action
        index: usize,
        /// Length of the collection when the action was reduced
        len: usize,
    },
}

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and concatenated.
/// This is useful when you want to split reducer logic across multiple implementations.
///
/// # Type Parameters
///
/// - `S`: The state type
/// - `A`: The action type
/// - `E`: The environment type
#[must_use]
pub fn combine_reducers<S, A, E>(
    reducers: Vec<Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>,
) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>,
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects);
        }

        all_effects
    }
}

/// Lifts a reducer over a single element into a reducer over a collection.
///
/// Parent actions that carry `(index, element_action)` are routed to the
/// element at `index`; every other action is ignored. Effects returned by the
/// element reducer are re-embedded into the parent action type with the same
/// index.
///
/// An index past the end of the collection is reported, never dropped
/// silently: the failure is logged and handed to `report` so it can be
/// recorded in state.
///
/// # Arguments
///
/// - `reducer`: The element reducer
/// - `elements`: Accessor for the collection inside the parent state
/// - `extract`: Splits a parent action into `(index, element_action)`, if it is one
/// - `embed`: Wraps an element action back into the parent action type
/// - `environment`: Projects the parent environment onto the element environment
/// - `report`: Records an [`ElementError`] in the parent state
///
/// # Examples
///
/// ```
/// use composable_todos_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
/// use composable_todos_core::composition::{for_each, ElementError};
///
/// #[derive(Clone, Debug, Default)]
/// struct Row {
///     checked: bool,
/// }
///
/// #[derive(Clone, Debug)]
/// enum RowAction {
///     Check,
/// }
///
/// struct RowReducer;
///
/// impl Reducer for RowReducer {
///     type State = Row;
///     type Action = RowAction;
///     type Environment = ();
///
///     fn reduce(&self, state: &mut Row, _action: RowAction, _env: &()) -> SmallVec<[Effect<RowAction>; 4]> {
///         state.checked = true;
///         smallvec![Effect::None]
///     }
/// }
///
/// #[derive(Clone, Debug, Default)]
/// struct Table {
///     rows: Vec<Row>,
///     error: Option<ElementError>,
/// }
///
/// #[derive(Clone, Debug)]
/// enum TableAction {
///     Row(usize, RowAction),
/// }
///
/// let reducer = for_each(
///     RowReducer,
///     |table: &mut Table| &mut table.rows,
///     |action: TableAction| match action {
///         TableAction::Row(index, action) => Some((index, action)),
///     },
///     TableAction::Row,
///     |_env: &()| &(),
///     |table: &mut Table, error| table.error = Some(error),
/// );
///
/// let mut table = Table { rows: vec![Row::default(), Row::default()], error: None };
/// let _ = reducer.reduce(&mut table, TableAction::Row(1, RowAction::Check), &());
/// assert!(table.rows[1].checked);
/// assert!(!table.rows[0].checked);
///
/// let _ = reducer.reduce(&mut table, TableAction::Row(7, RowAction::Check), &());
/// assert_eq!(table.error, Some(ElementError::IndexOutOfRange { index: 7, len: 2 }));
/// ```
#[must_use]
pub fn for_each<S, A, E, R>(
    reducer: R,
    elements: fn(&mut S) -> &mut Vec<R::State>,
    extract: fn(A) -> Option<(usize, R::Action)>,
    embed: fn(usize, R::Action) -> A,
    environment: fn(&E) -> &R::Environment,
    report: fn(&mut S, ElementError),
) -> ForEachReducer<S, A, E, R>
where
    R: Reducer,
{
    ForEachReducer {
        reducer,
        elements,
        extract,
        embed,
        environment,
        report,
    }
}

/// A reducer that routes indexed actions to the elements of a collection.
///
/// Created by [`for_each`].
pub struct ForEachReducer<S, A, E, R>
where
    R: Reducer,
{
    reducer: R,
    elements: fn(&mut S) -> &mut Vec<R::State>,
    extract: fn(A) -> Option<(usize, R::Action)>,
    embed: fn(usize, R::Action) -> A,
    environment: fn(&E) -> &R::Environment,
    report: fn(&mut S, ElementError),
}

impl<S, A, E, R> Reducer for ForEachReducer<S, A, E, R>
where
    R: Reducer,
    R::Action: Send + 'static,
    A: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some((index, element_action)) = (self.extract)(action) else {
            return SmallVec::new();
        };

        let len = (self.elements)(state).len();
        if index >= len {
            tracing::error!(index, len, "Element action addressed a missing element");
            (self.report)(state, ElementError::IndexOutOfRange { index, len });
            return SmallVec::new();
        }

        let element = &mut (self.elements)(state)[index];
        let embed = self.embed;

        self.reducer
            .reduce(element, element_action, (self.environment)(env))
            .into_iter()
            .map(|effect| effect.map(move |action| embed(index, action)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::EffectId;
    use crate::smallvec;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct TestState {
        counter: i32,
        name: String,
    }

    #[derive(Clone)]
    enum TestAction {
        Increment,
        Decrement,
        SetName(String),
    }

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.counter += 1;
                    smallvec![Effect::None]
                },
                TestAction::Decrement => {
                    state.counter -= 1;
                    smallvec![Effect::None]
                },
                TestAction::SetName(_) => smallvec![Effect::None],
            }
        }
    }

    struct NameReducer;

    impl Reducer for NameReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            if let TestAction::SetName(name) = action {
                state.name = name;
            }
            smallvec![Effect::None]
        }
    }

    #[test]
    fn test_combine_reducers() {
        let combined = combine_reducers(vec![Box::new(CounterReducer), Box::new(NameReducer)]);

        let mut state = TestState::default();

        let _ = combined.reduce(&mut state, TestAction::Increment, &());
        assert_eq!(state.counter, 1);

        let _ = combined.reduce(&mut state, TestAction::SetName("Alice".to_string()), &());
        assert_eq!(state.name, "Alice");

        // Both reducers work
        let _ = combined.reduce(&mut state, TestAction::Decrement, &());
        assert_eq!(state.counter, 0);
        assert_eq!(state.name, "Alice");
    }

    #[test]
    fn test_combine_reducers_concatenates_effects() {
        let combined = combine_reducers(vec![Box::new(CounterReducer), Box::new(NameReducer)]);

        let mut state = TestState::default();
        let effects = combined.reduce(&mut state, TestAction::Increment, &());
        assert_eq!(effects.len(), 2);
    }

    // for_each tests
    const PING: EffectId = EffectId::new("ping");

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Cell {
        value: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum CellAction {
        Add(i32),
        Ping,
    }

    struct CellReducer;

    impl Reducer for CellReducer {
        type State = Cell;
        type Action = CellAction;
        type Environment = i32;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                CellAction::Add(n) => {
                    state.value += n * env;
                    smallvec![Effect::None]
                },
                CellAction::Ping => smallvec![
                    Effect::Delay {
                        duration: Duration::from_secs(1),
                        action: Box::new(CellAction::Add(1)),
                    }
                    .cancellable(PING, true)
                ],
            }
        }
    }

    #[derive(Clone, Debug, Default)]
    struct Grid {
        cells: Vec<Cell>,
        errors: Vec<ElementError>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum GridAction {
        Cell { index: usize, action: CellAction },
        Reset,
    }

    struct GridEnv {
        multiplier: i32,
    }

    fn grid_reducer() -> ForEachReducer<Grid, GridAction, GridEnv, CellReducer> {
        for_each(
            CellReducer,
            |grid: &mut Grid| &mut grid.cells,
            |action: GridAction| match action {
                GridAction::Cell { index, action } => Some((index, action)),
                GridAction::Reset => None,
            },
            |index, action| GridAction::Cell { index, action },
            |env: &GridEnv| &env.multiplier,
            |grid: &mut Grid, error| grid.errors.push(error),
        )
    }

    fn grid(len: usize) -> Grid {
        Grid {
            cells: vec![Cell::default(); len],
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_for_each_routes_to_index() {
        let reducer = grid_reducer();
        let mut state = grid(3);

        let _ = reducer.reduce(
            &mut state,
            GridAction::Cell {
                index: 1,
                action: CellAction::Add(2),
            },
            &GridEnv { multiplier: 5 },
        );

        assert_eq!(state.cells[0].value, 0);
        assert_eq!(state.cells[1].value, 10);
        assert_eq!(state.cells[2].value, 0);
        assert!(state.errors.is_empty());
    }

    #[test]
    fn test_for_each_ignores_other_actions() {
        let reducer = grid_reducer();
        let mut state = grid(2);

        let effects = reducer.reduce(&mut state, GridAction::Reset, &GridEnv { multiplier: 1 });

        assert!(effects.is_empty());
        assert!(state.errors.is_empty());
    }

    #[test]
    fn test_for_each_reports_out_of_range() {
        let reducer = grid_reducer();
        let mut state = grid(2);

        let effects = reducer.reduce(
            &mut state,
            GridAction::Cell {
                index: 2,
                action: CellAction::Add(1),
            },
            &GridEnv { multiplier: 1 },
        );

        assert!(effects.is_empty());
        assert_eq!(
            state.errors,
            vec![ElementError::IndexOutOfRange { index: 2, len: 2 }]
        );
        assert!(state.cells.iter().all(|cell| cell.value == 0));
    }

    #[test]
    #[allow(clippy::panic)]
    fn test_for_each_embeds_effects_with_index() {
        let reducer = grid_reducer();
        let mut state = grid(4);

        let mut effects = reducer.reduce(
            &mut state,
            GridAction::Cell {
                index: 3,
                action: CellAction::Ping,
            },
            &GridEnv { multiplier: 1 },
        );

        assert_eq!(effects.len(), 1);
        let Some(Effect::Cancellable { id, effect, .. }) = effects.pop() else {
            panic!("expected a cancellable effect");
        };
        assert_eq!(id, PING);
        let Effect::Delay { action, .. } = *effect else {
            panic!("expected a delay effect");
        };
        assert_eq!(
            *action,
            GridAction::Cell {
                index: 3,
                action: CellAction::Add(1)
            }
        );
    }

    #[test]
    fn test_element_error_display() {
        let error = ElementError::IndexOutOfRange { index: 4, len: 3 };
        assert_eq!(
            error.to_string(),
            "Index 4 out of range for collection of length 3"
        );
    }
}
