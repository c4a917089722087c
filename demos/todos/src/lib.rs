//! Todo list with a debounced reorder.
//!
//! A list of todos where checking an item off does not move it right away.
//! One second after the last checkbox tap, completed items sink below the
//! incomplete ones; every new tap restarts that wait. It demonstrates:
//!
//! - Per-item reducers lifted over a list with `for_each`
//! - Cancellable delayed effects (`cancel_in_flight`)
//! - Injected dependencies (id generation) for deterministic tests
//! - Action and state logging with `.debug()`
//!
//! # Quick Start
//!
//! ```no_run
//! use composable_todos_runtime::Store;
//! use todos::{app_reducer, AppAction, AppEnvironment, AppState, TodoAction, TodoConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TodoConfig::from_env()?;
//! let env = AppEnvironment::live(&config);
//! let store = Store::new(AppState::sample(env.ids.as_ref()), app_reducer(), env);
//!
//! // Check off "Milk"; it sinks below "Eggs" a second later
//! let mut handle = store.send(AppAction::todo(0, TodoAction::CheckboxTapped)).await?;
//! handle.wait().await;
//!
//! let order = store
//!     .state(|s| s.todos.iter().map(|t| t.description.clone()).collect::<Vec<_>>())
//!     .await;
//! assert_eq!(order, ["Eggs", "Milk", "Hand Soap"]);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod environment;
pub mod reducer;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigError, TodoConfig};
pub use environment::{AppEnvironment, REORDER_CANCEL_ID};
pub use reducer::{app_reducer, AppReducer, TodoReducer, TodosReducer};
pub use types::{AppAction, AppState, Todo, TodoAction, TodoId};
