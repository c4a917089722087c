//! # Composable Todos Testing
//!
//! Testing utilities and helpers for the Composable Todos architecture.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A Given-When-Then builder for single reducer steps
//! - A deterministic [`TestStore`] with a virtual clock for effect timing
//! - Assertion helpers for reducers and effects
//!
//! ## Example
//!
//! ```ignore
//! use composable_todos_testing::{mocks::SequentialIdGenerator, TestStore};
//!
//! #[tokio::test]
//! async fn adding_a_todo() {
//!     let ids = Arc::new(SequentialIdGenerator::new());
//!     let env = AppEnvironment::new(ids.clone(), Duration::from_secs(1));
//!     let mut store = TestStore::new(AppState::default(), app_reducer(), env);
//!
//!     store
//!         .send(AppAction::AddButtonTapped, |s| {
//!             s.todos.insert(0, Todo::new(TodoId::new(ids.peek(0)), ""));
//!         })
//!         .await;
//!     store.finish();
//! }
//! ```


/// Deterministic store with virtual time
pub mod test_store;

/// Mock implementations of Environment traits
pub mod mocks {
    use composable_todos_core::environment::IdGenerator;
    use std::sync::atomic::{AtomicU64, Ordering};
    use uuid::Uuid;

    /// Predictable id generator for deterministic tests
    ///
    /// Yields `00000000-0000-0000-0000-000000000000`, then `...0001`, and so on.
    ///
    /// # Example
    ///
    /// ```
    /// use composable_todos_testing::mocks::SequentialIdGenerator;
    /// use composable_todos_core::environment::IdGenerator;
    /// use uuid::Uuid;
    ///
    /// let ids = SequentialIdGenerator::new();
    /// assert_eq!(ids.next_id(), Uuid::from_u128(0));
    /// assert_eq!(ids.next_id(), Uuid::from_u128(1));
    /// ```
    #[derive(Debug, Default)]
    pub struct SequentialIdGenerator {
        next: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Create a generator starting at zero
        #[must_use]
        pub const fn new() -> Self {
            Self::starting_at(0)
        }

        /// Create a generator starting at `first`
        #[must_use]
        pub const fn starting_at(first: u64) -> Self {
            Self {
                next: AtomicU64::new(first),
            }
        }

        /// The id that will be returned `ahead` calls from now, without consuming it
        #[must_use]
        pub fn peek(&self, ahead: u64) -> Uuid {
            Uuid::from_u128(u128::from(self.next.load(Ordering::SeqCst) + ahead))
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_id(&self) -> Uuid {
            Uuid::from_u128(u128::from(self.next.fetch_add(1, Ordering::SeqCst)))
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a `tracing` subscriber that writes through the test harness
    ///
    /// Honors `RUST_LOG`. Safe to call from every test; only the first call
    /// installs a subscriber.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::SequentialIdGenerator;
pub use reducer_test::{assertions, ReducerTest};
pub use test_store::TestStore;
