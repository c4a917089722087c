//! Dependencies injected into the todo reducers.

use crate::config::TodoConfig;
use composable_todos_core::effect::EffectId;
use composable_todos_core::environment::{IdGenerator, UuidGenerator};
use std::sync::Arc;
use std::time::Duration;

/// Identity of the pending reorder; a newer checkbox tap replaces it
pub const REORDER_CANCEL_ID: EffectId = EffectId::new("todos.reorder");

/// Environment for the todo list
#[derive(Clone)]
pub struct AppEnvironment {
    /// Source of ids for new todos
    pub ids: Arc<dyn IdGenerator>,
    /// How long after the last checkbox tap the list is reordered
    pub reorder_delay: Duration,
}

impl AppEnvironment {
    /// Creates an environment from its parts
    #[must_use]
    pub fn new(ids: Arc<dyn IdGenerator>, reorder_delay: Duration) -> Self {
        Self { ids, reorder_delay }
    }

    /// Production environment: random ids and the configured delay
    #[must_use]
    pub fn live(config: &TodoConfig) -> Self {
        Self::new(Arc::new(UuidGenerator), config.reorder_delay)
    }
}

impl std::fmt::Debug for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppEnvironment")
            .field("reorder_delay", &self.reorder_delay)
            .finish_non_exhaustive()
    }
}
