//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use recipe_feed_core::{CatalogStore, GraphStore, InMemoryStore, RecipeCore};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub core: RecipeCore,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires every engine to the given stores using the configured policies.
    pub fn new(
        graph: Arc<dyn GraphStore>,
        catalog: Arc<dyn CatalogStore>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            core: RecipeCore::new(graph, catalog, config.core),
            config,
        }
    }

    /// State backed by a fresh process-local store.
    pub fn in_memory(config: Arc<Config>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(store.clone(), store, config)
    }
}
