//! crates/recipe_feed_core/src/lib.rs
//!
//! The feed, search and ranking core of the recipe service. Storage sits
//! behind the `GraphStore` and `CatalogStore` ports; everything else here is
//! independent of databases and transports.

pub mod actions;
pub mod aggregation;
pub mod domain;
pub mod error;
pub mod feed;
pub mod memory;
pub mod ports;
pub mod ranking;
pub mod reader;
pub mod search;
pub mod times;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

pub use actions::{ActionCoordinator, FollowState, LikeState};
pub use aggregation::{Aggregator, RecipeAggregate, RecipeCard};
pub use domain::{
    DeletionPolicy, Gender, NewRecipe, NewUser, Page, ProfileUpdate, Recipe, RecipeComplexity,
    RecipeId, Review, ReviewId, ReviewPolicy, ReviewSort, User, UserId,
};
pub use error::{CoreError, CoreResult};
pub use feed::FeedEngine;
pub use memory::InMemoryStore;
pub use ports::{CatalogStore, GraphStore, PortError, PortResult};
pub use ranking::{FollowerRatio, RankingEngine};
pub use reader::{RecipeDetail, RecipeReader, UserProfile};
pub use search::{SearchEngine, SearchQuery};
pub use times::{CookingTime, RecipeTimes};

/// Page size used when no explicit limit is configured.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 200;

/// Tunables and the two policy decisions left open by the data model.
#[derive(Debug, Clone, Copy)]
pub struct CoreSettings {
    pub max_page_size: u32,
    pub review_policy: ReviewPolicy,
    pub deletion_policy: DeletionPolicy,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            review_policy: ReviewPolicy::default(),
            deletion_policy: DeletionPolicy::default(),
        }
    }
}

/// All engines wired to the same pair of stores.
#[derive(Clone)]
pub struct RecipeCore {
    pub aggregator: Aggregator,
    pub feed: FeedEngine,
    pub search: SearchEngine,
    pub ranking: RankingEngine,
    pub actions: ActionCoordinator,
    pub reader: RecipeReader,
}

impl RecipeCore {
    pub fn new(
        graph: Arc<dyn GraphStore>,
        catalog: Arc<dyn CatalogStore>,
        settings: CoreSettings,
    ) -> Self {
        Self {
            aggregator: Aggregator::new(catalog.clone()),
            feed: FeedEngine::new(graph.clone(), catalog.clone(), settings.max_page_size),
            search: SearchEngine::new(catalog.clone(), settings.max_page_size),
            ranking: RankingEngine::new(graph.clone(), catalog.clone()),
            actions: ActionCoordinator::new(
                graph.clone(),
                catalog.clone(),
                settings.review_policy,
                settings.deletion_policy,
            ),
            reader: RecipeReader::new(graph, catalog, settings.max_page_size),
        }
    }
}
