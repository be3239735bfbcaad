//! crates/recipe_feed_core/src/feed.rs
//!
//! The personalised feed: recipes published by the users someone follows,
//! newest first.

use std::sync::Arc;
use tracing::debug;

use crate::aggregation::{Aggregator, RecipeCard};
use crate::domain::{Page, PageRequest, RecipeFilter, RecipeSort, UserId};
use crate::error::{CoreError, CoreResult};
use crate::ports::{CatalogStore, GraphStore};

#[derive(Clone)]
pub struct FeedEngine {
    graph: Arc<dyn GraphStore>,
    catalog: Arc<dyn CatalogStore>,
    aggregator: Aggregator,
    max_page_size: u32,
}

impl FeedEngine {
    pub fn new(
        graph: Arc<dyn GraphStore>,
        catalog: Arc<dyn CatalogStore>,
        max_page_size: u32,
    ) -> Self {
        let aggregator = Aggregator::new(catalog.clone());
        Self {
            graph,
            catalog,
            aggregator,
            max_page_size,
        }
    }

    /// Returns one page of recipes authored by users `user_id` follows,
    /// ordered by publish time descending and recipe id ascending.
    ///
    /// `total` is the size of the whole candidate set, so a page past the end
    /// comes back empty with the real total.
    pub async fn feed(
        &self,
        user_id: UserId,
        page: i64,
        size: i64,
        category: Option<&str>,
    ) -> CoreResult<Page<RecipeCard>> {
        let request = PageRequest::new(page, size, self.max_page_size)?;

        let user = self.catalog.get_user(user_id).await?;
        if user.deleted {
            return Err(CoreError::NotFound(format!("User {user_id} not found")));
        }

        let followees = self.graph.followees_of(user_id).await?;
        if followees.is_empty() {
            debug!(%user_id, "feed requested by a user following nobody");
            return Ok(Page::empty(request));
        }

        let filter = RecipeFilter {
            authors: Some(followees),
            category: category
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            ..RecipeFilter::default()
        };
        let (recipes, total) = self
            .catalog
            .query_recipes(&filter, RecipeSort::Newest, request.offset(), request.limit())
            .await?;
        let items = self.aggregator.cards(recipes).await?;

        debug!(%user_id, total, returned = items.len(), "feed assembled");
        Ok(Page {
            items,
            total,
            page: request.page,
            size: request.size,
        })
    }
}
