//! crates/recipe_feed_core/src/reader.rs
//!
//! Single-entity read paths: recipe detail, a recipe's reviews, user profiles.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::aggregation::{Aggregator, RecipeAggregate};
use crate::domain::{Page, PageRequest, Recipe, RecipeId, Review, ReviewSort, User, UserId};
use crate::error::{CoreError, CoreResult};
use crate::ports::{CatalogStore, GraphStore, PortError};

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    /// `None` once the author's account has been deleted.
    pub author_name: Option<String>,
    pub aggregate: RecipeAggregate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user: User,
    pub followers: u64,
    pub following: u64,
    pub follower_ids: BTreeSet<UserId>,
    pub followee_ids: BTreeSet<UserId>,
}

#[derive(Clone)]
pub struct RecipeReader {
    graph: Arc<dyn GraphStore>,
    catalog: Arc<dyn CatalogStore>,
    aggregator: Aggregator,
    max_page_size: u32,
}

impl RecipeReader {
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

    pub async fn recipe_detail(&self, recipe_id: RecipeId) -> CoreResult<RecipeDetail> {
        let recipe = self.catalog.get_recipe(recipe_id).await?;
        let author_name = match self.catalog.get_user(recipe.author_id).await {
            Ok(user) if !user.deleted => Some(user.name),
            Ok(_) | Err(PortError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        let aggregate = self.aggregator.aggregate(recipe_id).await?;
        Ok(RecipeDetail {
            recipe,
            author_name,
            aggregate,
        })
    }

    /// One page of a recipe's reviews. `Newest` orders by submission time
    /// descending; `MostLiked` by like count descending, then newest. Review
    /// id ascending breaks any remaining tie.
    pub async fn list_reviews(
        &self,
        recipe_id: RecipeId,
        page: i64,
        size: i64,
        sort: ReviewSort,
    ) -> CoreResult<Page<Review>> {
        let request = PageRequest::new(page, size, self.max_page_size)?;
        self.catalog.get_recipe(recipe_id).await?;

        let mut reviews = self.catalog.reviews_for_recipe(recipe_id).await?;
        reviews.sort_by(|a, b| {
            let newest = b
                .submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| a.id.cmp(&b.id));
            match sort {
                ReviewSort::Newest => newest,
                ReviewSort::MostLiked => b.likers.len().cmp(&a.likers.len()).then(newest),
            }
        });
        Ok(Page::from_sorted(reviews, request))
    }

    /// Resolves a user that has not deleted their account.
    pub async fn active_user(&self, user_id: UserId) -> CoreResult<User> {
        let user = self.catalog.get_user(user_id).await?;
        if user.deleted {
            return Err(CoreError::NotFound(format!("User {user_id} not found")));
        }
        Ok(user)
    }

    pub async fn user_profile(&self, user_id: UserId) -> CoreResult<UserProfile> {
        let user = self.active_user(user_id).await?;
        let follower_ids = self.graph.followers_of(user_id).await?;
        let followee_ids = self.graph.followees_of(user_id).await?;
        Ok(UserProfile {
            user,
            followers: follower_ids.len() as u64,
            following: followee_ids.len() as u64,
            follower_ids,
            followee_ids,
        })
    }
}
