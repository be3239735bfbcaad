//! crates/recipe_feed_core/src/ports.rs
//!
//! Defines the storage contracts (traits) the engines run against.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! feed, search and ranking logic independent of any concrete database.
//!
//! Every method is expected to be atomic on its own: a reader never observes
//! half of a single call's writes. Composite operations are sequenced by the
//! engines, not by the adapters.

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::domain::{
    FollowCounts, NewRecipe, NewReview, NewUser, ProfileUpdate, Recipe, RecipeComplexity,
    RecipeFilter, RecipeId, RecipeSort, Review, ReviewId, ReviewPolicy, User, UserId,
};
use crate::times::RecipeTimes;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external stores.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflicting write: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

/// The follow graph: a directed edge set indexed by follower.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn edge_exists(&self, follower: UserId, followee: UserId) -> PortResult<bool>;

    /// Inserts the edge. Returns `false` when it was already present.
    async fn add_edge(&self, follower: UserId, followee: UserId) -> PortResult<bool>;

    /// Removes the edge. Returns `false` when it was not present.
    async fn remove_edge(&self, follower: UserId, followee: UserId) -> PortResult<bool>;

    async fn follower_count(&self, user_id: UserId) -> PortResult<u64>;

    async fn following_count(&self, user_id: UserId) -> PortResult<u64>;

    /// Users that `user_id` follows.
    async fn followees_of(&self, user_id: UserId) -> PortResult<BTreeSet<UserId>>;

    /// Users following `user_id`.
    async fn followers_of(&self, user_id: UserId) -> PortResult<BTreeSet<UserId>>;

    /// Counts for every active user, taken from one snapshot of the graph.
    async fn follow_counts(&self) -> PortResult<Vec<FollowCounts>>;

    /// Drops every edge touching `user_id`, in both directions.
    async fn remove_all_edges(&self, user_id: UserId) -> PortResult<u64>;
}

/// Users, recipes, reviews and likes.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // --- Users ---
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    /// Returns deactivated users too; callers decide how to treat `deleted`.
    async fn get_user(&self, user_id: UserId) -> PortResult<User>;

    async fn update_user(&self, user_id: UserId, update: &ProfileUpdate) -> PortResult<User>;

    async fn deactivate_user(&self, user_id: UserId) -> PortResult<()>;

    async fn delete_user(&self, user_id: UserId) -> PortResult<()>;

    // --- Recipes ---
    async fn create_recipe(&self, author_id: UserId, recipe: NewRecipe) -> PortResult<Recipe>;

    async fn get_recipe(&self, recipe_id: RecipeId) -> PortResult<Recipe>;

    /// Overlays `update` on the stored cook and prep times in one atomic step
    /// and returns the updated recipe.
    async fn update_recipe_times(
        &self,
        recipe_id: RecipeId,
        update: RecipeTimes,
    ) -> PortResult<Recipe>;

    /// Removes the recipe along with its reviews and their likes.
    async fn delete_recipe(&self, recipe_id: RecipeId) -> PortResult<()>;

    /// Lists recipes matching `filter` in `sort` order, returning one window
    /// and the size of the full candidate set.
    async fn query_recipes(
        &self,
        filter: &RecipeFilter,
        sort: RecipeSort,
        offset: u64,
        limit: u64,
    ) -> PortResult<(Vec<Recipe>, u64)>;

    async fn recipe_complexities(&self) -> PortResult<Vec<RecipeComplexity>>;

    // --- Reviews and Likes ---

    /// All reviews of a recipe, likers included, from a single snapshot.
    /// Returns an empty list for an unknown recipe.
    async fn reviews_for_recipe(&self, recipe_id: RecipeId) -> PortResult<Vec<Review>>;

    async fn get_review(&self, review_id: ReviewId) -> PortResult<Review>;

    /// Stores a review. Under `ReviewPolicy::OnePerRecipe` the check for an
    /// earlier review by the same author happens in the same atomic step as
    /// the insert and fails with `PortError::Conflict`.
    async fn add_review(&self, review: NewReview, policy: ReviewPolicy) -> PortResult<Review>;

    async fn delete_review(&self, review_id: ReviewId) -> PortResult<()>;

    /// Flips `user_id`'s membership in the review's liker set and returns
    /// whether the user likes the review afterwards.
    async fn toggle_like(&self, review_id: ReviewId, user_id: UserId) -> PortResult<bool>;

    // --- Account cascade ---

    /// Removes the user's recipes (with their reviews), reviews and likes.
    async fn purge_user_content(&self, user_id: UserId) -> PortResult<()>;
}
