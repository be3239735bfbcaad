//! crates/recipe_feed_core/src/memory.rs
//!
//! An in-process store implementing both `GraphStore` and `CatalogStore`.
//! The whole state sits behind a single `RwLock` that each port call takes
//! exactly once, which gives every call the atomicity the ports require.
//! Used by the test suites and for running the service without a database.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

use crate::aggregation::average_rating;
use crate::domain::{
    FollowCounts, NewRecipe, NewReview, NewUser, ProfileUpdate, Recipe, RecipeComplexity,
    RecipeFilter, RecipeId, RecipeSort, Review, ReviewId, ReviewPolicy, User, UserId,
};
use crate::ports::{CatalogStore, GraphStore, PortError, PortResult};
use crate::times::RecipeTimes;

#[derive(Default)]
struct State {
    last_user_id: i64,
    last_recipe_id: i64,
    last_review_id: i64,
    users: BTreeMap<UserId, User>,
    credentials: BTreeMap<UserId, String>,
    /// follower -> followees
    following: BTreeMap<UserId, BTreeSet<UserId>>,
    /// followee -> followers
    followers: BTreeMap<UserId, BTreeSet<UserId>>,
    recipes: BTreeMap<RecipeId, Recipe>,
    reviews: BTreeMap<ReviewId, Review>,
}

impl State {
    fn reviews_of(&self, recipe_id: RecipeId) -> impl Iterator<Item = &Review> {
        self.reviews
            .values()
            .filter(move |review| review.recipe_id == recipe_id)
    }

    fn remove_reviews_where(&mut self, mut predicate: impl FnMut(&Review) -> bool) {
        self.reviews.retain(|_, review| !predicate(review));
    }
}

fn user_not_found(user_id: UserId) -> PortError {
    PortError::NotFound(format!("User {user_id} not found"))
}

fn recipe_not_found(recipe_id: RecipeId) -> PortError {
    PortError::NotFound(format!("Recipe {recipe_id} not found"))
}

fn review_not_found(review_id: ReviewId) -> PortError {
    PortError::NotFound(format!("Review {review_id} not found"))
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

//=========================================================================================
// `GraphStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl GraphStore for InMemoryStore {
    async fn edge_exists(&self, follower: UserId, followee: UserId) -> PortResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .following
            .get(&follower)
            .is_some_and(|followees| followees.contains(&followee)))
    }

    async fn add_edge(&self, follower: UserId, followee: UserId) -> PortResult<bool> {
        let mut state = self.state.write().await;
        for id in [follower, followee] {
            if !state.users.contains_key(&id) {
                return Err(user_not_found(id));
            }
        }
        let inserted = state.following.entry(follower).or_default().insert(followee);
        state.followers.entry(followee).or_default().insert(follower);
        Ok(inserted)
    }

    async fn remove_edge(&self, follower: UserId, followee: UserId) -> PortResult<bool> {
        let mut state = self.state.write().await;
        let removed = state
            .following
            .get_mut(&follower)
            .is_some_and(|followees| followees.remove(&followee));
        if let Some(followers) = state.followers.get_mut(&followee) {
            followers.remove(&follower);
        }
        Ok(removed)
    }

    async fn follower_count(&self, user_id: UserId) -> PortResult<u64> {
        let state = self.state.read().await;
        Ok(state.followers.get(&user_id).map_or(0, |s| s.len() as u64))
    }

    async fn following_count(&self, user_id: UserId) -> PortResult<u64> {
        let state = self.state.read().await;
        Ok(state.following.get(&user_id).map_or(0, |s| s.len() as u64))
    }

    async fn followees_of(&self, user_id: UserId) -> PortResult<BTreeSet<UserId>> {
        let state = self.state.read().await;
        Ok(state.following.get(&user_id).cloned().unwrap_or_default())
    }

    async fn followers_of(&self, user_id: UserId) -> PortResult<BTreeSet<UserId>> {
        let state = self.state.read().await;
        Ok(state.followers.get(&user_id).cloned().unwrap_or_default())
    }

    async fn follow_counts(&self) -> PortResult<Vec<FollowCounts>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|user| !user.deleted)
            .map(|user| FollowCounts {
                user_id: user.id,
                followers: state.followers.get(&user.id).map_or(0, |s| s.len() as u64),
                following: state.following.get(&user.id).map_or(0, |s| s.len() as u64),
            })
            .collect())
    }

    async fn remove_all_edges(&self, user_id: UserId) -> PortResult<u64> {
        let mut state = self.state.write().await;
        let followees = state.following.remove(&user_id).unwrap_or_default();
        let followers = state.followers.remove(&user_id).unwrap_or_default();
        for followee in &followees {
            if let Some(set) = state.followers.get_mut(followee) {
                set.remove(&user_id);
            }
        }
        for follower in &followers {
            if let Some(set) = state.following.get_mut(follower) {
                set.remove(&user_id);
            }
        }
        Ok((followees.len() + followers.len()) as u64)
    }
}

//=========================================================================================
// `CatalogStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut state = self.state.write().await;
        state.last_user_id += 1;
        let user = User {
            id: UserId(state.last_user_id),
            name: new_user.name,
            gender: new_user.gender,
            age: new_user.age,
            deleted: false,
        };
        state.credentials.insert(user.id, new_user.credential);
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: UserId) -> PortResult<User> {
        let state = self.state.read().await;
        state
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| user_not_found(user_id))
    }

    async fn update_user(&self, user_id: UserId, update: &ProfileUpdate) -> PortResult<User> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| user_not_found(user_id))?;
        if let Some(gender) = update.gender {
            user.gender = gender;
        }
        if let Some(age) = update.age {
            user.age = age;
        }
        Ok(user.clone())
    }

    async fn deactivate_user(&self, user_id: UserId) -> PortResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| user_not_found(user_id))?;
        user.deleted = true;
        Ok(())
    }

    async fn delete_user(&self, user_id: UserId) -> PortResult<()> {
        let mut state = self.state.write().await;
        state
            .users
            .remove(&user_id)
            .ok_or_else(|| user_not_found(user_id))?;
        state.credentials.remove(&user_id);
        Ok(())
    }

    async fn create_recipe(&self, author_id: UserId, recipe: NewRecipe) -> PortResult<Recipe> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&author_id) {
            return Err(user_not_found(author_id));
        }
        state.last_recipe_id += 1;
        let created = Recipe {
            id: RecipeId(state.last_recipe_id),
            author_id,
            name: recipe.name,
            category: recipe.category,
            description: recipe.description,
            ingredients: recipe.ingredients,
            calories: recipe.calories,
            times: recipe.times,
            published_at: recipe.published_at.unwrap_or_else(chrono::Utc::now),
        };
        state.recipes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_recipe(&self, recipe_id: RecipeId) -> PortResult<Recipe> {
        let state = self.state.read().await;
        state
            .recipes
            .get(&recipe_id)
            .cloned()
            .ok_or_else(|| recipe_not_found(recipe_id))
    }

    async fn update_recipe_times(
        &self,
        recipe_id: RecipeId,
        update: RecipeTimes,
    ) -> PortResult<Recipe> {
        let mut state = self.state.write().await;
        let recipe = state
            .recipes
            .get_mut(&recipe_id)
            .ok_or_else(|| recipe_not_found(recipe_id))?;
        recipe.times = recipe.times.merged(update);
        Ok(recipe.clone())
    }

    async fn delete_recipe(&self, recipe_id: RecipeId) -> PortResult<()> {
        let mut state = self.state.write().await;
        state
            .recipes
            .remove(&recipe_id)
            .ok_or_else(|| recipe_not_found(recipe_id))?;
        state.remove_reviews_where(|review| review.recipe_id == recipe_id);
        Ok(())
    }

    async fn query_recipes(
        &self,
        filter: &RecipeFilter,
        sort: RecipeSort,
        offset: u64,
        limit: u64,
    ) -> PortResult<(Vec<Recipe>, u64)> {
        let state = self.state.read().await;
        let mut candidates: Vec<(&Recipe, Option<f64>)> = state
            .recipes
            .values()
            .map(|recipe| (recipe, average_rating(state.reviews_of(recipe.id)).0))
            .filter(|(recipe, rating)| filter.matches(recipe, *rating))
            .collect();
        candidates.sort_by(|(a, a_rating), (b, b_rating)| sort.compare(a, *a_rating, b, *b_rating));

        let total = candidates.len() as u64;
        let window = candidates
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|(recipe, _)| recipe.clone())
            .collect();
        Ok((window, total))
    }

    async fn recipe_complexities(&self) -> PortResult<Vec<RecipeComplexity>> {
        let state = self.state.read().await;
        Ok(state
            .recipes
            .values()
            .map(|recipe| RecipeComplexity {
                recipe_id: recipe.id,
                name: recipe.name.clone(),
                ingredient_count: recipe.complexity() as u64,
                published_at: recipe.published_at,
            })
            .collect())
    }

    async fn reviews_for_recipe(&self, recipe_id: RecipeId) -> PortResult<Vec<Review>> {
        let state = self.state.read().await;
        Ok(state.reviews_of(recipe_id).cloned().collect())
    }

    async fn get_review(&self, review_id: ReviewId) -> PortResult<Review> {
        let state = self.state.read().await;
        state
            .reviews
            .get(&review_id)
            .cloned()
            .ok_or_else(|| review_not_found(review_id))
    }

    async fn add_review(&self, review: NewReview, policy: ReviewPolicy) -> PortResult<Review> {
        let mut state = self.state.write().await;
        if !state.recipes.contains_key(&review.recipe_id) {
            return Err(recipe_not_found(review.recipe_id));
        }
        if policy == ReviewPolicy::OnePerRecipe
            && state
                .reviews_of(review.recipe_id)
                .any(|existing| existing.author_id == review.author_id)
        {
            return Err(PortError::Conflict(format!(
                "user {} has already reviewed recipe {}",
                review.author_id, review.recipe_id
            )));
        }
        state.last_review_id += 1;
        let created = Review {
            id: ReviewId(state.last_review_id),
            recipe_id: review.recipe_id,
            author_id: review.author_id,
            rating: review.rating,
            content: review.content,
            submitted_at: review.submitted_at,
            likers: BTreeSet::new(),
        };
        state.reviews.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete_review(&self, review_id: ReviewId) -> PortResult<()> {
        let mut state = self.state.write().await;
        state
            .reviews
            .remove(&review_id)
            .map(|_| ())
            .ok_or_else(|| review_not_found(review_id))
    }

    async fn toggle_like(&self, review_id: ReviewId, user_id: UserId) -> PortResult<bool> {
        let mut state = self.state.write().await;
        let review = state
            .reviews
            .get_mut(&review_id)
            .ok_or_else(|| review_not_found(review_id))?;
        if review.likers.remove(&user_id) {
            Ok(false)
        } else {
            review.likers.insert(user_id);
            Ok(true)
        }
    }

    async fn purge_user_content(&self, user_id: UserId) -> PortResult<()> {
        let mut state = self.state.write().await;
        let owned: BTreeSet<RecipeId> = state
            .recipes
            .values()
            .filter(|recipe| recipe.author_id == user_id)
            .map(|recipe| recipe.id)
            .collect();
        state.recipes.retain(|id, _| !owned.contains(id));
        state.remove_reviews_where(|review| {
            review.author_id == user_id || owned.contains(&review.recipe_id)
        });
        for review in state.reviews.values_mut() {
            review.likers.remove(&user_id);
        }
        Ok(())
    }
}
