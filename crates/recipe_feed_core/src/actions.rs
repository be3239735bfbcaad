//! crates/recipe_feed_core/src/actions.rs
//!
//! Every mutating operation goes through the `ActionCoordinator`. It validates
//! input, checks ownership, and sequences the store writes so that each
//! completed prefix of a composite operation is still a valid state.

use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{
    DeletionPolicy, NewRecipe, NewReview, NewUser, ProfileUpdate, Recipe, RecipeId, Review,
    ReviewId, ReviewPolicy, User, UserId, MAX_RATING, MIN_RATING,
};
use crate::error::{CoreError, CoreResult};
use crate::ports::{CatalogStore, GraphStore};
use crate::times::{CookingTime, RecipeTimes};

/// Edge state after a follow toggle, with counts read back from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowState {
    pub following: bool,
    /// Followers of the followee.
    pub followers: u64,
    /// How many users the caller follows.
    pub following_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub liked: bool,
    pub likes: u64,
}

#[derive(Clone)]
pub struct ActionCoordinator {
    graph: Arc<dyn GraphStore>,
    catalog: Arc<dyn CatalogStore>,
    review_policy: ReviewPolicy,
    deletion_policy: DeletionPolicy,
}

impl ActionCoordinator {
    pub fn new(
        graph: Arc<dyn GraphStore>,
        catalog: Arc<dyn CatalogStore>,
        review_policy: ReviewPolicy,
        deletion_policy: DeletionPolicy,
    ) -> Self {
        Self {
            graph,
            catalog,
            review_policy,
            deletion_policy,
        }
    }

    /// Loads a user that has not been deleted.
    async fn active_user(&self, user_id: UserId) -> CoreResult<User> {
        let user = self.catalog.get_user(user_id).await?;
        if user.deleted {
            return Err(CoreError::NotFound(format!("User {user_id} not found")));
        }
        Ok(user)
    }

    // --- Accounts ---

    /// Registers a new account. `credential` must already be hashed.
    pub async fn register(&self, new_user: NewUser) -> CoreResult<User> {
        let name = new_user.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("name must not be empty".to_string()));
        }
        if new_user.age == 0 {
            return Err(CoreError::InvalidInput("age must be positive".to_string()));
        }
        if new_user.credential.is_empty() {
            return Err(CoreError::InvalidInput("credential must not be empty".to_string()));
        }
        let user = self.catalog.create_user(NewUser { name, ..new_user }).await?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub async fn update_profile(&self, caller: UserId, update: ProfileUpdate) -> CoreResult<User> {
        if update.age == Some(0) {
            return Err(CoreError::InvalidInput("age must be positive".to_string()));
        }
        self.active_user(caller).await?;
        let user = self.catalog.update_user(caller, &update).await?;
        debug!(user_id = %caller, "profile updated");
        Ok(user)
    }

    /// Deletes `user_id`'s account on behalf of `caller`.
    ///
    /// Ownership is checked before existence so a non-owner learns nothing
    /// about the target. Writes run edges first, then content, then the
    /// account itself.
    pub async fn delete_account(&self, caller: UserId, user_id: UserId) -> CoreResult<()> {
        if caller != user_id {
            warn!(%caller, target = %user_id, "rejected account deletion by non-owner");
            return Err(CoreError::Unauthorized(
                "an account can only be deleted by its owner".to_string(),
            ));
        }
        self.active_user(user_id).await?;

        let removed_edges = self.graph.remove_all_edges(user_id).await?;
        match self.deletion_policy {
            DeletionPolicy::Anonymize => {
                self.catalog.deactivate_user(user_id).await?;
            }
            DeletionPolicy::HardDelete => {
                self.catalog.purge_user_content(user_id).await?;
                self.catalog.delete_user(user_id).await?;
            }
        }
        info!(%user_id, removed_edges, policy = ?self.deletion_policy, "account deleted");
        Ok(())
    }

    // --- Follow graph ---

    /// Follows `followee` if the caller does not already, unfollows otherwise.
    pub async fn toggle_follow(&self, caller: UserId, followee: UserId) -> CoreResult<FollowState> {
        if caller == followee {
            return Err(CoreError::InvalidInput("users cannot follow themselves".to_string()));
        }
        self.active_user(caller).await?;
        self.active_user(followee).await?;

        // Both writes are idempotent, so a racing toggle on the same pair
        // settles on one edge state and the derived counts stay exact.
        let following = if self.graph.edge_exists(caller, followee).await? {
            self.graph.remove_edge(caller, followee).await?;
            false
        } else {
            self.graph.add_edge(caller, followee).await?;
            true
        };

        let followers = self.graph.follower_count(followee).await?;
        let following_count = self.graph.following_count(caller).await?;
        info!(%caller, %followee, following, "follow toggled");
        Ok(FollowState {
            following,
            followers,
            following_count,
        })
    }

    // --- Recipes ---

    pub async fn publish_recipe(&self, caller: UserId, recipe: NewRecipe) -> CoreResult<Recipe> {
        self.active_user(caller).await?;

        let name = recipe.name.trim().to_string();
        let category = recipe.category.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("recipe name must not be empty".to_string()));
        }
        if category.is_empty() {
            return Err(CoreError::InvalidInput("recipe category must not be empty".to_string()));
        }
        if let Some(calories) = recipe.calories {
            if !calories.is_finite() || calories < 0.0 {
                return Err(CoreError::InvalidInput(
                    "calories must be a non-negative number".to_string(),
                ));
            }
        }
        let ingredients = normalize_ingredients(recipe.ingredients)?;

        let created = self
            .catalog
            .create_recipe(
                caller,
                NewRecipe {
                    name,
                    category,
                    description: recipe.description.trim().to_string(),
                    ingredients,
                    calories: recipe.calories,
                    times: recipe.times,
                    published_at: Some(recipe.published_at.unwrap_or_else(Utc::now)),
                },
            )
            .await?;
        info!(recipe_id = %created.id, author_id = %caller, "recipe published");
        Ok(created)
    }

    /// Sets the cook and/or prep time of a recipe from ISO-8601 durations. A
    /// part passed as `None` keeps its stored value. Only the author may do
    /// this, and ownership is checked before the input is parsed.
    pub async fn update_times(
        &self,
        caller: UserId,
        recipe_id: RecipeId,
        cook_time: Option<&str>,
        prep_time: Option<&str>,
    ) -> CoreResult<Recipe> {
        let recipe = self.catalog.get_recipe(recipe_id).await?;
        if recipe.author_id != caller {
            warn!(%caller, %recipe_id, "rejected time update by non-author");
            return Err(CoreError::Unauthorized(
                "only the author can change a recipe's times".to_string(),
            ));
        }
        let update = RecipeTimes {
            cook: cook_time.map(str::parse::<CookingTime>).transpose()?,
            prep: prep_time.map(str::parse::<CookingTime>).transpose()?,
        };

        let updated = self.catalog.update_recipe_times(recipe_id, update).await?;
        info!(
            %recipe_id,
            total = %updated.times.total().unwrap_or_default(),
            "recipe times updated"
        );
        Ok(updated)
    }

    pub async fn delete_recipe(&self, caller: UserId, recipe_id: RecipeId) -> CoreResult<()> {
        let recipe = self.catalog.get_recipe(recipe_id).await?;
        if recipe.author_id != caller {
            warn!(%caller, %recipe_id, "rejected recipe deletion by non-author");
            return Err(CoreError::Unauthorized(
                "only the author can delete a recipe".to_string(),
            ));
        }
        self.catalog.delete_recipe(recipe_id).await?;
        info!(%recipe_id, "recipe deleted");
        Ok(())
    }

    // --- Reviews and likes ---

    pub async fn submit_review(
        &self,
        caller: UserId,
        recipe_id: RecipeId,
        rating: i64,
        content: &str,
    ) -> CoreResult<Review> {
        let rating = u8::try_from(rating)
            .ok()
            .filter(|r| (MIN_RATING..=MAX_RATING).contains(r))
            .ok_or_else(|| {
                CoreError::InvalidInput(format!(
                    "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
                ))
            })?;
        self.active_user(caller).await?;
        self.catalog.get_recipe(recipe_id).await?;

        let review = self
            .catalog
            .add_review(
                NewReview {
                    recipe_id,
                    author_id: caller,
                    rating,
                    content: content.trim().to_string(),
                    submitted_at: Utc::now(),
                },
                self.review_policy,
            )
            .await?;
        info!(review_id = %review.id, %recipe_id, rating, "review submitted");
        Ok(review)
    }

    pub async fn delete_review(
        &self,
        caller: UserId,
        recipe_id: RecipeId,
        review_id: ReviewId,
    ) -> CoreResult<()> {
        let review = self.catalog.get_review(review_id).await?;
        if review.author_id != caller {
            return Err(CoreError::Unauthorized(
                "only the author can delete a review".to_string(),
            ));
        }
        if review.recipe_id != recipe_id {
            return Err(CoreError::InvalidInput(format!(
                "review {review_id} does not belong to recipe {recipe_id}"
            )));
        }
        self.catalog.delete_review(review_id).await?;
        info!(%review_id, %recipe_id, "review deleted");
        Ok(())
    }

    /// Likes the review if the caller has not yet, unlikes it otherwise.
    pub async fn toggle_like(&self, caller: UserId, review_id: ReviewId) -> CoreResult<LikeState> {
        self.active_user(caller).await?;
        self.catalog.get_review(review_id).await?;

        let liked = self.catalog.toggle_like(review_id, caller).await?;
        let likes = self.catalog.get_review(review_id).await?.likers.len() as u64;
        debug!(%caller, %review_id, liked, likes, "like toggled");
        Ok(LikeState { liked, likes })
    }
}

/// Trims entries, rejects blanks and drops exact repeats while keeping the
/// order of first appearance.
fn normalize_ingredients(raw: Vec<String>) -> CoreResult<Vec<String>> {
    let mut seen = BTreeSet::new();
    let mut ingredients = Vec::with_capacity(raw.len());
    for entry in raw {
        let entry = entry.trim().to_string();
        if entry.is_empty() {
            return Err(CoreError::InvalidInput("ingredients must not be blank".to_string()));
        }
        if seen.insert(entry.clone()) {
            ingredients.push(entry);
        }
    }
    Ok(ingredients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Gender;
    use crate::test_support::{day, publish, register, TestApp};
    use crate::CoreSettings;
    use proptest::prelude::*;
    use rstest::rstest;

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let app = TestApp::new();
        let me = register(&app, "me").await;

        let err = app.core.actions.toggle_follow(me, me).await.unwrap_err();

        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn following_a_missing_user_is_not_found() {
        let app = TestApp::new();
        let me = register(&app, "me").await;
        let err = app.core.actions.toggle_follow(me, UserId(999)).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn follow_toggle_updates_both_counts() {
        let app = TestApp::new();
        let a = register(&app, "a").await;
        let b = register(&app, "b").await;

        let state = app.core.actions.toggle_follow(a, b).await.unwrap();
        assert_eq!(
            state,
            FollowState {
                following: true,
                followers: 1,
                following_count: 1
            }
        );

        let state = app.core.actions.toggle_follow(a, b).await.unwrap();
        assert_eq!(
            state,
            FollowState {
                following: false,
                followers: 0,
                following_count: 0
            }
        );
    }

    #[rstest]
    #[case::too_low(0)]
    #[case::negative(-1)]
    #[case::too_high(6)]
    #[case::overflow(300)]
    #[tokio::test]
    async fn ratings_outside_the_scale_are_rejected(#[case] rating: i64) {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;

        let err = app
            .core
            .actions
            .submit_review(chef, soup, rating, "?")
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn reviewing_a_missing_recipe_is_not_found() {
        let app = TestApp::new();
        let critic = register(&app, "critic").await;
        let err = app
            .core
            .actions
            .submit_review(critic, RecipeId(42), 3, "where is it")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn one_review_per_recipe_policy_reports_a_conflict() {
        let app = TestApp::with_settings(CoreSettings {
            review_policy: ReviewPolicy::OnePerRecipe,
            ..CoreSettings::default()
        });
        let chef = register(&app, "chef").await;
        let critic = register(&app, "critic").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;

        app.core.actions.submit_review(critic, soup, 4, "first").await.unwrap();
        let err = app
            .core
            .actions
            .submit_review(critic, soup, 2, "second")
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reviews_under_one_per_recipe_store_only_one() {
        let app = TestApp::with_settings(CoreSettings {
            review_policy: ReviewPolicy::OnePerRecipe,
            ..CoreSettings::default()
        });
        let chef = register(&app, "chef").await;
        let critic = register(&app, "critic").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;

        let attempts: Vec<_> = (0..8)
            .map(|i| {
                let actions = app.core.actions.clone();
                tokio::spawn(async move {
                    let content = format!("take {i}");
                    actions.submit_review(critic, soup, 4, &content).await
                })
            })
            .collect();

        let (mut stored, mut conflicts) = (0, 0);
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => stored += 1,
                Err(CoreError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!((stored, conflicts), (1, 7));
        let aggregate = app.core.aggregator.aggregate(soup).await.unwrap();
        assert_eq!(aggregate.review_count, 1);
    }

    #[tokio::test]
    async fn repeated_reviews_are_allowed_by_default() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let critic = register(&app, "critic").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;

        app.core.actions.submit_review(critic, soup, 4, "first").await.unwrap();
        app.core.actions.submit_review(critic, soup, 2, "second").await.unwrap();

        let aggregate = app.core.aggregator.aggregate(soup).await.unwrap();
        assert_eq!(aggregate.review_count, 2);
    }

    #[tokio::test]
    async fn like_toggle_reports_the_count() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let fan = register(&app, "fan").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;
        let review = app.core.actions.submit_review(fan, soup, 5, "yum").await.unwrap();

        let state = app.core.actions.toggle_like(chef, review.id).await.unwrap();
        assert_eq!(state, LikeState { liked: true, likes: 1 });

        let state = app.core.actions.toggle_like(chef, review.id).await.unwrap();
        assert_eq!(state, LikeState { liked: false, likes: 0 });
    }

    #[tokio::test]
    async fn liking_a_missing_review_is_not_found() {
        let app = TestApp::new();
        let fan = register(&app, "fan").await;
        let err = app.core.actions.toggle_like(fan, ReviewId(5)).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn only_the_author_deletes_a_recipe() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let intruder = register(&app, "intruder").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;

        let err = app.core.actions.delete_recipe(intruder, soup).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));

        app.core.actions.delete_recipe(chef, soup).await.unwrap();
        let err = app.core.reader.recipe_detail(soup).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn author_sets_times_and_total_follows() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;

        let recipe = app
            .core
            .actions
            .update_times(chef, soup, Some("PT20M"), Some("PT10M"))
            .await
            .unwrap();
        assert_eq!(recipe.times.total().unwrap().to_string(), "PT30M");

        // Leaving the cook time out keeps the stored one.
        let recipe = app
            .core
            .actions
            .update_times(chef, soup, None, Some("PT1H"))
            .await
            .unwrap();
        assert_eq!(recipe.times.cook.unwrap().to_string(), "PT20M");
        assert_eq!(recipe.times.total().unwrap().to_string(), "PT1H20M");

        let detail = app.core.reader.recipe_detail(soup).await.unwrap();
        assert_eq!(detail.recipe.times, recipe.times);
    }

    #[rstest]
    #[case::malformed(Some("twenty minutes"), None)]
    #[case::negative_cook(Some("-PT5M"), None)]
    #[case::negative_prep(None, Some("PT-1H"))]
    #[tokio::test]
    async fn invalid_times_are_rejected_and_nothing_changes(
        #[case] cook: Option<&str>,
        #[case] prep: Option<&str>,
    ) {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;

        let err = app.core.actions.update_times(chef, soup, cook, prep).await.unwrap_err();

        assert!(matches!(err, CoreError::InvalidInput(_)));
        let detail = app.core.reader.recipe_detail(soup).await.unwrap();
        assert_eq!(detail.recipe.times, RecipeTimes::default());
    }

    #[tokio::test]
    async fn only_the_author_updates_times() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let intruder = register(&app, "intruder").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;

        let err = app
            .core
            .actions
            .update_times(intruder, soup, Some("not a duration"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));

        let err = app
            .core
            .actions
            .update_times(chef, RecipeId(404), Some("PT5M"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_a_recipe_removes_its_reviews() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let critic = register(&app, "critic").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;
        let review = app.core.actions.submit_review(critic, soup, 3, "ok").await.unwrap();

        app.core.actions.delete_recipe(chef, soup).await.unwrap();

        let err = app.core.actions.toggle_like(chef, review.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn review_deletion_checks_recipe_and_author() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let critic = register(&app, "critic").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;
        let stew = publish(&app, chef, "Stew", &["beef"], day(0)).await;
        let review = app.core.actions.submit_review(critic, soup, 3, "ok").await.unwrap();

        let err = app.core.actions.delete_review(critic, stew, review.id).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        let err = app.core.actions.delete_review(chef, soup, review.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));

        // A non-author learns nothing about which recipe the review is on.
        let err = app.core.actions.delete_review(chef, stew, review.id).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));

        app.core.actions.delete_review(critic, soup, review.id).await.unwrap();
        let aggregate = app.core.aggregator.aggregate(soup).await.unwrap();
        assert_eq!(aggregate.review_count, 0);
        assert_eq!(aggregate.average_rating, None);
    }

    #[tokio::test]
    async fn publishing_normalizes_ingredients() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let recipe = app
            .core
            .actions
            .publish_recipe(
                chef,
                NewRecipe {
                    name: "  Salad ".to_string(),
                    category: "Side".to_string(),
                    description: String::new(),
                    ingredients: vec![
                        " Lettuce".to_string(),
                        "lettuce".to_string(),
                        "Oil".to_string(),
                        "Lettuce ".to_string(),
                    ],
                    calories: Some(80.0),
                    times: RecipeTimes::default(),
                    published_at: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(recipe.name, "Salad");
        assert_eq!(recipe.ingredients, vec!["Lettuce", "lettuce", "Oil"]);
        assert_eq!(recipe.complexity(), 3);
    }

    #[rstest]
    #[case::blank_name("  ", "Side", vec!["a"], None)]
    #[case::blank_category("Salad", "", vec!["a"], None)]
    #[case::blank_ingredient("Salad", "Side", vec!["a", " "], None)]
    #[case::negative_calories("Salad", "Side", vec!["a"], Some(-1.0))]
    #[case::nan_calories("Salad", "Side", vec!["a"], Some(f64::NAN))]
    #[tokio::test]
    async fn malformed_recipes_are_rejected(
        #[case] name: &str,
        #[case] category: &str,
        #[case] ingredients: Vec<&str>,
        #[case] calories: Option<f64>,
    ) {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let err = app
            .core
            .actions
            .publish_recipe(
                chef,
                NewRecipe {
                    name: name.to_string(),
                    category: category.to_string(),
                    description: String::new(),
                    ingredients: ingredients.into_iter().map(str::to_string).collect(),
                    calories,
                    times: RecipeTimes::default(),
                    published_at: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn profile_update_changes_only_given_fields() {
        let app = TestApp::new();
        let me = register(&app, "me").await;

        let user = app
            .core
            .actions
            .update_profile(
                me,
                ProfileUpdate {
                    gender: Some(Gender::Female),
                    age: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(user.gender, Gender::Female);
        assert_eq!(user.age, 30);

        let err = app
            .core
            .actions
            .update_profile(me, ProfileUpdate { gender: None, age: Some(0) })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn account_deletion_requires_the_owner() {
        let app = TestApp::new();
        let me = register(&app, "me").await;
        let other = register(&app, "other").await;

        let err = app.core.actions.delete_account(other, me).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));

        // Non-owners cannot tell a missing account from an existing one.
        let err = app.core.actions.delete_account(other, UserId(777)).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn anonymized_account_leaves_the_graph_but_keeps_content() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let fan = register(&app, "fan").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;
        app.core.actions.toggle_follow(fan, chef).await.unwrap();
        app.core.actions.toggle_follow(chef, fan).await.unwrap();

        app.core.actions.delete_account(chef, chef).await.unwrap();

        let profile = app.core.reader.user_profile(fan).await.unwrap();
        assert_eq!((profile.followers, profile.following), (0, 0));
        let feed = app.core.feed.feed(fan, 1, 10, None).await.unwrap();
        assert_eq!(feed.total, 0);

        let detail = app.core.reader.recipe_detail(soup).await.unwrap();
        assert_eq!(detail.author_name, None);

        let err = app.core.actions.delete_account(chef, chef).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        let err = app.core.actions.toggle_follow(fan, chef).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn hard_deleted_account_takes_its_content_along() {
        let app = TestApp::with_settings(CoreSettings {
            deletion_policy: DeletionPolicy::HardDelete,
            ..CoreSettings::default()
        });
        let chef = register(&app, "chef").await;
        let critic = register(&app, "critic").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;
        let stew = publish(&app, critic, "Stew", &["beef"], day(0)).await;
        app.core.actions.submit_review(chef, stew, 5, "great").await.unwrap();
        let critic_review = app.core.actions.submit_review(critic, stew, 3, "mine").await.unwrap();
        app.core.actions.toggle_like(chef, critic_review.id).await.unwrap();

        app.core.actions.delete_account(chef, chef).await.unwrap();

        assert!(matches!(
            app.core.reader.recipe_detail(soup).await.unwrap_err(),
            CoreError::NotFound(_)
        ));
        let aggregate = app.core.aggregator.aggregate(stew).await.unwrap();
        assert_eq!(aggregate.review_count, 1);
        assert_eq!(aggregate.like_counts.get(&critic_review.id), Some(&0));
        assert!(matches!(
            app.core.reader.user_profile(chef).await.unwrap_err(),
            CoreError::NotFound(_)
        ));
    }

    proptest! {
        #[test]
        fn follow_toggle_twice_restores_the_graph(
            initially_following in any::<bool>(),
            background_fans in 0usize..4,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let app = TestApp::new();
                let a = register(&app, "a").await;
                let b = register(&app, "b").await;
                for i in 0..background_fans {
                    let fan = register(&app, &format!("fan{i}")).await;
                    app.core.actions.toggle_follow(fan, b).await.unwrap();
                }
                if initially_following {
                    app.core.actions.toggle_follow(a, b).await.unwrap();
                }
                let before = app.core.reader.user_profile(b).await.unwrap();
                let before_a = app.core.reader.user_profile(a).await.unwrap();

                let first = app.core.actions.toggle_follow(a, b).await.unwrap();
                let second = app.core.actions.toggle_follow(a, b).await.unwrap();

                prop_assert_eq!(first.following, !initially_following);
                prop_assert_eq!(second.following, initially_following);
                let after = app.core.reader.user_profile(b).await.unwrap();
                let after_a = app.core.reader.user_profile(a).await.unwrap();
                prop_assert_eq!(after.followers, before.followers);
                prop_assert_eq!(after.follower_ids, before.follower_ids);
                prop_assert_eq!(after_a.following, before_a.following);
                Ok::<(), TestCaseError>(())
            })?;
        }

        #[test]
        fn like_toggle_twice_restores_the_liker_set(
            other_likers in 0usize..4,
            caller_likes_first in any::<bool>(),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let app = TestApp::new();
                let chef = register(&app, "chef").await;
                let caller = register(&app, "caller").await;
                let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;
                let review = app.core.actions.submit_review(chef, soup, 4, "mine").await.unwrap();
                for i in 0..other_likers {
                    let fan = register(&app, &format!("fan{i}")).await;
                    app.core.actions.toggle_like(fan, review.id).await.unwrap();
                }
                if caller_likes_first {
                    app.core.actions.toggle_like(caller, review.id).await.unwrap();
                }
                let before = app.store.get_review(review.id).await.unwrap().likers;

                app.core.actions.toggle_like(caller, review.id).await.unwrap();
                app.core.actions.toggle_like(caller, review.id).await.unwrap();

                let after = app.store.get_review(review.id).await.unwrap().likers;
                prop_assert_eq!(after, before);
                Ok::<(), TestCaseError>(())
            })?;
        }
    }
}
