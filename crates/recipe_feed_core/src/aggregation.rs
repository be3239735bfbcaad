//! crates/recipe_feed_core/src/aggregation.rs
//!
//! Per-recipe rating, review count and like counts. Nothing here is cached:
//! every value is recomputed from the recipe's current reviews on each read,
//! so it can never drift from them.

use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{Recipe, RecipeId, Review, ReviewId};
use crate::error::{CoreError, CoreResult};
use crate::ports::CatalogStore;

/// Aggregated review state of one recipe.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeAggregate {
    /// Mean of all ratings, `None` while the recipe has no reviews.
    pub average_rating: Option<f64>,
    pub review_count: u64,
    pub like_counts: BTreeMap<ReviewId, u64>,
}

/// A recipe as shown in feed and search listings.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeCard {
    pub recipe: Recipe,
    pub average_rating: Option<f64>,
    pub review_count: u64,
}

/// Mean rating and review count over a set of reviews.
pub fn average_rating<'a, I>(reviews: I) -> (Option<f64>, u64)
where
    I: IntoIterator<Item = &'a Review>,
{
    let (sum, count) = reviews
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), review| {
            (sum + u64::from(review.rating), count + 1)
        });
    if count == 0 {
        (None, 0)
    } else {
        (Some(sum as f64 / count as f64), count)
    }
}

/// Builds the full aggregate from one snapshot of a recipe's reviews.
pub fn summarize(reviews: &[Review]) -> RecipeAggregate {
    let (average_rating, review_count) = average_rating(reviews);
    let like_counts = reviews
        .iter()
        .map(|review| (review.id, review.likers.len() as u64))
        .collect();
    RecipeAggregate {
        average_rating,
        review_count,
        like_counts,
    }
}

#[derive(Clone)]
pub struct Aggregator {
    catalog: Arc<dyn CatalogStore>,
}

impl Aggregator {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    pub async fn aggregate(&self, recipe_id: RecipeId) -> CoreResult<RecipeAggregate> {
        self.catalog.get_recipe(recipe_id).await?;
        let reviews = self.catalog.reviews_for_recipe(recipe_id).await?;
        Ok(summarize(&reviews))
    }

    /// Attaches the current rating summary to each recipe, keeping the order.
    pub async fn cards(&self, recipes: Vec<Recipe>) -> CoreResult<Vec<RecipeCard>> {
        try_join_all(recipes.into_iter().map(|recipe| async move {
            let reviews = self.catalog.reviews_for_recipe(recipe.id).await?;
            let (average_rating, review_count) = average_rating(&reviews);
            Ok::<_, CoreError>(RecipeCard {
                recipe,
                average_rating,
                review_count,
            })
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, publish, register, TestApp};

    #[tokio::test]
    async fn unreviewed_recipe_has_no_rating() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let soup = publish(&app, chef, "Soup", &["water", "salt"], day(0)).await;

        let aggregate = app.core.aggregator.aggregate(soup).await.unwrap();

        assert_eq!(aggregate.average_rating, None);
        assert_eq!(aggregate.review_count, 0);
        assert!(aggregate.like_counts.is_empty());
    }

    #[tokio::test]
    async fn two_reviews_average_their_ratings() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let critic = register(&app, "critic").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;

        app.core.actions.submit_review(critic, soup, 4, "good").await.unwrap();
        app.core.actions.submit_review(critic, soup, 2, "worse the next day").await.unwrap();

        let aggregate = app.core.aggregator.aggregate(soup).await.unwrap();
        assert_eq!(aggregate.average_rating, Some(3.0));
        assert_eq!(aggregate.review_count, 2);
    }

    #[tokio::test]
    async fn like_counts_follow_the_liker_sets() {
        let app = TestApp::new();
        let chef = register(&app, "chef").await;
        let fan = register(&app, "fan").await;
        let other = register(&app, "other").await;
        let soup = publish(&app, chef, "Soup", &["water"], day(0)).await;
        let review = app.core.actions.submit_review(fan, soup, 5, "yum").await.unwrap();

        app.core.actions.toggle_like(chef, review.id).await.unwrap();
        app.core.actions.toggle_like(other, review.id).await.unwrap();

        let aggregate = app.core.aggregator.aggregate(soup).await.unwrap();
        assert_eq!(aggregate.like_counts.get(&review.id), Some(&2));
    }

    #[tokio::test]
    async fn unknown_recipe_is_not_found() {
        let app = TestApp::new();
        let err = app.core.aggregator.aggregate(RecipeId(404)).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
