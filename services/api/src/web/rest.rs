//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, the liveness check,
//! and the payload types shared by several resources.

use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use recipe_feed_core::{CookingTime, Page, RecipeCard};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::error::ErrorBody;
use crate::web::{auth, recipes, reviews, users};

/// Page number used when a listing request does not name one.
pub const DEFAULT_PAGE: i64 = 1;
/// Page size used when a listing request does not name one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        users::profile_handler,
        users::update_profile_handler,
        users::delete_account_handler,
        users::toggle_follow_handler,
        users::feed_handler,
        users::highest_follow_ratio_handler,
        recipes::search_handler,
        recipes::recipe_detail_handler,
        recipes::publish_recipe_handler,
        recipes::update_times_handler,
        recipes::delete_recipe_handler,
        recipes::most_complex_handler,
        reviews::list_reviews_handler,
        reviews::submit_review_handler,
        reviews::delete_review_handler,
        reviews::toggle_like_handler,
    ),
    components(
        schemas(ErrorBody, HealthResponse, RecipeCardResponse, RecipePage)
    ),
    tags(
        (name = "Recipe Feed API", description = "Follow cooks, publish and review recipes, browse feeds and leaderboards.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Payload Structs
//=========================================================================================

/// A recipe as listed in feeds and search results.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeCardResponse {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub calories: Option<f64>,
    /// ISO-8601 durations, e.g. `PT1H30M`.
    pub cook_time: Option<String>,
    pub prep_time: Option<String>,
    /// Cook plus prep time.
    pub total_time: Option<String>,
    pub published_at: DateTime<Utc>,
    /// Mean review rating, absent while the recipe has no reviews.
    pub average_rating: Option<f64>,
    pub review_count: u64,
}

impl From<RecipeCard> for RecipeCardResponse {
    fn from(card: RecipeCard) -> Self {
        let recipe = card.recipe;
        Self {
            id: recipe.id.0,
            author_id: recipe.author_id.0,
            name: recipe.name,
            category: recipe.category,
            description: recipe.description,
            ingredients: recipe.ingredients,
            calories: recipe.calories,
            cook_time: iso_duration(recipe.times.cook),
            prep_time: iso_duration(recipe.times.prep),
            total_time: iso_duration(recipe.times.total()),
            published_at: recipe.published_at,
            average_rating: card.average_rating,
            review_count: card.review_count,
        }
    }
}

pub(crate) fn iso_duration(time: Option<CookingTime>) -> Option<String> {
    time.map(|t| t.to_string())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipePage {
    pub items: Vec<RecipeCardResponse>,
    /// Size of the whole result set, not just this page.
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl From<Page<RecipeCard>> for RecipePage {
    fn from(page: Page<RecipeCard>) -> Self {
        let page = page.map(RecipeCardResponse::from);
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            size: page.size,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "The service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    let body = HealthResponse {
        status: "ok".to_string(),
    };
    (StatusCode::OK, Json(body))
}
