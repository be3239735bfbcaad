//! services/api/src/web/recipes.rs
//!
//! Handlers under `/api/recipes`: search, detail, publishing, deletion and the
//! complexity leaderboard.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use recipe_feed_core::{
    CookingTime, NewRecipe, Recipe, RecipeComplexity, RecipeDetail, RecipeId, RecipeTimes,
    SearchQuery,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ErrorBody};
use crate::web::middleware::Caller;
use crate::web::rest::{iso_duration, RecipePage, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring of the name or description.
    pub keyword: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Minimum average rating, between 1 and 5.
    pub min_rating: Option<f64>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    /// `date_desc` (default), `rating_desc` or `calories_asc`.
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishRecipeRequest {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub ingredients: Vec<String>,
    pub calories: Option<f64>,
    /// ISO-8601 duration, e.g. `PT45M`.
    pub cook_time: Option<String>,
    pub prep_time: Option<String>,
    /// Defaults to the time of the request.
    pub published_at: Option<DateTime<Utc>>,
}

/// Parts left out keep their current value.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTimesRequest {
    /// ISO-8601 duration, e.g. `PT1H30M`.
    pub cook_time: Option<String>,
    pub prep_time: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub calories: Option<f64>,
    pub cook_time: Option<String>,
    pub prep_time: Option<String>,
    pub total_time: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl From<Recipe> for RecipeResponse {
    fn from(recipe: Recipe) -> Self {
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
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewLikes {
    pub review_id: i64,
    pub likes: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecipeDetailResponse {
    #[serde(flatten)]
    pub recipe: RecipeResponse,
    /// Absent once the author's account is deleted.
    pub author_name: Option<String>,
    pub average_rating: Option<f64>,
    pub review_count: u64,
    pub review_likes: Vec<ReviewLikes>,
}

impl From<RecipeDetail> for RecipeDetailResponse {
    fn from(detail: RecipeDetail) -> Self {
        Self {
            recipe: RecipeResponse::from(detail.recipe),
            author_name: detail.author_name,
            average_rating: detail.aggregate.average_rating,
            review_count: detail.aggregate.review_count,
            review_likes: detail
                .aggregate
                .like_counts
                .into_iter()
                .map(|(review_id, likes)| ReviewLikes {
                    review_id: review_id.0,
                    likes,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComplexRecipeResponse {
    pub id: i64,
    pub name: String,
    pub ingredient_count: u64,
    pub published_at: DateTime<Utc>,
}

impl From<RecipeComplexity> for ComplexRecipeResponse {
    fn from(recipe: RecipeComplexity) -> Self {
        Self {
            id: recipe.recipe_id.0,
            name: recipe.name,
            ingredient_count: recipe.ingredient_count,
            published_at: recipe.published_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Searches the whole catalog.
#[utoipa::path(
    get,
    path = "/api/recipes/search",
    params(SearchParams),
    responses(
        (status = 200, description = "One page of matching recipes", body = RecipePage),
        (status = 400, description = "Invalid sort key, rating or page bounds", body = ErrorBody)
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = SearchQuery {
        keyword: params.keyword,
        category: params.category,
        min_rating: params.min_rating,
        sort: params.sort,
    };
    let page = state
        .core
        .search
        .search(
            query,
            params.page.unwrap_or(DEFAULT_PAGE),
            params.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(Json(RecipePage::from(page)))
}

/// A recipe with its author and current rating summary.
#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    params(("id" = i64, Path, description = "The recipe id.")),
    responses(
        (status = 200, description = "The recipe", body = RecipeDetailResponse),
        (status = 404, description = "No such recipe", body = ErrorBody)
    )
)]
pub async fn recipe_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.core.reader.recipe_detail(RecipeId(id)).await?;
    Ok(Json(RecipeDetailResponse::from(detail)))
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = PublishRecipeRequest,
    params(("x-user-id" = i64, Header, description = "The authenticated user.")),
    responses(
        (status = 201, description = "Recipe published", body = RecipeResponse),
        (status = 400, description = "Invalid recipe", body = ErrorBody),
        (status = 401, description = "Missing or unknown caller", body = ErrorBody)
    )
)]
pub async fn publish_recipe_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Json(req): Json<PublishRecipeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let times = RecipeTimes {
        cook: req.cook_time.as_deref().map(str::parse::<CookingTime>).transpose()?,
        prep: req.prep_time.as_deref().map(str::parse::<CookingTime>).transpose()?,
    };
    let recipe = state
        .core
        .actions
        .publish_recipe(
            caller,
            NewRecipe {
                name: req.name,
                category: req.category,
                description: req.description,
                ingredients: req.ingredients,
                calories: req.calories,
                times,
                published_at: req.published_at,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(RecipeResponse::from(recipe))))
}

/// Sets the cook and/or prep time. Only the author may do this.
#[utoipa::path(
    put,
    path = "/api/recipes/{id}/times",
    request_body = UpdateTimesRequest,
    params(
        ("id" = i64, Path, description = "The recipe id."),
        ("x-user-id" = i64, Header, description = "The authenticated user.")
    ),
    responses(
        (status = 200, description = "The recipe with its new times", body = RecipeResponse),
        (status = 400, description = "Malformed or negative duration", body = ErrorBody),
        (status = 403, description = "Caller is not the author", body = ErrorBody),
        (status = 404, description = "No such recipe", body = ErrorBody)
    )
)]
pub async fn update_times_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTimesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = state
        .core
        .actions
        .update_times(
            caller,
            RecipeId(id),
            req.cook_time.as_deref(),
            req.prep_time.as_deref(),
        )
        .await?;
    Ok(Json(RecipeResponse::from(recipe)))
}

/// Deletes a recipe together with its reviews. Only the author may do this.
#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    params(
        ("id" = i64, Path, description = "The recipe id."),
        ("x-user-id" = i64, Header, description = "The authenticated user.")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 403, description = "Caller is not the author", body = ErrorBody),
        (status = 404, description = "No such recipe", body = ErrorBody)
    )
)]
pub async fn delete_recipe_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.core.actions.delete_recipe(caller, RecipeId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The three recipes with the most ingredients.
#[utoipa::path(
    get,
    path = "/api/recipes/stats/most-complex",
    responses(
        (status = 200, description = "Up to three recipes", body = [ComplexRecipeResponse])
    )
)]
pub async fn most_complex_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let top = state.core.ranking.most_complex_recipes().await?;
    let body: Vec<ComplexRecipeResponse> = top.into_iter().map(ComplexRecipeResponse::from).collect();
    Ok(Json(body))
}
