//! services/api/src/web/reviews.rs
//!
//! Review listing, submission and deletion under a recipe, plus review likes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use recipe_feed_core::{LikeState, Page, RecipeId, Review, ReviewId, ReviewSort};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ErrorBody};
use crate::web::middleware::Caller;
use crate::web::rest::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReviewListParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    /// `date_desc` (default) or `likes_desc`.
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitReviewRequest {
    /// Integer from 1 to 5.
    pub rating: i64,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub id: i64,
    pub recipe_id: i64,
    pub author_id: i64,
    pub rating: u8,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
    pub likes: u64,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id.0,
            recipe_id: review.recipe_id.0,
            author_id: review.author_id.0,
            rating: review.rating,
            content: review.content,
            submitted_at: review.submitted_at,
            likes: review.likers.len() as u64,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewPage {
    pub items: Vec<ReviewResponse>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl From<Page<Review>> for ReviewPage {
    fn from(page: Page<Review>) -> Self {
        let page = page.map(ReviewResponse::from);
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            size: page.size,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    /// Whether the caller likes the review after the toggle.
    pub liked: bool,
    pub likes: u64,
}

impl From<LikeState> for LikeResponse {
    fn from(state: LikeState) -> Self {
        Self {
            liked: state.liked,
            likes: state.likes,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/reviews",
    params(
        ("id" = i64, Path, description = "The recipe id."),
        ReviewListParams
    ),
    responses(
        (status = 200, description = "One page of reviews", body = ReviewPage),
        (status = 400, description = "Invalid sort key or page bounds", body = ErrorBody),
        (status = 404, description = "No such recipe", body = ErrorBody)
    )
)]
pub async fn list_reviews_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<ReviewListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let sort = match params.sort.as_deref().map(str::trim) {
        None | Some("") => ReviewSort::default(),
        Some(key) => key.parse()?,
    };
    let page = state
        .core
        .reader
        .list_reviews(
            RecipeId(id),
            params.page.unwrap_or(DEFAULT_PAGE),
            params.size.unwrap_or(DEFAULT_PAGE_SIZE),
            sort,
        )
        .await?;
    Ok(Json(ReviewPage::from(page)))
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/reviews",
    request_body = SubmitReviewRequest,
    params(
        ("id" = i64, Path, description = "The recipe id."),
        ("x-user-id" = i64, Header, description = "The authenticated user.")
    ),
    responses(
        (status = 201, description = "Review stored", body = ReviewResponse),
        (status = 400, description = "Rating out of range", body = ErrorBody),
        (status = 404, description = "No such recipe", body = ErrorBody),
        (status = 409, description = "Caller already reviewed this recipe", body = ErrorBody)
    )
)]
pub async fn submit_review_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<i64>,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let review = state
        .core
        .actions
        .submit_review(caller, RecipeId(id), req.rating, &req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/reviews/{review_id}",
    params(
        ("id" = i64, Path, description = "The recipe id."),
        ("review_id" = i64, Path, description = "The review id."),
        ("x-user-id" = i64, Header, description = "The authenticated user.")
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Caller is not the author", body = ErrorBody),
        (status = 404, description = "No such review", body = ErrorBody)
    )
)]
pub async fn delete_review_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Path((id, review_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .core
        .actions
        .delete_review(caller, RecipeId(id), ReviewId(review_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Likes the review if the caller has not yet, unlikes it otherwise.
#[utoipa::path(
    post,
    path = "/api/reviews/{id}/like",
    params(
        ("id" = i64, Path, description = "The review id."),
        ("x-user-id" = i64, Header, description = "The authenticated user.")
    ),
    responses(
        (status = 200, description = "Like state after the toggle", body = LikeResponse),
        (status = 404, description = "No such review", body = ErrorBody)
    )
)]
pub async fn toggle_like_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let like = state.core.actions.toggle_like(caller, ReviewId(id)).await?;
    Ok(Json(LikeResponse::from(like)))
}
