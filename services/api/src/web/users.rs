//! services/api/src/web/users.rs
//!
//! Handlers under `/api/users`: profiles, account deletion, the follow graph,
//! the personal feed and the follower-ratio leaderboard.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use recipe_feed_core::{FollowState, FollowerRatio, Gender, ProfileUpdate, UserId, UserProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ErrorBody};
use crate::web::auth::UserSummary;
use crate::web::middleware::Caller;
use crate::web::rest::{RecipePage, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub id: i64,
    pub name: String,
    pub gender: String,
    pub age: u32,
    pub followers: u64,
    pub following: u64,
    pub follower_ids: Vec<i64>,
    pub followee_ids: Vec<i64>,
}

impl From<UserProfile> for UserProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.user.id.0,
            name: profile.user.name,
            gender: profile.user.gender.as_str().to_string(),
            age: profile.user.age,
            followers: profile.followers,
            following: profile.following,
            follower_ids: profile.follower_ids.into_iter().map(|id| id.0).collect(),
            followee_ids: profile.followee_ids.into_iter().map(|id| id.0).collect(),
        }
    }
}

/// Fields left out are not changed.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfileUpdateRequest {
    pub gender: Option<String>,
    pub age: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FollowResponse {
    /// Whether the caller follows the target after the toggle.
    pub following: bool,
    /// The target's follower count.
    pub followers: u64,
    /// How many users the caller follows.
    pub following_count: u64,
}

impl From<FollowState> for FollowResponse {
    fn from(state: FollowState) -> Self {
        Self {
            following: state.following,
            followers: state.followers,
            following_count: state.following_count,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    /// Only recipes in this category.
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FollowerRatioResponse {
    pub user_id: i64,
    pub name: String,
    pub followers: u64,
    pub following: u64,
    pub ratio: f64,
}

impl From<FollowerRatio> for FollowerRatioResponse {
    fn from(best: FollowerRatio) -> Self {
        Self {
            user_id: best.user_id.0,
            name: best.name,
            followers: best.followers,
            following: best.following,
            ratio: best.ratio,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Public profile of an active user.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "The user id.")),
    responses(
        (status = 200, description = "The user's profile", body = UserProfileResponse),
        (status = 404, description = "No such active user", body = ErrorBody)
    )
)]
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state.core.reader.user_profile(UserId(id)).await?;
    Ok(Json(UserProfileResponse::from(profile)))
}

/// Changes the caller's gender and/or age.
#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = ProfileUpdateRequest,
    params(("x-user-id" = i64, Header, description = "The authenticated user.")),
    responses(
        (status = 200, description = "The updated account", body = UserSummary),
        (status = 400, description = "Invalid gender or age", body = ErrorBody),
        (status = 401, description = "Missing or unknown caller", body = ErrorBody)
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let gender = req
        .gender
        .as_deref()
        .map(str::parse::<Gender>)
        .transpose()?;
    let user = state
        .core
        .actions
        .update_profile(
            caller,
            ProfileUpdate {
                gender,
                age: req.age,
            },
        )
        .await?;
    Ok(Json(UserSummary::from(user)))
}

/// Deletes an account. Only the owner may do this.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id" = i64, Path, description = "The account to delete."),
        ("x-user-id" = i64, Header, description = "The authenticated user.")
    ),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Missing or unknown caller", body = ErrorBody),
        (status = 403, description = "Caller does not own the account", body = ErrorBody)
    )
)]
pub async fn delete_account_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.core.actions.delete_account(caller, UserId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Follows the user if the caller does not already, unfollows otherwise.
#[utoipa::path(
    post,
    path = "/api/users/follow/{id}",
    params(
        ("id" = i64, Path, description = "The user to follow or unfollow."),
        ("x-user-id" = i64, Header, description = "The authenticated user.")
    ),
    responses(
        (status = 200, description = "Edge state after the toggle", body = FollowResponse),
        (status = 400, description = "Attempt to follow oneself", body = ErrorBody),
        (status = 404, description = "No such active user", body = ErrorBody)
    )
)]
pub async fn toggle_follow_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let follow = state.core.actions.toggle_follow(caller, UserId(id)).await?;
    Ok(Json(FollowResponse::from(follow)))
}

/// Recipes published by the users the caller follows, newest first.
#[utoipa::path(
    get,
    path = "/api/users/feed",
    params(
        FeedParams,
        ("x-user-id" = i64, Header, description = "The authenticated user.")
    ),
    responses(
        (status = 200, description = "One page of the feed", body = RecipePage),
        (status = 400, description = "Invalid page bounds", body = ErrorBody)
    )
)]
pub async fn feed_handler(
    State(state): State<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Query(params): Query<FeedParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .core
        .feed
        .feed(
            caller,
            params.page.unwrap_or(DEFAULT_PAGE),
            params.size.unwrap_or(DEFAULT_PAGE_SIZE),
            params.category.as_deref(),
        )
        .await?;
    Ok(Json(RecipePage::from(page)))
}

/// The user with the highest followers-to-following ratio, or `null` when no
/// user follows anyone.
#[utoipa::path(
    get,
    path = "/api/users/stats/highest-follow-ratio",
    responses(
        (status = 200, description = "The leading user, or null", body = FollowerRatioResponse)
    )
)]
pub async fn highest_follow_ratio_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let best = state.core.ranking.highest_follower_ratio().await?;
    Ok(Json(best.map(FollowerRatioResponse::from)))
}
