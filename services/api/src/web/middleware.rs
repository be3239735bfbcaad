//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use recipe_feed_core::{CoreError, UserId};
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Header carrying the id of the user an upstream proxy has authenticated.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user a request acts on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

/// Middleware that resolves the `x-user-id` header to an active account.
///
/// If valid, inserts a `Caller` into request extensions for handlers to use.
/// If missing, malformed, or naming an unknown or deleted user, returns 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let raw = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated(format!("{USER_ID_HEADER} header is required")))?;

    let user_id = raw
        .trim()
        .parse::<i64>()
        .map(UserId)
        .map_err(|_| ApiError::Unauthenticated(format!("invalid {USER_ID_HEADER} header")))?;

    match state.core.reader.active_user(user_id).await {
        Ok(_) => {}
        Err(CoreError::NotFound(_)) => {
            warn!(%user_id, "request from unknown or deleted user");
            return Err(ApiError::Unauthenticated(format!("unknown user {user_id}")));
        }
        Err(e) => return Err(e.into()),
    }

    req.extensions_mut().insert(Caller(user_id));
    Ok(next.run(req).await)
}
