//! services/api/src/web/auth.rs
//!
//! Account registration. The password is hashed here with Argon2 and only the
//! hash reaches the store; request identity on later calls is resolved by
//! `middleware::require_auth`.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use recipe_feed_core::{CoreError, Gender, NewUser, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub password: String,
    /// `male`, `female` or `unknown`. Defaults to `unknown`.
    pub gender: Option<String>,
    pub age: u32,
}

/// The public part of an account.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub gender: String,
    pub age: u32,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id.0,
            name: user.name,
            gender: user.gender.as_str().to_string(),
            age: user.age,
        }
    }
}

//=========================================================================================
// Credential Hashing
//=========================================================================================

/// Hashes a password into a self-describing PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/users/register - Create a new user account
#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserSummary),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.password.is_empty() {
        return Err(CoreError::InvalidInput("password must not be empty".to_string()).into());
    }
    let gender = match req.gender.as_deref() {
        Some(raw) => raw.parse::<Gender>()?,
        None => Gender::Unknown,
    };
    let credential = hash_password(&req.password)?;

    let user = state
        .core
        .actions
        .register(NewUser {
            name: req.name,
            gender,
            age: req.age,
            credential,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserSummary::from(user))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};

    #[test]
    fn hashes_verify_against_the_original_password() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();

        assert!(Argon2::default()
            .verify_password(b"correct horse", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"battery staple", &parsed)
            .is_err());
    }

    #[test]
    fn the_same_password_gets_a_fresh_salt() {
        assert_ne!(hash_password("pw").unwrap(), hash_password("pw").unwrap());
    }
}
