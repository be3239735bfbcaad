//! services/api/src/web/mod.rs
//!
//! The HTTP surface. `router` assembles every route so the binary and the
//! integration tests serve exactly the same application.

pub mod auth;
pub mod middleware;
pub mod recipes;
pub mod rest;
pub mod reviews;
pub mod state;
pub mod users;

use axum::{
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use middleware::{require_auth, Caller, USER_ID_HEADER};
pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the complete application: API routes, Swagger UI, CORS and request tracing.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/api/users/register", post(auth::register_handler))
        .route("/api/users/{id}", get(users::profile_handler))
        .route(
            "/api/users/stats/highest-follow-ratio",
            get(users::highest_follow_ratio_handler),
        )
        .route("/api/recipes/search", get(recipes::search_handler))
        .route("/api/recipes/stats/most-complex", get(recipes::most_complex_handler))
        .route("/api/recipes/{id}", get(recipes::recipe_detail_handler))
        .route("/api/recipes/{id}/reviews", get(reviews::list_reviews_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/users/profile", put(users::update_profile_handler))
        .route("/api/users/{id}", delete(users::delete_account_handler))
        .route("/api/users/follow/{id}", post(users::toggle_follow_handler))
        .route("/api/users/feed", get(users::feed_handler))
        .route("/api/recipes", post(recipes::publish_recipe_handler))
        .route("/api/recipes/{id}", delete(recipes::delete_recipe_handler))
        .route("/api/recipes/{id}/times", put(recipes::update_times_handler))
        .route("/api/recipes/{id}/reviews", post(reviews::submit_review_handler))
        .route(
            "/api/recipes/{id}/reviews/{review_id}",
            delete(reviews::delete_review_handler),
        )
        .route("/api/reviews/{id}/like", post(reviews::toggle_like_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let cors = cors_layer(&app_state.config.cors_origin);

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)]);
    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!(origin, "ignoring unparsable CORS origin");
            cors
        }
    }
}
