//! API layer - HTTP handlers and routing
//!
//! This module contains the HTTP endpoints of the trailpost back office.
//! It includes:
//! - Content API endpoints (read, create, edit)
//! - Moderation API endpoints (workflow table, controls, transitions)

pub mod content;
pub mod middleware;
pub mod moderation;
pub mod responses;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

/// Build the main API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .route("/moderation/table", get(moderation::get_workflow_table))
        .route("/{kind}", post(content::create_content))
        .route(
            "/{kind}/{id}",
            get(content::get_content).put(content::update_content),
        )
        .route("/{kind}/{id}/moderation", get(moderation::get_moderation))
        .route("/{kind}/{id}/transition", post(moderation::transition_content))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(e) => tracing::warn!("Ignoring invalid CORS origin {:?}: {}", cors_origin, e),
    }

    Router::new()
        .nest("/api/v1", build_api_router())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_identity,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
