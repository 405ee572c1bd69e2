use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod bounties;
pub mod misc;
pub mod registry;
pub mod services;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 100;

pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/bounties",
            post(bounties::create).get(bounties::list),
        )
        .route("/api/v1/bounties/open", get(bounties::list_open))
        .route("/api/v1/bounties/{bounty_id}", get(bounties::get_one))
        .route("/api/v1/bounties/{bounty_id}/claim", post(bounties::claim))
        .route(
            "/api/v1/bounties/{bounty_id}/unclaim",
            post(bounties::unclaim),
        )
        .route(
            "/api/v1/bounties/{bounty_id}/match",
            post(bounties::match_bounty),
        )
        .route(
            "/api/v1/bounties/{bounty_id}/fulfill",
            post(bounties::fulfill),
        )
        .route(
            "/api/v1/bounties/{bounty_id}/cancel",
            post(bounties::cancel),
        )
        .route(
            "/api/v1/services",
            post(services::create).get(services::list),
        )
        .route(
            "/api/v1/services/{service_id}",
            get(services::get_one)
                .put(services::update)
                .delete(services::deactivate),
        )
        .route("/api/v1/agents", get(registry::list))
        .route("/api/v1/agents/search", get(registry::search))
        .route("/api/v1/registry/refresh", post(registry::refresh))
        .route("/api/v1/stats", get(misc::stats))
        .route("/health", get(misc::health))
        .route("/api/manifest", get(misc::manifest))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
