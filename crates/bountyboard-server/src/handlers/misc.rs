use axum::extract::State;
use axum::Json;
use chrono::Utc;

use bountyboard_registry::CacheFreshness;
use bountyboard_store::BountyStats;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn stats(State(state): State<AppState>) -> Result<Json<BountyStats>, ApiError> {
    Ok(Json(state.store.bounty_stats().await?))
}

/// Liveness plus a coarse registry-cache freshness signal. The endpoint
/// itself never triggers a registry fetch.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store_ok = state.store.bounty_stats().await.is_ok();
    let (freshness, fetched_at) = state.registry.freshness().await;

    let status = match (store_ok, freshness) {
        (false, _) => "degraded",
        (true, CacheFreshness::Fresh) => "healthy",
        (true, CacheFreshness::Empty | CacheFreshness::Stale) => "warning",
    };

    Json(serde_json::json!({
        "status": status,
        "store": if store_ok { "ok" } else { "error" },
        "registry_cache": freshness,
        "registry_fetched_at": fetched_at,
        "timestamp": Utc::now(),
    }))
}

/// Machine-readable description of the API, for agent clients that
/// discover capabilities before calling.
pub async fn manifest() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "bountyboard",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Two-sided bounty marketplace: post bounties, list services, match and fulfill.",
        "auth": "Secret tokens are issued on creation (poster_secret, claimer_secret, agent_secret) and must be presented on mutating calls. They are shown exactly once.",
        "endpoints": [
            { "method": "POST", "path": "/api/v1/bounties", "summary": "Post a bounty; returns poster_secret" },
            { "method": "GET", "path": "/api/v1/bounties", "summary": "List bounties with filters" },
            { "method": "GET", "path": "/api/v1/bounties/open", "summary": "List open bounties" },
            { "method": "GET", "path": "/api/v1/bounties/{bounty_id}", "summary": "Fetch one bounty" },
            { "method": "POST", "path": "/api/v1/bounties/{bounty_id}/claim", "summary": "Claim an open bounty; returns claimer_secret" },
            { "method": "POST", "path": "/api/v1/bounties/{bounty_id}/unclaim", "summary": "Release a claim (claimer_secret)" },
            { "method": "POST", "path": "/api/v1/bounties/{bounty_id}/match", "summary": "Record an external match (poster_secret)" },
            { "method": "POST", "path": "/api/v1/bounties/{bounty_id}/fulfill", "summary": "Mark fulfilled (poster_secret)" },
            { "method": "POST", "path": "/api/v1/bounties/{bounty_id}/cancel", "summary": "Cancel (poster_secret)" },
            { "method": "POST", "path": "/api/v1/services", "summary": "List a service; returns agent_secret" },
            { "method": "GET", "path": "/api/v1/services", "summary": "Browse service listings" },
            { "method": "GET", "path": "/api/v1/services/{service_id}", "summary": "Fetch one listing" },
            { "method": "PUT", "path": "/api/v1/services/{service_id}", "summary": "Update a listing (agent_secret)" },
            { "method": "DELETE", "path": "/api/v1/services/{service_id}", "summary": "Deactivate a listing (agent_secret)" },
            { "method": "GET", "path": "/api/v1/agents", "summary": "Cached external registry agents" },
            { "method": "GET", "path": "/api/v1/agents/search", "summary": "Search the cached registry" },
            { "method": "POST", "path": "/api/v1/registry/refresh", "summary": "Force a registry refresh" },
            { "method": "GET", "path": "/api/v1/stats", "summary": "Bounty counters" },
            { "method": "GET", "path": "/health", "summary": "Liveness and cache freshness" },
        ],
    }))
}
