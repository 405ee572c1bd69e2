use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};

use bountyboard_registry::{RegistryAgent, list_agents, search_agents};

use crate::error::ApiError;
use crate::handlers::clamp_limit;
use crate::state::AppState;

#[derive(serde::Serialize)]
pub struct AgentListResponse {
    pub agents: Vec<RegistryAgent>,
    pub total_count: usize,
    pub fetched_at: DateTime<Utc>,
    /// True when this is a stale snapshot served because a refresh failed.
    pub degraded: bool,
}

#[derive(serde::Deserialize)]
pub struct ListAgentsQuery {
    pub category: Option<String>,
    #[serde(default)]
    pub online_only: bool,
    pub limit: Option<usize>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListAgentsQuery>,
) -> Result<Json<AgentListResponse>, ApiError> {
    let snapshot = state.registry.get(false).await?;
    let agents: Vec<RegistryAgent> = list_agents(
        &snapshot.agents,
        query.category.as_deref(),
        query.online_only,
        clamp_limit(query.limit),
    )
    .into_iter()
    .cloned()
    .collect();
    Ok(Json(AgentListResponse {
        total_count: snapshot.agents.len(),
        fetched_at: snapshot.fetched_at,
        degraded: snapshot.degraded,
        agents,
    }))
}

#[derive(serde::Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub limit: Option<usize>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<AgentListResponse>, ApiError> {
    let snapshot = state.registry.get(false).await?;
    let agents: Vec<RegistryAgent> =
        search_agents(&snapshot.agents, &query.q, clamp_limit(query.limit))
            .into_iter()
            .cloned()
            .collect();
    Ok(Json(AgentListResponse {
        total_count: agents.len(),
        fetched_at: snapshot.fetched_at,
        degraded: snapshot.degraded,
        agents,
    }))
}

pub async fn refresh(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = state.registry.get(true).await?;
    tracing::info!(agents = snapshot.agents.len(), "registry refreshed on demand");
    Ok(Json(serde_json::json!({
        "agent_count": snapshot.agents.len(),
        "fetched_at": snapshot.fetched_at,
        "degraded": snapshot.degraded,
    })))
}
