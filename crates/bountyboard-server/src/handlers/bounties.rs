use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use uuid::Uuid;

use bountyboard_registry::{RegistryAgent, search_agents};
use bountyboard_store::BountyFilter;
use bountyboard_types::{
    Bounty, BountyStatus, BountyTransition, BountyboardError, Category, NewBounty, SecretToken,
    callback_url_is_allowed,
};

use crate::error::ApiError;
use crate::handlers::clamp_limit;
use crate::state::AppState;

const REGISTRY_MATCH_LIMIT: usize = 5;

#[derive(serde::Serialize)]
pub struct BountyPostResponse {
    pub bounty: Bounty,
    pub poster_secret: SecretToken,
    /// Advisory: external agents that already look like a fit.
    pub registry_matches: Vec<RegistryAgent>,
    pub message: String,
}

#[derive(serde::Serialize)]
pub struct BountyListResponse {
    pub bounties: Vec<Bounty>,
    pub count: usize,
}

#[derive(serde::Serialize)]
pub struct BountyClaimResponse {
    pub bounty_id: Uuid,
    pub claimed_by: String,
    pub claimer_secret: SecretToken,
    pub message: String,
}

#[derive(serde::Deserialize)]
pub struct ListQuery {
    pub status: Option<BountyStatus>,
    pub category: Option<Category>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,
    pub search: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

fn check_callback_url(url: Option<&str>) -> Result<(), ApiError> {
    if let Some(url) = url {
        if !callback_url_is_allowed(url) {
            return Err(BountyboardError::Validation(
                "invalid callback URL: private/internal addresses are not allowed".into(),
            )
            .into());
        }
    }
    Ok(())
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewBounty>,
) -> Result<(StatusCode, Json<BountyPostResponse>), ApiError> {
    check_callback_url(input.poster_callback_url.as_deref())?;

    // Advisory limit: the count and the insert below are not
    // serialized, so racing creates by one poster can overshoot the
    // cap by a request or two.
    let one_hour_ago = Utc::now() - Duration::hours(1);
    let recent = state
        .store
        .count_bounties_by_poster_since(&input.poster_name, one_hour_ago)
        .await?;
    if recent >= state.config.max_bounties_per_hour {
        return Err(BountyboardError::RateLimited(format!(
            "{} has created {recent} bounties in the last hour (max {})",
            input.poster_name, state.config.max_bounties_per_hour
        ))
        .into());
    }

    let (bounty, poster_secret) = Bounty::create(input)?;
    state.store.insert_bounty(bounty.clone()).await?;
    tracing::info!(bounty_id = %bounty.id, title = %bounty.title, "bounty created");

    // Advisory registry lookup against whatever snapshot is already
    // cached; creation never waits on a remote fetch.
    let registry_matches = match state.registry.peek().await {
        Some(snapshot) => {
            let query = format!("{} {}", bounty.title, bounty.tags.join(" "));
            search_agents(&snapshot.agents, &query, REGISTRY_MATCH_LIMIT)
                .into_iter()
                .cloned()
                .collect()
        }
        None => Vec::new(),
    };

    let mut message =
        "Bounty posted! Save your poster_secret; it is required to manage this bounty.".to_string();
    if !registry_matches.is_empty() {
        message.push_str(&format!(
            " Found {} registry agent(s) that may already offer this.",
            registry_matches.len()
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(BountyPostResponse {
            bounty,
            poster_secret,
            registry_matches,
            message,
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<BountyListResponse>, ApiError> {
    let bounties = state
        .store
        .list_bounties(BountyFilter {
            status: query.status,
            category: query.category,
            min_budget: query.min_budget,
            max_budget: query.max_budget,
            search: query.search,
            limit: clamp_limit(query.limit),
            offset: query.offset,
        })
        .await?;
    let count = bounties.len();
    Ok(Json(BountyListResponse { bounties, count }))
}

pub async fn list_open(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<BountyListResponse>, ApiError> {
    let bounties = state
        .store
        .list_bounties(BountyFilter {
            status: Some(BountyStatus::Open),
            category: query.category,
            min_budget: query.min_budget,
            max_budget: query.max_budget,
            search: query.search,
            limit: clamp_limit(query.limit),
            offset: query.offset,
        })
        .await?;
    let count = bounties.len();
    Ok(Json(BountyListResponse { bounties, count }))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(bounty_id): Path<Uuid>,
) -> Result<Json<Bounty>, ApiError> {
    Ok(Json(state.store.get_bounty(bounty_id).await?))
}

#[derive(serde::Deserialize)]
pub struct ClaimRequest {
    pub claimer_name: String,
    #[serde(default)]
    pub claimer_callback_url: Option<String>,
}

pub async fn claim(
    State(state): State<AppState>,
    Path(bounty_id): Path<Uuid>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<BountyClaimResponse>, ApiError> {
    check_callback_url(request.claimer_callback_url.as_deref())?;

    let outcome = state
        .store
        .transition_bounty(
            bounty_id,
            BountyTransition::Claim {
                claimer_name: request.claimer_name,
                claimer_callback_url: request.claimer_callback_url,
            },
        )
        .await?;
    let bounty = outcome.bounty;
    let claimer_secret = outcome
        .secret
        .ok_or_else(|| BountyboardError::Internal("claim produced no secret".into()))?;

    tracing::info!(bounty_id = %bounty.id, claimed_by = ?bounty.claimed_by, "bounty claimed");
    state
        .webhooks
        .notify(bounty.poster_callback_url.as_deref(), "bounty.claimed", &bounty);

    Ok(Json(BountyClaimResponse {
        bounty_id: bounty.id,
        claimed_by: bounty.claimed_by.clone().unwrap_or_default(),
        claimer_secret,
        message: "Bounty claimed! Save your claimer_secret; it is required to unclaim.".into(),
    }))
}

#[derive(serde::Deserialize)]
pub struct UnclaimRequest {
    pub claimer_secret: String,
}

pub async fn unclaim(
    State(state): State<AppState>,
    Path(bounty_id): Path<Uuid>,
    Json(request): Json<UnclaimRequest>,
) -> Result<Json<Bounty>, ApiError> {
    let outcome = state
        .store
        .transition_bounty(
            bounty_id,
            BountyTransition::Unclaim {
                claimer_secret: request.claimer_secret,
            },
        )
        .await?;
    state.webhooks.notify(
        outcome.bounty.poster_callback_url.as_deref(),
        "bounty.unclaimed",
        &outcome.bounty,
    );
    Ok(Json(outcome.bounty))
}

#[derive(serde::Deserialize)]
pub struct MatchRequest {
    pub poster_secret: String,
    pub agent_id: String,
    #[serde(default)]
    pub service_id: Option<Uuid>,
    #[serde(default)]
    pub job: Option<String>,
}

pub async fn match_bounty(
    State(state): State<AppState>,
    Path(bounty_id): Path<Uuid>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<Bounty>, ApiError> {
    let outcome = state
        .store
        .transition_bounty(
            bounty_id,
            BountyTransition::Match {
                poster_secret: request.poster_secret,
                service_id: request.service_id,
                agent_id: request.agent_id,
                job: request.job,
            },
        )
        .await?;
    state.webhooks.notify(
        outcome.bounty.poster_callback_url.as_deref(),
        "bounty.matched",
        &outcome.bounty,
    );
    Ok(Json(outcome.bounty))
}

#[derive(serde::Deserialize)]
pub struct FulfillRequest {
    pub poster_secret: String,
    #[serde(default)]
    pub job_id: Option<String>,
}

pub async fn fulfill(
    State(state): State<AppState>,
    Path(bounty_id): Path<Uuid>,
    Json(request): Json<FulfillRequest>,
) -> Result<Json<Bounty>, ApiError> {
    let outcome = state
        .store
        .transition_bounty(
            bounty_id,
            BountyTransition::Fulfill {
                poster_secret: request.poster_secret,
                job_id: request.job_id,
            },
        )
        .await?;
    let bounty = outcome.bounty;
    tracing::info!(bounty_id = %bounty.id, "bounty fulfilled");
    state
        .webhooks
        .notify(bounty.poster_callback_url.as_deref(), "bounty.fulfilled", &bounty);
    state
        .webhooks
        .notify(bounty.claimer_callback_url.as_deref(), "bounty.fulfilled", &bounty);
    Ok(Json(bounty))
}

#[derive(serde::Deserialize)]
pub struct CancelRequest {
    pub poster_secret: String,
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(bounty_id): Path<Uuid>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<Bounty>, ApiError> {
    let outcome = state
        .store
        .transition_bounty(
            bounty_id,
            BountyTransition::Cancel {
                poster_secret: request.poster_secret,
            },
        )
        .await?;
    tracing::info!(bounty_id = %outcome.bounty.id, "bounty cancelled");
    Ok(Json(outcome.bounty))
}
