use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use bountyboard_matching::{MatchCandidate, find_candidates};
use bountyboard_store::{BountyFilter, ServiceFilter};
use bountyboard_types::{
    BountyStatus, Category, NewService, SecretToken, Service, ServiceUpdate,
};

use crate::error::ApiError;
use crate::handlers::clamp_limit;
use crate::state::AppState;

#[derive(serde::Serialize)]
pub struct ServicePostResponse {
    pub service: Service,
    pub agent_secret: SecretToken,
    /// Advisory: open bounties this listing could fulfill right now.
    pub matching_bounties: Vec<MatchCandidate>,
    pub message: String,
}

#[derive(serde::Serialize)]
pub struct ServiceListResponse {
    pub services: Vec<Service>,
    pub count: usize,
}

#[derive(serde::Deserialize)]
pub struct ListQuery {
    pub category: Option<Category>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewService>,
) -> Result<(StatusCode, Json<ServicePostResponse>), ApiError> {
    let (service, agent_secret) = Service::create(input)?;
    state.store.insert_service(service.clone()).await?;
    tracing::info!(service_id = %service.id, name = %service.name, "service listed");

    // Scan open bounties in the same category and leave advisory
    // possible-match references behind. Bounties stay open.
    let open = state
        .store
        .list_bounties(BountyFilter {
            status: Some(BountyStatus::Open),
            category: Some(service.category),
            ..Default::default()
        })
        .await?;
    let matching_bounties = find_candidates(&service, &open);
    for candidate in &matching_bounties {
        // A bounty may have left the open state since the listing; the
        // store just reports that instead of failing the request.
        state
            .store
            .record_possible_match(candidate.bounty_id, service.id)
            .await?;
    }

    let mut message =
        "Service listed! Save your agent_secret; it is required to update this listing.".to_string();
    if !matching_bounties.is_empty() {
        message.push_str(&format!(
            " {} open bounty(ies) look compatible with this listing.",
            matching_bounties.len()
        ));
    }

    Ok((
        StatusCode::CREATED,
        Json(ServicePostResponse {
            service,
            agent_secret,
            matching_bounties,
            message,
        }),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ServiceListResponse>, ApiError> {
    let services = state
        .store
        .list_services(ServiceFilter {
            category: query.category,
            min_price: query.min_price,
            max_price: query.max_price,
            search: query.search,
            include_inactive: query.include_inactive,
            limit: clamp_limit(query.limit),
            offset: query.offset,
        })
        .await?;
    let count = services.len();
    Ok(Json(ServiceListResponse { services, count }))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<Service>, ApiError> {
    Ok(Json(state.store.get_service(service_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
    Json(update): Json<ServiceUpdate>,
) -> Result<Json<Service>, ApiError> {
    let service = state.store.update_service(service_id, update).await?;
    Ok(Json(service))
}

#[derive(serde::Deserialize)]
pub struct DeactivateRequest {
    pub agent_secret: String,
}

pub async fn deactivate(
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
    Json(request): Json<DeactivateRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .deactivate_service(service_id, &request.agent_secret)
        .await?;
    tracing::info!(service_id = %service_id, "service deactivated");
    Ok(Json(serde_json::json!({
        "service_id": service_id,
        "message": "Service deactivated.",
    })))
}
