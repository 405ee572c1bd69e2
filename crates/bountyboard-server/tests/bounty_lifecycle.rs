use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use bountyboard_registry::{RegistryAgent, RegistryFetcher};
use bountyboard_server::config::ServerConfig;
use bountyboard_server::handlers;
use bountyboard_server::state::AppState;
use bountyboard_store::InMemoryStore;
use bountyboard_types::BountyboardError;

/// Registry stub that can be flipped into failure mode mid-test.
struct StubFetcher {
    failing: AtomicBool,
}

impl StubFetcher {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            failing: AtomicBool::new(false),
        })
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RegistryFetcher for StubFetcher {
    async fn fetch_agents(&self) -> Result<Vec<RegistryAgent>, BountyboardError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BountyboardError::RegistryUnavailable("stub down".into()));
        }
        Ok(vec![
            RegistryAgent {
                id: "agent-design".into(),
                name: "PixelSmith".into(),
                description: "logo and brand design".into(),
                category: "design".into(),
                online: true,
                capabilities: vec!["logo-design".into()],
            },
            RegistryAgent {
                id: "agent-trade".into(),
                name: "AlphaTrader".into(),
                description: "trading signals".into(),
                category: "finance".into(),
                online: false,
                capabilities: vec!["trading-signals".into()],
            },
        ])
    }
}

fn app() -> (Router, Arc<StubFetcher>) {
    let fetcher = StubFetcher::new();
    let state = AppState::with_parts(
        ServerConfig::default(),
        Arc::new(InMemoryStore::new()),
        fetcher.clone(),
    );
    (handlers::router(state), fetcher)
}

async fn request(app: &Router, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn new_bounty(title: &str) -> Value {
    json!({
        "poster_name": "poster",
        "title": title,
        "description": "design a logo for my project",
        "budget": 50.0,
        "category": "digital",
        "tags": ["design", "logo"],
    })
}

#[tokio::test]
async fn test_full_lifecycle_create_claim_fulfill() {
    let (app, _) = app();

    let (status, posted) =
        request(&app, "POST", "/api/v1/bounties", Some(new_bounty("Need logo"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let bounty_id = posted["bounty"]["id"].as_str().unwrap().to_string();
    let poster_secret = posted["poster_secret"].as_str().unwrap().to_string();
    assert_eq!(posted["bounty"]["status"], "open");
    // Secret hashes never leak through serialization.
    assert!(posted["bounty"].get("poster_secret_hash").is_none());

    let (status, claimed) = request(
        &app,
        "POST",
        &format!("/api/v1/bounties/{bounty_id}/claim"),
        Some(json!({ "claimer_name": "worker" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claimed["claimed_by"], "worker");
    assert!(claimed["claimer_secret"].as_str().unwrap().len() >= 32);

    // Wrong poster secret is unauthorized, not a conflict.
    let (status, err) = request(
        &app,
        "POST",
        &format!("/api/v1/bounties/{bounty_id}/fulfill"),
        Some(json!({ "poster_secret": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["code"], "INVALID_SECRET");

    let (status, fulfilled) = request(
        &app,
        "POST",
        &format!("/api/v1/bounties/{bounty_id}/fulfill"),
        Some(json!({ "poster_secret": poster_secret, "job_id": "job-7" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fulfilled["status"], "fulfilled");
    assert_eq!(fulfilled["job_id"], "job-7");

    // Terminal states admit nothing further.
    let (status, err) = request(
        &app,
        "POST",
        &format!("/api/v1/bounties/{bounty_id}/cancel"),
        Some(json!({ "poster_secret": poster_secret })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], "INVALID_STATUS");
}

#[tokio::test]
async fn test_second_claim_conflicts_until_unclaimed() {
    let (app, _) = app();
    let (_, posted) =
        request(&app, "POST", "/api/v1/bounties", Some(new_bounty("Exclusive"))).await;
    let bounty_id = posted["bounty"]["id"].as_str().unwrap().to_string();
    let claim_path = format!("/api/v1/bounties/{bounty_id}/claim");

    let (status, first) =
        request(&app, "POST", &claim_path, Some(json!({ "claimer_name": "alice" }))).await;
    assert_eq!(status, StatusCode::OK);
    let claimer_secret = first["claimer_secret"].as_str().unwrap().to_string();

    let (status, err) =
        request(&app, "POST", &claim_path, Some(json!({ "claimer_name": "bob" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], "INVALID_STATUS");

    let (status, released) = request(
        &app,
        "POST",
        &format!("/api/v1/bounties/{bounty_id}/unclaim"),
        Some(json!({ "claimer_secret": claimer_secret })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(released["status"], "open");

    let (status, _) =
        request(&app, "POST", &claim_path, Some(json!({ "claimer_name": "bob" }))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_bounty_is_404() {
    let (app, _) = app();
    let (status, err) = request(
        &app,
        "GET",
        &format!("/api/v1/bounties/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], "BOUNTY_NOT_FOUND");
}

#[tokio::test]
async fn test_private_callback_url_rejected() {
    let (app, _) = app();
    let mut body = new_bounty("SSRF attempt");
    body["poster_callback_url"] = json!("http://169.254.169.254/latest/meta-data");
    let (status, err) = request(&app, "POST", "/api/v1/bounties", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_poster_rate_limit() {
    let (app, _) = app();
    for i in 0..5 {
        let (status, _) = request(
            &app,
            "POST",
            "/api/v1/bounties",
            Some(new_bounty(&format!("bounty {i}"))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, err) =
        request(&app, "POST", "/api/v1/bounties", Some(new_bounty("one too many"))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(err["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn test_create_surfaces_registry_matches_from_warm_cache() {
    let (app, _) = app();
    // Warm the cache; creation only consults what is already cached.
    let (status, _) = request(&app, "POST", "/api/v1/registry/refresh", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, posted) =
        request(&app, "POST", "/api/v1/bounties", Some(new_bounty("Need logo"))).await;
    assert_eq!(status, StatusCode::CREATED);
    // Title and tag words hit the design agent's category and offerings.
    let matches = posted["registry_matches"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["name"], "PixelSmith");
}

#[tokio::test]
async fn test_create_with_cold_cache_returns_no_registry_matches() {
    let (app, _) = app();
    let (status, posted) =
        request(&app, "POST", "/api/v1/bounties", Some(new_bounty("Need logo"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(posted["registry_matches"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_service_listing_records_advisory_matches() {
    let (app, _) = app();
    let (_, posted) =
        request(&app, "POST", "/api/v1/bounties", Some(new_bounty("Need logo"))).await;
    let bounty_id = posted["bounty"]["id"].as_str().unwrap().to_string();

    let (status, listed) = request(
        &app,
        "POST",
        "/api/v1/services",
        Some(json!({
            "agent_name": "PixelSmith",
            "name": "Logo design",
            "description": "clean vector logos",
            "price": 40.0,
            "category": "digital",
            "tags": ["design"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(listed["agent_secret"].as_str().is_some());
    let candidates = listed["matching_bounties"].as_array().unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0]["bounty_id"], bounty_id.as_str());

    // Advisory only: the bounty stays open and carries the reference.
    let (_, bounty) =
        request(&app, "GET", &format!("/api/v1/bounties/{bounty_id}"), None).await;
    assert_eq!(bounty["status"], "open");
    assert_eq!(bounty["possible_matches"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_service_update_and_deactivate_are_secret_gated() {
    let (app, _) = app();
    let (_, listed) = request(
        &app,
        "POST",
        "/api/v1/services",
        Some(json!({
            "agent_name": "PixelSmith",
            "name": "Logo design",
            "description": "clean vector logos",
            "price": 40.0,
            "category": "digital",
        })),
    )
    .await;
    let service_id = listed["service"]["id"].as_str().unwrap().to_string();
    let agent_secret = listed["agent_secret"].as_str().unwrap().to_string();
    let path = format!("/api/v1/services/{service_id}");

    let (status, _) = request(
        &app,
        "PUT",
        &path,
        Some(json!({ "agent_secret": "wrong", "price": 60.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = request(
        &app,
        "PUT",
        &path,
        Some(json!({ "agent_secret": agent_secret, "price": 60.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 60.0);

    let (status, _) = request(
        &app,
        "DELETE",
        &path,
        Some(json!({ "agent_secret": agent_secret })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Deactivated listings reject further updates.
    let (status, err) = request(
        &app,
        "PUT",
        &path,
        Some(json!({ "agent_secret": agent_secret, "price": 70.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], "SERVICE_DEACTIVATED");
}

#[tokio::test]
async fn test_registry_endpoints_and_degradation() {
    let (app, fetcher) = app();

    let (status, agents) = request(&app, "GET", "/api/v1/agents", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(agents["total_count"], 2);
    assert_eq!(agents["degraded"], false);

    let (status, hits) = request(&app, "GET", "/api/v1/agents/search?q=trading", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits["agents"][0]["name"], "AlphaTrader");

    // A forced refresh while the upstream is down serves the last good
    // snapshot, flagged degraded.
    fetcher.set_failing(true);
    let (status, refreshed) = request(&app, "POST", "/api/v1/registry/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["degraded"], true);
    assert_eq!(refreshed["agent_count"], 2);
}

#[tokio::test]
async fn test_registry_unavailable_with_empty_cache() {
    let (app, fetcher) = app();
    fetcher.set_failing(true);
    let (status, err) = request(&app, "GET", "/api/v1/agents", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err["code"], "REGISTRY_UNAVAILABLE");
}

#[tokio::test]
async fn test_health_and_stats() {
    let (app, _) = app();

    // Nothing fetched yet: alive, but the cache is cold.
    let (status, health) = request(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "warning");
    assert_eq!(health["registry_cache"], "empty");

    request(&app, "POST", "/api/v1/registry/refresh", None).await;
    let (_, health) = request(&app, "GET", "/health", None).await;
    assert_eq!(health["status"], "healthy");

    request(&app, "POST", "/api/v1/bounties", Some(new_bounty("counted"))).await;
    let (status, stats) = request(&app, "GET", "/api/v1/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_bounties"], 1);
    assert_eq!(stats["open_bounties"], 1);

    let (status, manifest) = request(&app, "GET", "/api/manifest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(manifest["name"], "bountyboard");
}
