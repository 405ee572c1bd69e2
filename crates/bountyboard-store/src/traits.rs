use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use bountyboard_types::{
    Bounty, BountyTransition, BountyboardError, Service, ServiceUpdate, TransitionOutcome,
};

use crate::filter::{BountyFilter, BountyStats, ServiceFilter};

/// Persistence seam for bounties and service listings.
///
/// Every mutating operation is all-or-nothing, and lifecycle transitions
/// are conditional updates: the precondition (status, secret) is
/// re-checked at commit time, so two racing claims cannot both succeed.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_bounty(&self, bounty: Bounty) -> Result<(), BountyboardError>;

    async fn get_bounty(&self, id: Uuid) -> Result<Bounty, BountyboardError>;

    /// Newest first, then offset/limit.
    async fn list_bounties(&self, filter: BountyFilter) -> Result<Vec<Bounty>, BountyboardError>;

    /// Apply a lifecycle transition atomically.
    async fn transition_bounty(
        &self,
        id: Uuid,
        transition: BountyTransition,
    ) -> Result<TransitionOutcome, BountyboardError>;

    /// Record an advisory possible-match reference on a bounty. Returns
    /// false (without error) if the bounty is no longer open.
    async fn record_possible_match(
        &self,
        bounty_id: Uuid,
        service_id: Uuid,
    ) -> Result<bool, BountyboardError>;

    /// Cancel open/claimed bounties whose expiry has passed. Returns the
    /// number of bounties cancelled.
    async fn expire_bounties(&self, now: DateTime<Utc>) -> Result<usize, BountyboardError>;

    /// Bounties created by a poster since the given instant, for the
    /// per-poster creation rate limit.
    async fn count_bounties_by_poster_since(
        &self,
        poster_name: &str,
        since: DateTime<Utc>,
    ) -> Result<usize, BountyboardError>;

    async fn bounty_stats(&self) -> Result<BountyStats, BountyboardError>;

    async fn insert_service(&self, service: Service) -> Result<(), BountyboardError>;

    async fn get_service(&self, id: Uuid) -> Result<Service, BountyboardError>;

    async fn list_services(&self, filter: ServiceFilter) -> Result<Vec<Service>, BountyboardError>;

    /// Secret-gated partial update; conflicts once deactivated.
    async fn update_service(
        &self,
        id: Uuid,
        update: ServiceUpdate,
    ) -> Result<Service, BountyboardError>;

    /// Secret-gated soft delete.
    async fn deactivate_service(
        &self,
        id: Uuid,
        agent_secret: &str,
    ) -> Result<(), BountyboardError>;
}
