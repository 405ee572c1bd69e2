use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use bountyboard_types::{
    Bounty, BountyStatus, BountyTransition, BountyboardError, PossibleMatch, Service,
    ServiceUpdate, TransitionOutcome,
};

use crate::filter::{BountyFilter, BountyStats, ServiceFilter};
use crate::traits::Store;

/// In-memory store (default). Transitions run while holding the dashmap
/// entry lock, which serializes concurrent updates to a single bounty.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    bounties: Arc<DashMap<Uuid, Bounty>>,
    services: Arc<DashMap<Uuid, Service>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn bounty_matches(bounty: &Bounty, filter: &BountyFilter) -> bool {
    if let Some(status) = filter.status {
        if bounty.status != status {
            return false;
        }
    }
    if let Some(category) = filter.category {
        if bounty.category != category {
            return false;
        }
    }
    if let Some(min) = filter.min_budget {
        if bounty.budget < min {
            return false;
        }
    }
    if let Some(max) = filter.max_budget {
        if bounty.budget > max {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let hit = contains_ci(&bounty.title, &needle)
            || contains_ci(&bounty.description, &needle)
            || bounty.tags.iter().any(|t| t.contains(&needle));
        if !hit {
            return false;
        }
    }
    true
}

fn service_matches(service: &Service, filter: &ServiceFilter) -> bool {
    if !filter.include_inactive && !service.active {
        return false;
    }
    if let Some(category) = filter.category {
        if service.category != category {
            return false;
        }
    }
    if let Some(min) = filter.min_price {
        if service.price < min {
            return false;
        }
    }
    if let Some(max) = filter.max_price {
        if service.price > max {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let hit = contains_ci(&service.name, &needle)
            || contains_ci(&service.description, &needle)
            || service.tags.iter().any(|t| t.contains(&needle));
        if !hit {
            return false;
        }
    }
    true
}

fn paginate<T>(mut items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    if offset >= items.len() {
        return Vec::new();
    }
    items.drain(..offset);
    if limit > 0 {
        items.truncate(limit);
    }
    items
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_bounty(&self, bounty: Bounty) -> Result<(), BountyboardError> {
        self.bounties.insert(bounty.id, bounty);
        Ok(())
    }

    async fn get_bounty(&self, id: Uuid) -> Result<Bounty, BountyboardError> {
        self.bounties
            .get(&id)
            .map(|b| b.clone())
            .ok_or(BountyboardError::BountyNotFound(id))
    }

    async fn list_bounties(&self, filter: BountyFilter) -> Result<Vec<Bounty>, BountyboardError> {
        let mut results: Vec<Bounty> = self
            .bounties
            .iter()
            .filter(|entry| bounty_matches(entry.value(), &filter))
            .map(|entry| entry.value().clone())
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(results, filter.offset, filter.limit))
    }

    async fn transition_bounty(
        &self,
        id: Uuid,
        transition: BountyTransition,
    ) -> Result<TransitionOutcome, BountyboardError> {
        let mut entry = self
            .bounties
            .get_mut(&id)
            .ok_or(BountyboardError::BountyNotFound(id))?;
        let secret = entry.apply(transition, Utc::now())?;
        Ok(TransitionOutcome {
            bounty: entry.clone(),
            secret,
        })
    }

    async fn record_possible_match(
        &self,
        bounty_id: Uuid,
        service_id: Uuid,
    ) -> Result<bool, BountyboardError> {
        let mut entry = self
            .bounties
            .get_mut(&bounty_id)
            .ok_or(BountyboardError::BountyNotFound(bounty_id))?;
        if entry.status != BountyStatus::Open {
            return Ok(false);
        }
        if entry.possible_matches.iter().any(|m| m.service_id == service_id) {
            return Ok(true);
        }
        entry.possible_matches.push(PossibleMatch {
            service_id,
            recorded_at: Utc::now(),
        });
        Ok(true)
    }

    async fn expire_bounties(&self, now: DateTime<Utc>) -> Result<usize, BountyboardError> {
        let mut expired = 0usize;
        for mut entry in self.bounties.iter_mut() {
            let due = matches!(entry.status, BountyStatus::Open | BountyStatus::Claimed)
                && entry.expires_at.is_some_and(|at| at <= now);
            if due {
                entry.status = BountyStatus::Cancelled;
                entry.updated_at = now;
                expired += 1;
                tracing::info!(bounty_id = %entry.id, title = %entry.title, "expired bounty cancelled");
            }
        }
        Ok(expired)
    }

    async fn count_bounties_by_poster_since(
        &self,
        poster_name: &str,
        since: DateTime<Utc>,
    ) -> Result<usize, BountyboardError> {
        Ok(self
            .bounties
            .iter()
            .filter(|b| b.poster_name == poster_name && b.created_at >= since)
            .count())
    }

    async fn bounty_stats(&self) -> Result<BountyStats, BountyboardError> {
        let mut stats = BountyStats::default();
        for entry in self.bounties.iter() {
            stats.total_bounties += 1;
            match entry.status {
                BountyStatus::Open => stats.open_bounties += 1,
                BountyStatus::Matched => stats.matched_bounties += 1,
                BountyStatus::Fulfilled => stats.fulfilled_bounties += 1,
                _ => {}
            }
        }
        Ok(stats)
    }

    async fn insert_service(&self, service: Service) -> Result<(), BountyboardError> {
        self.services.insert(service.id, service);
        Ok(())
    }

    async fn get_service(&self, id: Uuid) -> Result<Service, BountyboardError> {
        self.services
            .get(&id)
            .map(|s| s.clone())
            .ok_or(BountyboardError::ServiceNotFound(id))
    }

    async fn list_services(&self, filter: ServiceFilter) -> Result<Vec<Service>, BountyboardError> {
        let mut results: Vec<Service> = self
            .services
            .iter()
            .filter(|entry| service_matches(entry.value(), &filter))
            .map(|entry| entry.value().clone())
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(results, filter.offset, filter.limit))
    }

    async fn update_service(
        &self,
        id: Uuid,
        update: ServiceUpdate,
    ) -> Result<Service, BountyboardError> {
        let mut entry = self
            .services
            .get_mut(&id)
            .ok_or(BountyboardError::ServiceNotFound(id))?;
        entry.apply_update(update, Utc::now())?;
        Ok(entry.clone())
    }

    async fn deactivate_service(
        &self,
        id: Uuid,
        agent_secret: &str,
    ) -> Result<(), BountyboardError> {
        let mut entry = self
            .services
            .get_mut(&id)
            .ok_or(BountyboardError::ServiceNotFound(id))?;
        entry.deactivate(agent_secret, Utc::now())
    }
}
