use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use bountyboard_types::BountyboardError;

use crate::agent::RegistryAgent;
use crate::breaker::CircuitBreaker;
use crate::fetcher::RegistryFetcher;

/// A point-in-time copy of the external agent directory.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub agents: Vec<RegistryAgent>,
    pub fetched_at: DateTime<Utc>,
    /// Set when this snapshot is older than the TTL and the refresh that
    /// should have replaced it failed.
    pub degraded: bool,
}

impl RegistrySnapshot {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or_default()
    }
}

/// Freshness summary for health reporting, without triggering a fetch.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheFreshness {
    Empty,
    Fresh,
    Stale,
}

/// In-process TTL cache over the external agent directory.
///
/// One instance is owned by the application state and injected into
/// handlers. Refreshes are single-flight: the `refresh_gate` admits one
/// fetch at a time, and waiters re-check the snapshot after acquiring
/// it so they observe either the prior snapshot or the refreshed one.
pub struct RegistryCache {
    fetcher: Arc<dyn RegistryFetcher>,
    ttl: Duration,
    snapshot: RwLock<Option<RegistrySnapshot>>,
    refresh_gate: Mutex<()>,
    breaker: std::sync::Mutex<CircuitBreaker>,
}

impl RegistryCache {
    pub fn new(fetcher: Arc<dyn RegistryFetcher>, ttl: Duration, breaker: CircuitBreaker) -> Self {
        Self {
            fetcher,
            ttl,
            snapshot: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            breaker: std::sync::Mutex::new(breaker),
        }
    }

    fn is_fresh(&self, snapshot: &RegistrySnapshot) -> bool {
        snapshot.age(Utc::now()) < self.ttl
    }

    /// Whatever snapshot is currently cached, fresh or not, without
    /// triggering a refresh.
    pub async fn peek(&self) -> Option<RegistrySnapshot> {
        self.snapshot.read().await.as_ref().cloned()
    }

    /// Current snapshot freshness without touching the network.
    pub async fn freshness(&self) -> (CacheFreshness, Option<DateTime<Utc>>) {
        match self.snapshot.read().await.as_ref() {
            None => (CacheFreshness::Empty, None),
            Some(s) if self.is_fresh(s) => (CacheFreshness::Fresh, Some(s.fetched_at)),
            Some(s) => (CacheFreshness::Stale, Some(s.fetched_at)),
        }
    }

    /// Get the directory snapshot, refreshing when empty, stale, or
    /// forced. A failed refresh falls back to the last good snapshot
    /// flagged degraded; with no snapshot at all the failure surfaces
    /// as `RegistryUnavailable`.
    pub async fn get(&self, force_refresh: bool) -> Result<RegistrySnapshot, BountyboardError> {
        if !force_refresh {
            if let Some(snapshot) = self.snapshot.read().await.as_ref() {
                if self.is_fresh(snapshot) {
                    return Ok(snapshot.clone());
                }
            }
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited on the gate.
        if !force_refresh {
            if let Some(snapshot) = self.snapshot.read().await.as_ref() {
                if self.is_fresh(snapshot) {
                    return Ok(snapshot.clone());
                }
            }
        }

        let allowed = self.breaker.lock().expect("breaker lock").can_execute();
        if !allowed {
            return self
                .fallback("circuit breaker open")
                .await
                .ok_or_else(|| {
                    BountyboardError::RegistryUnavailable("circuit breaker open".into())
                });
        }

        match self.fetcher.fetch_agents().await {
            Ok(agents) => {
                self.breaker.lock().expect("breaker lock").record_success();
                let snapshot = RegistrySnapshot {
                    agents,
                    fetched_at: Utc::now(),
                    degraded: false,
                };
                *self.snapshot.write().await = Some(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                self.breaker.lock().expect("breaker lock").record_failure();
                tracing::warn!(error = %e, "registry refresh failed");
                self.fallback("fetch failed")
                    .await
                    .ok_or(e)
            }
        }
    }

    async fn fallback(&self, reason: &str) -> Option<RegistrySnapshot> {
        let snapshot = self.snapshot.read().await.as_ref().cloned()?;
        tracing::warn!(
            reason,
            fetched_at = %snapshot.fetched_at,
            "serving stale registry snapshot"
        );
        Some(RegistrySnapshot {
            degraded: true,
            ..snapshot
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedFetcher {
        calls: AtomicU32,
        fail_from: u32,
    }

    impl ScriptedFetcher {
        fn new(fail_from: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_from,
            }
        }
    }

    #[async_trait]
    impl RegistryFetcher for ScriptedFetcher {
        async fn fetch_agents(&self) -> Result<Vec<RegistryAgent>, BountyboardError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call >= self.fail_from {
                return Err(BountyboardError::RegistryUnavailable("scripted".into()));
            }
            Ok(vec![RegistryAgent {
                id: format!("agent-{call}"),
                name: "TradingDesk".into(),
                description: "quant".into(),
                category: "finance".into(),
                online: true,
                capabilities: vec!["trading".into()],
            }])
        }
    }

    fn cache_with(fetcher: ScriptedFetcher, ttl: Duration) -> RegistryCache {
        RegistryCache::new(
            Arc::new(fetcher),
            ttl,
            CircuitBreaker::new(100, Duration::from_secs(60)),
        )
    }

    #[tokio::test]
    async fn test_fresh_snapshot_served_without_refetch() {
        let cache = cache_with(ScriptedFetcher::new(u32::MAX), Duration::from_secs(300));
        let first = cache.get(false).await.unwrap();
        let second = cache.get(false).await.unwrap();
        assert_eq!(first.agents[0].id, second.agents[0].id);
        assert!(!second.degraded);
    }

    #[tokio::test]
    async fn test_force_refresh_refetches() {
        let cache = cache_with(ScriptedFetcher::new(u32::MAX), Duration::from_secs(300));
        let first = cache.get(false).await.unwrap();
        let second = cache.get(true).await.unwrap();
        assert_ne!(first.agents[0].id, second.agents[0].id);
    }

    #[tokio::test]
    async fn test_stale_cache_served_degraded_on_failure() {
        // First fetch succeeds, every later one fails; TTL zero makes the
        // snapshot immediately stale (equivalent to age >= 2x TTL).
        let cache = cache_with(ScriptedFetcher::new(1), Duration::ZERO);
        let first = cache.get(false).await.unwrap();
        assert!(!first.degraded);

        let stale = cache.get(false).await.unwrap();
        assert!(stale.degraded);
        assert_eq!(stale.agents[0].id, first.agents[0].id);
    }

    #[tokio::test]
    async fn test_no_cache_and_failure_is_unavailable() {
        let cache = cache_with(ScriptedFetcher::new(0), Duration::from_secs(300));
        let err = cache.get(false).await.unwrap_err();
        assert!(matches!(err, BountyboardError::RegistryUnavailable(_)));
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_single_flight() {
        let cache = Arc::new(cache_with(
            ScriptedFetcher::new(u32::MAX),
            Duration::from_secs(300),
        ));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.get(false).await }));
        }
        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap().agents[0].id.clone());
        }
        // All callers observed the one in-flight fetch.
        assert_eq!(ids.len(), 1);
    }
}
