use std::time::Duration;

use chrono::Utc;

use crate::state::AppState;

/// Spawn the background maintenance loops: periodic registry refresh and
/// the bounty expiry sweep. Both run for the life of the process.
pub fn spawn(state: &AppState) {
    spawn_registry_refresh(state.clone(), Duration::from_secs(state.config.refresh_interval_secs));
    spawn_expiry_sweep(state.clone(), Duration::from_secs(state.config.expiry_interval_secs));
}

fn spawn_registry_refresh(state: AppState, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately, warming the cache at startup.
        loop {
            ticker.tick().await;
            match state.registry.get(true).await {
                Ok(snapshot) => {
                    tracing::debug!(agents = snapshot.agents.len(), "registry refresh tick");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "periodic registry refresh failed");
                }
            }
        }
    });
}

fn spawn_expiry_sweep(state: AppState, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match state.store.expire_bounties(Utc::now()).await {
                Ok(0) => {}
                Ok(expired) => {
                    tracing::info!(expired, "expired bounties cancelled");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "expiry sweep failed");
                }
            }
        }
    });
}
