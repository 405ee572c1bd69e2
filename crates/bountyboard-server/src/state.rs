use std::sync::Arc;

use bountyboard_registry::{CircuitBreaker, HttpRegistryFetcher, RegistryCache, RegistryFetcher};
use bountyboard_store::{InMemoryStore, Store};

use crate::config::ServerConfig;
use crate::webhook::WebhookNotifier;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub registry: Arc<RegistryCache>,
    pub webhooks: WebhookNotifier,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Production wiring: in-memory store and the HTTP registry fetcher.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let fetcher = HttpRegistryFetcher::new(
            config.registry_url.clone(),
            config.registry_timeout(),
            config.registry_page_size,
            config.registry_max_pages,
        )?;
        Ok(Self::with_parts(config, Arc::new(InMemoryStore::new()), Arc::new(fetcher)))
    }

    /// Wiring with explicit store and fetcher, used by tests.
    pub fn with_parts(
        config: ServerConfig,
        store: Arc<dyn Store>,
        fetcher: Arc<dyn RegistryFetcher>,
    ) -> Self {
        let breaker = CircuitBreaker::new(
            config.breaker_failure_threshold,
            config.breaker_recovery(),
        );
        let registry = Arc::new(RegistryCache::new(fetcher, config.registry_ttl(), breaker));
        let webhooks = WebhookNotifier::new(config.webhook_timeout(), config.webhook_max_retries);
        Self {
            store,
            registry,
            webhooks,
            config: Arc::new(config),
        }
    }
}
