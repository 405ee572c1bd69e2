use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level server configuration, populated from environment variables
/// with sensible defaults for every field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base URL of the external agent directory API.
    #[serde(default = "default_registry_url")]
    pub registry_url: String,

    /// Registry cache time-to-live in seconds.
    #[serde(default = "default_registry_ttl_secs")]
    pub registry_ttl_secs: u64,

    /// Per-request timeout for registry fetches, in seconds.
    #[serde(default = "default_registry_timeout_secs")]
    pub registry_timeout_secs: u64,

    /// Page size for the paginated registry fetch.
    #[serde(default = "default_registry_page_size")]
    pub registry_page_size: u32,

    /// Upper bound on pages fetched per refresh.
    #[serde(default = "default_registry_max_pages")]
    pub registry_max_pages: u32,

    /// Interval between periodic registry refreshes, in seconds.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Interval between bounty expiry sweeps, in seconds.
    #[serde(default = "default_expiry_interval_secs")]
    pub expiry_interval_secs: u64,

    /// Consecutive fetch failures before the circuit breaker opens.
    #[serde(default = "default_breaker_threshold")]
    pub breaker_failure_threshold: u32,

    /// Breaker recovery timeout in seconds (doubles on re-trip).
    #[serde(default = "default_breaker_recovery_secs")]
    pub breaker_recovery_secs: u64,

    /// Webhook delivery timeout per attempt, in seconds.
    #[serde(default = "default_webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,

    /// Webhook delivery attempts before giving up.
    #[serde(default = "default_webhook_max_retries")]
    pub webhook_max_retries: u32,

    /// Per-poster bounty creation limit per rolling hour.
    #[serde(default = "default_max_bounties_per_hour")]
    pub max_bounties_per_hour: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_registry_url() -> String {
    "https://acpx.virtuals.io/api/agents".to_string()
}

fn default_registry_ttl_secs() -> u64 {
    1800
}

fn default_registry_timeout_secs() -> u64 {
    30
}

fn default_registry_page_size() -> u32 {
    100
}

fn default_registry_max_pages() -> u32 {
    20
}

fn default_refresh_interval_secs() -> u64 {
    300
}

fn default_expiry_interval_secs() -> u64 {
    3600
}

fn default_breaker_threshold() -> u32 {
    3
}

fn default_breaker_recovery_secs() -> u64 {
    60
}

fn default_webhook_timeout_secs() -> u64 {
    10
}

fn default_webhook_max_retries() -> u32 {
    3
}

fn default_max_bounties_per_hour() -> usize {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        // An empty JSON object picks up every serde default.
        serde_json::from_str("{}").expect("defaults are valid")
    }
}

impl ServerConfig {
    /// Build a config from `BOUNTYBOARD_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        read_env("BOUNTYBOARD_BIND_ADDR", &mut config.bind_addr);
        read_env("BOUNTYBOARD_REGISTRY_URL", &mut config.registry_url);
        read_env("BOUNTYBOARD_REGISTRY_TTL_SECS", &mut config.registry_ttl_secs);
        read_env(
            "BOUNTYBOARD_REGISTRY_TIMEOUT_SECS",
            &mut config.registry_timeout_secs,
        );
        read_env(
            "BOUNTYBOARD_REGISTRY_PAGE_SIZE",
            &mut config.registry_page_size,
        );
        read_env(
            "BOUNTYBOARD_REGISTRY_MAX_PAGES",
            &mut config.registry_max_pages,
        );
        read_env(
            "BOUNTYBOARD_REFRESH_INTERVAL_SECS",
            &mut config.refresh_interval_secs,
        );
        read_env(
            "BOUNTYBOARD_EXPIRY_INTERVAL_SECS",
            &mut config.expiry_interval_secs,
        );
        read_env(
            "BOUNTYBOARD_BREAKER_FAILURE_THRESHOLD",
            &mut config.breaker_failure_threshold,
        );
        read_env(
            "BOUNTYBOARD_BREAKER_RECOVERY_SECS",
            &mut config.breaker_recovery_secs,
        );
        read_env(
            "BOUNTYBOARD_WEBHOOK_TIMEOUT_SECS",
            &mut config.webhook_timeout_secs,
        );
        read_env(
            "BOUNTYBOARD_WEBHOOK_MAX_RETRIES",
            &mut config.webhook_max_retries,
        );
        read_env(
            "BOUNTYBOARD_MAX_BOUNTIES_PER_HOUR",
            &mut config.max_bounties_per_hour,
        );
        config
    }

    pub fn registry_ttl(&self) -> Duration {
        Duration::from_secs(self.registry_ttl_secs)
    }

    pub fn registry_timeout(&self) -> Duration {
        Duration::from_secs(self.registry_timeout_secs)
    }

    pub fn breaker_recovery(&self) -> Duration {
        Duration::from_secs(self.breaker_recovery_secs)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }
}

fn read_env<T: std::str::FromStr>(key: &str, slot: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        if let Ok(parsed) = raw.parse() {
            *slot = parsed;
        } else {
            tracing::warn!(key, value = %raw, "ignoring unparsable environment override");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.registry_ttl_secs, 1800);
        assert_eq!(config.max_bounties_per_hour, 5);
    }

    #[test]
    fn test_env_overrides_every_tunable() {
        unsafe {
            std::env::set_var("BOUNTYBOARD_REGISTRY_PAGE_SIZE", "25");
            std::env::set_var("BOUNTYBOARD_REGISTRY_MAX_PAGES", "4");
            std::env::set_var("BOUNTYBOARD_BREAKER_FAILURE_THRESHOLD", "9");
            std::env::set_var("BOUNTYBOARD_WEBHOOK_TIMEOUT_SECS", "2");
            std::env::set_var("BOUNTYBOARD_WEBHOOK_MAX_RETRIES", "7");
            // Unparsable values keep the default.
            std::env::set_var("BOUNTYBOARD_BREAKER_RECOVERY_SECS", "soon");
        }
        let config = ServerConfig::from_env();
        assert_eq!(config.registry_page_size, 25);
        assert_eq!(config.registry_max_pages, 4);
        assert_eq!(config.breaker_failure_threshold, 9);
        assert_eq!(config.webhook_timeout_secs, 2);
        assert_eq!(config.webhook_max_retries, 7);
        assert_eq!(config.breaker_recovery_secs, 60);
    }
}
