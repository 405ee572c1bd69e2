use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use bountyboard_types::{Bounty, callback_url_is_allowed};

/// Best-effort webhook delivery. Notifications run on a spawned task
/// with a bounded per-attempt timeout and a small retry budget, so a
/// lifecycle transition never waits on a callback endpoint.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl WebhookNotifier {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            max_retries,
            base_delay: Duration::from_secs(2),
        }
    }

    /// Queue a notification for a bounty event. No-op without a URL;
    /// re-checks the SSRF guard in case a stored URL predates it.
    pub fn notify(&self, callback_url: Option<&str>, event: &'static str, bounty: &Bounty) {
        let Some(url) = callback_url else {
            return;
        };
        if !callback_url_is_allowed(url) {
            tracing::warn!(event, "blocked webhook to disallowed url");
            return;
        }

        let payload = json!({
            "event": event,
            "bounty": {
                "id": bounty.id,
                "title": bounty.title,
                "budget": bounty.budget,
                "status": bounty.status,
                "claimed_by": bounty.claimed_by,
                "job_id": bounty.job_id,
            },
            "timestamp": Utc::now(),
        });

        let client = self.client.clone();
        let url = url.to_string();
        let max_retries = self.max_retries.max(1);
        let base_delay = self.base_delay;

        tokio::spawn(async move {
            for attempt in 1..=max_retries {
                match client.post(&url).json(&payload).send().await {
                    Ok(response) => {
                        tracing::info!(event, url, status = %response.status(), "webhook sent");
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(
                            event,
                            url,
                            attempt,
                            max_retries,
                            error = %e,
                            "webhook delivery failed"
                        );
                        if attempt < max_retries {
                            let delay = base_delay * 2u32.pow(attempt - 1);
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
            tracing::error!(event, url, "webhook dead-lettered after retries");
        });
    }
}
