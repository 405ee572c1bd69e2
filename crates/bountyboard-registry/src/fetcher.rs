use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use bountyboard_types::BountyboardError;

use crate::agent::RegistryAgent;

/// Seam over the remote agent directory. The cache only ever sees a
/// list of parsed agent records or a failure.
#[async_trait]
pub trait RegistryFetcher: Send + Sync {
    async fn fetch_agents(&self) -> Result<Vec<RegistryAgent>, BountyboardError>;
}

/// Paginated HTTP fetcher for the external directory API.
pub struct HttpRegistryFetcher {
    client: reqwest::Client,
    base_url: String,
    page_size: u32,
    max_pages: u32,
}

#[derive(Debug, Deserialize)]
struct DirectoryPage {
    #[serde(default)]
    data: Vec<DirectoryAgent>,
    #[serde(default)]
    meta: DirectoryMeta,
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryMeta {
    #[serde(default)]
    pagination: DirectoryPagination,
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryPagination {
    #[serde(rename = "pageCount", default)]
    page_count: u32,
}

#[derive(Debug, Deserialize)]
struct DirectoryAgent {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    offerings: Vec<DirectoryOffering>,
    #[serde(default)]
    metrics: DirectoryMetrics,
}

#[derive(Debug, Deserialize)]
struct DirectoryOffering {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryMetrics {
    #[serde(rename = "isOnline", default)]
    is_online: bool,
}

impl HttpRegistryFetcher {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        page_size: u32,
        max_pages: u32,
    ) -> Result<Self, BountyboardError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BountyboardError::Internal(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            page_size,
            max_pages,
        })
    }

    async fn fetch_page(&self, page: u32) -> Result<DirectoryPage, BountyboardError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("pagination[page]", page.to_string()),
                ("pagination[pageSize]", self.page_size.to_string()),
            ])
            .send()
            .await
            .map_err(|e| BountyboardError::RegistryUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| BountyboardError::RegistryUnavailable(e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| BountyboardError::RegistryUnavailable(format!("malformed response: {e}")))
    }
}

// At least one page, at most `max_pages`, whatever the directory reports.
fn bounded_page_count(reported: u32, max_pages: u32) -> u32 {
    reported.min(max_pages).max(1)
}

fn parse_agent(raw: DirectoryAgent) -> Option<RegistryAgent> {
    // Unnamed entries are directory noise, skip them.
    if raw.name.is_empty() || raw.name == "Unknown" {
        return None;
    }
    let id = raw
        .id
        .map(|v| v.to_string().trim_matches('"').to_string())
        .unwrap_or_default();
    let capabilities = raw
        .offerings
        .into_iter()
        .map(|o| o.name)
        .filter(|n| !n.is_empty())
        .collect();
    Some(RegistryAgent {
        id,
        name: raw.name,
        description: raw.description,
        category: raw.category,
        online: raw.metrics.is_online,
        capabilities,
    })
}

#[async_trait]
impl RegistryFetcher for HttpRegistryFetcher {
    async fn fetch_agents(&self) -> Result<Vec<RegistryAgent>, BountyboardError> {
        let first = self.fetch_page(1).await?;
        let page_count = bounded_page_count(first.meta.pagination.page_count, self.max_pages);
        tracing::info!(pages = page_count, "registry fetch started");

        let mut agents: Vec<RegistryAgent> =
            first.data.into_iter().filter_map(parse_agent).collect();

        for page in 2..=page_count {
            match self.fetch_page(page).await {
                Ok(p) => agents.extend(p.data.into_iter().filter_map(parse_agent)),
                // A partial directory still beats none; log and move on.
                Err(e) => tracing::warn!(page, error = %e, "registry page fetch failed"),
            }
        }

        tracing::info!(count = agents.len(), "registry fetch complete");
        Ok(agents)
    }
}
