use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bounty::Category;
use crate::error::{BountyboardError, Result};
use crate::sanitize::{normalize_tags, sanitize_text};
use crate::secret::{SecretHash, SecretToken, generate_secret};

/// An advertised capability with pricing, offered by an agent.
/// The secret hash is never serialized into responses.
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: Uuid,
    pub agent_name: String,
    #[serde(skip)]
    pub agent_secret_hash: SecretHash,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a service listing.
#[derive(Debug, Clone, Deserialize)]
pub struct NewService {
    pub agent_name: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Secret-gated partial update of a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceUpdate {
    pub agent_secret: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl Service {
    /// Validate input and build an active listing. Returns the listing
    /// and the plaintext agent secret.
    pub fn create(input: NewService) -> Result<(Service, SecretToken)> {
        let agent_name = sanitize_text(&input.agent_name);
        let name = sanitize_text(&input.name);
        let description = sanitize_text(&input.description);

        if agent_name.is_empty() {
            return Err(BountyboardError::Validation(
                "agent_name must not be empty".into(),
            ));
        }
        if name.is_empty() {
            return Err(BountyboardError::Validation("name must not be empty".into()));
        }
        if description.is_empty() {
            return Err(BountyboardError::Validation(
                "description must not be empty".into(),
            ));
        }
        if !(input.price > 0.0) || !input.price.is_finite() {
            return Err(BountyboardError::Validation(
                "price must be a positive number".into(),
            ));
        }

        let (token, hash) = generate_secret();
        let now = Utc::now();
        let service = Service {
            id: Uuid::new_v4(),
            agent_name,
            agent_secret_hash: hash,
            name,
            description,
            price: input.price,
            category: input.category,
            location: input.location.map(|l| sanitize_text(&l)),
            tags: normalize_tags(&input.tags),
            active: true,
            created_at: now,
            updated_at: now,
        };
        Ok((service, token))
    }

    fn require_agent_secret(&self, provided: &str) -> Result<()> {
        if self.agent_secret_hash.verify(provided) {
            Ok(())
        } else {
            Err(BountyboardError::InvalidSecret)
        }
    }

    /// Apply a secret-gated update. Deactivated listings are terminal.
    pub fn apply_update(&mut self, update: ServiceUpdate, now: DateTime<Utc>) -> Result<()> {
        self.require_agent_secret(&update.agent_secret)?;
        if !self.active {
            return Err(BountyboardError::ServiceDeactivated);
        }

        if let Some(name) = update.name {
            let name = sanitize_text(&name);
            if name.is_empty() {
                return Err(BountyboardError::Validation("name must not be empty".into()));
            }
            self.name = name;
        }
        if let Some(description) = update.description {
            let description = sanitize_text(&description);
            if description.is_empty() {
                return Err(BountyboardError::Validation(
                    "description must not be empty".into(),
                ));
            }
            self.description = description;
        }
        if let Some(price) = update.price {
            if !(price > 0.0) || !price.is_finite() {
                return Err(BountyboardError::Validation(
                    "price must be a positive number".into(),
                ));
            }
            self.price = price;
        }
        if let Some(location) = update.location {
            self.location = Some(sanitize_text(&location));
        }
        if let Some(tags) = update.tags {
            self.tags = normalize_tags(&tags);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Soft-delete the listing. No hard delete of history.
    pub fn deactivate(&mut self, agent_secret: &str, now: DateTime<Utc>) -> Result<()> {
        self.require_agent_secret(agent_secret)?;
        if !self.active {
            return Err(BountyboardError::ServiceDeactivated);
        }
        self.active = false;
        self.updated_at = now;
        Ok(())
    }
}
