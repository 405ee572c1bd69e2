use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{BountyboardError, Result};
use crate::sanitize::{normalize_tags, sanitize_text};
use crate::secret::{SecretHash, SecretToken, generate_secret};

/// Marketplace category shared by bounties and service listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Digital,
    Physical,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Digital => f.write_str("digital"),
            Category::Physical => f.write_str("physical"),
        }
    }
}

/// Bounty lifecycle states.
///
/// `open → claimed → matched | fulfilled`; `open | claimed → cancelled`;
/// `matched → fulfilled`. `fulfilled` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BountyStatus {
    Open,
    Claimed,
    Matched,
    Fulfilled,
    Cancelled,
}

impl BountyStatus {
    /// Terminal states admit no further transitions at all.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BountyStatus::Fulfilled | BountyStatus::Cancelled)
    }
}

/// Advisory reference recorded when a new service listing looks
/// compatible with an open bounty. Never changes bounty status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PossibleMatch {
    pub service_id: Uuid,
    pub recorded_at: DateTime<Utc>,
}

/// A posted task with a budget, awaiting claim and fulfillment.
/// Secret hashes are never serialized into responses.
#[derive(Debug, Clone, Serialize)]
pub struct Bounty {
    pub id: Uuid,
    pub poster_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_callback_url: Option<String>,
    #[serde(skip)]
    pub poster_secret_hash: SecretHash,

    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    pub budget: f64,
    pub category: Category,
    pub tags: Vec<String>,

    pub status: BountyStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimer_callback_url: Option<String>,
    #[serde(skip)]
    pub claimer_secret_hash: Option<SecretHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_service_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_job: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfilled_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    pub possible_matches: Vec<PossibleMatch>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a bounty.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBounty {
    pub poster_name: String,
    pub title: String,
    pub description: String,
    pub budget: f64,
    pub category: Category,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub poster_callback_url: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// A requested lifecycle transition with its authorization payload.
#[derive(Debug, Clone)]
pub enum BountyTransition {
    Claim {
        claimer_name: String,
        claimer_callback_url: Option<String>,
    },
    Unclaim {
        claimer_secret: String,
    },
    Match {
        poster_secret: String,
        service_id: Option<Uuid>,
        agent_id: String,
        job: Option<String>,
    },
    Fulfill {
        poster_secret: String,
        job_id: Option<String>,
    },
    Cancel {
        poster_secret: String,
    },
}

/// Result of a successfully applied transition. `secret` is set only
/// for `Claim`, carrying the plaintext shown exactly once.
#[derive(Debug)]
pub struct TransitionOutcome {
    pub bounty: Bounty,
    pub secret: Option<SecretToken>,
}

impl Bounty {
    /// Validate input and build an open bounty. Returns the bounty and
    /// the plaintext poster secret, which is not retained anywhere.
    pub fn create(input: NewBounty) -> Result<(Bounty, SecretToken)> {
        let poster_name = sanitize_text(&input.poster_name);
        let title = sanitize_text(&input.title);
        let description = sanitize_text(&input.description);

        if poster_name.is_empty() {
            return Err(BountyboardError::Validation(
                "poster_name must not be empty".into(),
            ));
        }
        if title.is_empty() {
            return Err(BountyboardError::Validation("title must not be empty".into()));
        }
        if description.is_empty() {
            return Err(BountyboardError::Validation(
                "description must not be empty".into(),
            ));
        }
        if !(input.budget > 0.0) || !input.budget.is_finite() {
            return Err(BountyboardError::Validation(
                "budget must be a positive number".into(),
            ));
        }

        let (token, hash) = generate_secret();
        let now = Utc::now();
        let bounty = Bounty {
            id: Uuid::new_v4(),
            poster_name,
            poster_callback_url: input.poster_callback_url,
            poster_secret_hash: hash,
            title,
            description,
            requirements: input.requirements.map(|r| sanitize_text(&r)),
            budget: input.budget,
            category: input.category,
            tags: normalize_tags(&input.tags),
            status: BountyStatus::Open,
            claimed_by: None,
            claimer_callback_url: None,
            claimer_secret_hash: None,
            claimed_at: None,
            matched_service_id: None,
            matched_agent_id: None,
            matched_job: None,
            matched_at: None,
            job_id: None,
            fulfilled_at: None,
            expires_at: input.expires_at,
            possible_matches: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        Ok((bounty, token))
    }

    fn require_poster_secret(&self, provided: &str) -> Result<()> {
        if self.poster_secret_hash.verify(provided) {
            Ok(())
        } else {
            Err(BountyboardError::InvalidSecret)
        }
    }

    fn require_status(&self, allowed: &[BountyStatus]) -> Result<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(BountyboardError::InvalidTransition {
                current: self.status,
            })
        }
    }

    /// Apply a lifecycle transition.
    ///
    /// The secret is verified before the status so a wrong secret is
    /// always reported as `InvalidSecret`, independent of state. The
    /// caller (the store) holds the entry lock while this runs, which
    /// makes the status precondition a commit-time check.
    pub fn apply(&mut self, transition: BountyTransition, now: DateTime<Utc>) -> Result<Option<SecretToken>> {
        let secret = match transition {
            BountyTransition::Claim {
                claimer_name,
                claimer_callback_url,
            } => {
                self.require_status(&[BountyStatus::Open])?;
                let claimer_name = sanitize_text(&claimer_name);
                if claimer_name.is_empty() {
                    return Err(BountyboardError::Validation(
                        "claimer_name must not be empty".into(),
                    ));
                }
                let (token, hash) = generate_secret();
                self.status = BountyStatus::Claimed;
                self.claimed_by = Some(claimer_name);
                self.claimer_callback_url = claimer_callback_url;
                self.claimer_secret_hash = Some(hash);
                self.claimed_at = Some(now);
                Some(token)
            }
            BountyTransition::Unclaim { claimer_secret } => {
                let authorized = self
                    .claimer_secret_hash
                    .as_ref()
                    .is_some_and(|h| h.verify(&claimer_secret));
                if !authorized {
                    return Err(BountyboardError::InvalidSecret);
                }
                self.require_status(&[BountyStatus::Claimed])?;
                self.status = BountyStatus::Open;
                self.claimed_by = None;
                self.claimer_callback_url = None;
                self.claimer_secret_hash = None;
                self.claimed_at = None;
                None
            }
            BountyTransition::Match {
                poster_secret,
                service_id,
                agent_id,
                job,
            } => {
                self.require_poster_secret(&poster_secret)?;
                self.require_status(&[BountyStatus::Open, BountyStatus::Claimed])?;
                self.status = BountyStatus::Matched;
                self.matched_service_id = service_id;
                self.matched_agent_id = Some(agent_id);
                self.matched_job = job;
                self.matched_at = Some(now);
                None
            }
            BountyTransition::Fulfill {
                poster_secret,
                job_id,
            } => {
                self.require_poster_secret(&poster_secret)?;
                self.require_status(&[
                    BountyStatus::Open,
                    BountyStatus::Claimed,
                    BountyStatus::Matched,
                ])?;
                self.status = BountyStatus::Fulfilled;
                self.job_id = job_id;
                self.fulfilled_at = Some(now);
                None
            }
            BountyTransition::Cancel { poster_secret } => {
                self.require_poster_secret(&poster_secret)?;
                self.require_status(&[
                    BountyStatus::Open,
                    BountyStatus::Claimed,
                    BountyStatus::Matched,
                ])?;
                self.status = BountyStatus::Cancelled;
                None
            }
        };
        self.updated_at = now;
        Ok(secret)
    }
}
