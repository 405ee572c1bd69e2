use thiserror::Error;
use uuid::Uuid;

use crate::bounty::BountyStatus;

#[derive(Debug, Error)]
pub enum BountyboardError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("bounty not found: {0}")]
    BountyNotFound(Uuid),

    #[error("service not found: {0}")]
    ServiceNotFound(Uuid),

    #[error("invalid transition: bounty is {current:?}")]
    InvalidTransition { current: BountyStatus },

    #[error("service is deactivated")]
    ServiceDeactivated,

    #[error("invalid secret")]
    InvalidSecret,

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BountyboardError {
    /// Stable machine-readable error code surfaced to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BountyNotFound(_) => "BOUNTY_NOT_FOUND",
            Self::ServiceNotFound(_) => "SERVICE_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_STATUS",
            Self::ServiceDeactivated => "SERVICE_DEACTIVATED",
            Self::InvalidSecret => "INVALID_SECRET",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::RegistryUnavailable(_) => "REGISTRY_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, BountyboardError>;
