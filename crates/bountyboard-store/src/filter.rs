use serde::Serialize;

use bountyboard_types::{BountyStatus, Category};

/// Filters for bounty listings. All fields are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct BountyFilter {
    pub status: Option<BountyStatus>,
    pub category: Option<Category>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,
    /// Case-insensitive substring over title/description/tags.
    pub search: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// Filters for service listings. Inactive listings are excluded unless
/// `include_inactive` is set.
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    pub category: Option<Category>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
    pub include_inactive: bool,
    pub limit: usize,
    pub offset: usize,
}

/// Bounty counters for the stats endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BountyStats {
    pub total_bounties: usize,
    pub open_bounties: usize,
    pub matched_bounties: usize,
    pub fulfilled_bounties: usize,
}
