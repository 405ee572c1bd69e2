//! Advisory auto-match: when a new service listing goes live, find open
//! bounties it could plausibly fulfill. Matching never changes bounty
//! status; it only surfaces candidates for an explicit match call.

use serde::Serialize;
use uuid::Uuid;

use bountyboard_types::{Bounty, BountyStatus, Service};

/// An open bounty a new listing could fulfill.
#[derive(Debug, Clone, Serialize)]
pub struct MatchCandidate {
    pub bounty_id: Uuid,
    pub title: String,
    pub budget: f64,
    /// How much of the budget would be left after paying the listing price.
    pub budget_gap: f64,
}

/// Scan open bounties for candidates compatible with a service listing.
///
/// A bounty qualifies when the categories match, its budget covers the
/// listing price, and the tag sets intersect (an untagged bounty matches
/// any listing). Candidates are ordered tightest budget fit first, then
/// earliest created.
pub fn find_candidates(service: &Service, bounties: &[Bounty]) -> Vec<MatchCandidate> {
    let mut candidates: Vec<(&Bounty, f64)> = bounties
        .iter()
        .filter(|b| b.status == BountyStatus::Open)
        .filter(|b| b.category == service.category)
        .filter(|b| b.budget >= service.price)
        .filter(|b| {
            b.tags.is_empty() || b.tags.iter().any(|t| service.tags.contains(t))
        })
        .map(|b| (b, b.budget - service.price))
        .collect();

    candidates.sort_by(|(a, gap_a), (b, gap_b)| {
        gap_a
            .partial_cmp(gap_b)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.created_at.cmp(&b.created_at))
    });

    candidates
        .into_iter()
        .map(|(b, gap)| MatchCandidate {
            bounty_id: b.id,
            title: b.title.clone(),
            budget: b.budget,
            budget_gap: gap,
        })
        .collect()
}
