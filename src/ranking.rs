//! Candidate ranking.
//!
//! Turns a [`ScoreDistribution`] into candidates ordered by decreasing
//! probability. Ties keep no particular order.

use serde::Serialize;

use crate::protocol::ScoreDistribution;

/// A (probability, symbol) pair ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    /// Candidate probability.
    pub probability: f64,
    /// Candidate symbol, `""` for end-of-string.
    pub symbol: String,
}

impl RankedCandidate {
    /// Whether this candidate is the end-of-string marker.
    pub fn is_end_of_string(&self) -> bool {
        self.symbol.is_empty()
    }
}

/// Rank all candidates by probability, highest first.
pub fn rank(distribution: &ScoreDistribution) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = distribution
        .iter()
        .map(|(symbol, probability)| RankedCandidate {
            probability,
            symbol: symbol.to_string(),
        })
        .collect();
    ranked.sort_unstable_by(|a, b| b.probability.total_cmp(&a.probability));
    ranked
}

/// The `k` most probable candidates (fewer if the distribution is smaller).
pub fn top_k(distribution: &ScoreDistribution, k: usize) -> Vec<RankedCandidate> {
    let mut ranked = rank(distribution);
    ranked.truncate(k);
    ranked
}

/// Position of `symbol` in a ranked list.
pub fn position_of(ranked: &[RankedCandidate], symbol: &str) -> Option<usize> {
    ranked.iter().position(|c| c.symbol == symbol)
}
