//! Validated next-symbol distributions.

use super::message::LmScores;
use crate::error::{Result, StateLmError};

/// Probability distribution over next symbols.
///
/// Entries are kept in server order. The parallel sequences are guaranteed to
/// have equal length and every probability is finite and non-negative; nothing
/// guarantees the probabilities sum to one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreDistribution {
    symbols: Vec<String>,
    probabilities: Vec<f64>,
}

impl ScoreDistribution {
    /// Validate a raw response.
    pub fn from_scores(scores: LmScores) -> Result<Self> {
        let LmScores {
            symbols,
            probabilities,
        } = scores;

        if symbols.len() != probabilities.len() {
            return Err(StateLmError::size_mismatch(
                symbols.len(),
                probabilities.len(),
            ));
        }
        if let Some((i, p)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p < 0.0)
        {
            return Err(StateLmError::ProtocolViolation(format!(
                "probability {p} for symbol {:?} is not a non-negative real",
                symbols[i]
            )));
        }

        Ok(Self {
            symbols,
            probabilities,
        })
    }

    /// Build from (symbol, probability) pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let (symbols, probabilities) = pairs.into_iter().map(|(s, p)| (s.into(), p)).unzip();
        Self::from_scores(LmScores {
            symbols,
            probabilities,
        })
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether there are no candidates.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterate (symbol, probability) in server order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.symbols
            .iter()
            .map(String::as_str)
            .zip(self.probabilities.iter().copied())
    }

    /// Probability of `symbol`, if it is a candidate.
    pub fn probability(&self, symbol: &str) -> Option<f64> {
        self.iter().find(|(s, _)| *s == symbol).map(|(_, p)| p)
    }

    /// Sum of all visible probability mass.
    pub fn total_mass(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    /// Convert back to the wire form.
    pub fn into_scores(self) -> LmScores {
        LmScores {
            symbols: self.symbols,
            probabilities: self.probabilities,
        }
    }
}
