//! Higher-level client tasks built on the three protocol calls.
//!
//! - [`k_best`](ScoringClient::k_best): most probable continuations of a context
//! - [`random_generate`](ScoringClient::random_generate): sample a continuation
//! - [`bits_per_character`](ScoringClient::bits_per_character): adaptive
//!   cross-entropy over a corpus, training the model as it goes

use std::fmt;

use rand::Rng;

use super::channel::ScoringService;
use super::scoring::ScoringClient;
use crate::error::{Result, StateLmError};
use crate::protocol::{check_text, ScoreDistribution, StateHandle, Symbol};
use crate::ranking::{rank, top_k, RankedCandidate};

/// Maximum number of symbols appended by random generation.
pub const MAX_RANDGEN_LEN: usize = 128;

/// Total number of Unicode codepoints assumed by the uniform mixture.
const NUM_CODEPOINTS: f64 = 143_859.0;

/// Weight of the uniform distribution mixed into model probabilities.
const MIX_EPSILON: f64 = 1e-8;

/// Suffix appended when generation hits the length limit.
const LENGTH_LIMIT_MARKER: &str = "(reached_length_limit)";

/// Bits-per-character summary for a corpus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitsPerChar {
    /// Characters scored, one end-of-string per line included.
    pub total_chars: usize,
    /// Characters the model assigned no probability.
    pub oov_chars: usize,
    /// Sum of per-character bits.
    pub total_bits: f64,
}

impl BitsPerChar {
    /// Average bits per character (0 for an empty corpus).
    pub fn bits_per_char(&self) -> f64 {
        if self.total_chars == 0 {
            0.0
        } else {
            self.total_bits / self.total_chars as f64
        }
    }
}

impl fmt::Display for BitsPerChar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total characters: {} ({} OOV); bits per character: {}",
            self.total_chars,
            self.oov_chars,
            self.bits_per_char()
        )
    }
}

/// Format a k-best list as `"{k}-best prob continuations: a(0.500) b(0.250)"`.
pub fn format_k_best(k: usize, candidates: &[RankedCandidate]) -> String {
    let mut out = format!("{k}-best prob continuations:");
    for c in candidates {
        out.push_str(&format!(" {}({:5.3})", c.symbol, c.probability));
    }
    out
}

/// Bits for `symbol` under `dist`, mixed with a uniform over all codepoints.
///
/// Returns the bits and whether the symbol was out of vocabulary.
fn symbol_bits(dist: &ScoreDistribution, symbol: &str) -> (f64, bool) {
    let mut prob = MIX_EPSILON / NUM_CODEPOINTS;
    let found = dist.probability(symbol);
    if let Some(p) = found {
        prob += p * (1.0 - MIX_EPSILON);
    }
    (-prob.log2(), found.is_none())
}

/// Pick a position in `ranked` by walking cumulative probability up to `threshold`.
fn sample_position(ranked: &[RankedCandidate], threshold: f64) -> usize {
    let mut total = 0.0;
    let mut pos = 0;
    while total < threshold && pos < ranked.len() {
        total += ranked[pos].probability;
        pos += 1;
    }
    pos.saturating_sub(1)
}

impl<S: ScoringService> ScoringClient<S> {
    /// The `k` most probable continuations of `context`, from a stateless query.
    pub async fn k_best(&self, k: usize, context: &str) -> Result<Vec<RankedCandidate>> {
        let dist = self.score(StateHandle::UNKNOWN, context).await?;
        Ok(top_k(&dist, k))
    }

    /// Generate a random continuation of `context`.
    ///
    /// Returns `context` followed by sampled symbols. Stops at end-of-string or
    /// after [`MAX_RANDGEN_LEN`] symbols, in which case a marker is appended.
    pub async fn random_generate<R: Rng + ?Sized>(
        &self,
        context: &str,
        rng: &mut R,
    ) -> Result<String> {
        let mut result = context.to_string();
        let mut state = self.advance_context(StateHandle::UNKNOWN, context).await?;

        for _ in 0..MAX_RANDGEN_LEN {
            let dist = self.score(state, "").await?;
            let ranked = rank(&dist);
            if ranked.is_empty() {
                return Err(StateLmError::ProtocolViolation(format!(
                    "empty distribution at {state}"
                )));
            }

            let chosen = &ranked[sample_position(&ranked, rng.gen::<f64>())];
            if chosen.is_end_of_string() {
                return Ok(result);
            }
            result.push_str(&chosen.symbol);
            state = self.advance_context(state, &chosen.symbol).await?;
        }

        tracing::debug!(limit = MAX_RANDGEN_LEN, "random generation hit length limit");
        result.push_str(LENGTH_LIMIT_MARKER);
        Ok(result)
    }

    /// Adaptive bits per character over `lines`.
    ///
    /// Each line is scored from the root state one character at a time, then
    /// the model is updated with that character before moving on, so later
    /// characters benefit from earlier ones. Lines containing NUL are rejected
    /// before anything is sent.
    pub async fn bits_per_character<I, T>(&self, lines: I) -> Result<BitsPerChar>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let lines: Vec<T> = lines.into_iter().collect();
        for line in &lines {
            check_text(line.as_ref())?;
        }

        let mut summary = BitsPerChar {
            total_chars: 0,
            oov_chars: 0,
            total_bits: 0.0,
        };

        for line in &lines {
            let mut state = StateHandle::INITIAL;
            let mut dist = self.score(state, "").await?;

            let symbols = line
                .as_ref()
                .chars()
                .map(Symbol::Char)
                .chain(std::iter::once(Symbol::EndOfString));
            for symbol in symbols {
                let text = symbol.as_text();
                let (bits, oov) = symbol_bits(&dist, &text);
                if oov {
                    tracing::warn!("OOV symbol found: {:?}", text);
                    summary.oov_chars += 1;
                }
                summary.total_chars += 1;
                summary.total_bits += bits;

                self.update_symbol(state, symbol, 1).await?;
                if let Symbol::Char(_) = symbol {
                    state = self.advance(state, &text).await?;
                    dist = self.score(state, "").await?;
                }
            }
        }

        Ok(summary)
    }
}
