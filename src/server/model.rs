//! Adaptive prefix-tree character model.
//!
//! Each state is a node in a tree of observed prefixes; node 0 is the root.
//! A node keeps counts of the symbols observed to follow it and scores the
//! shared vocabulary with add-one smoothing:
//!
//! ```text
//! p(s | node) = (count(node, s) + 1) / (total(node) + |V|)
//! ```
//!
//! The vocabulary always contains end-of-string and grows with every updated
//! symbol.

use std::collections::{BTreeSet, HashMap};

use crate::error::{Result, StateLmError};
use crate::protocol::{LmScores, StateHandle, Symbol, END_OF_STRING};

const ROOT: usize = 0;

#[derive(Debug, Default)]
struct Node {
    children: HashMap<char, usize>,
    counts: HashMap<i32, u64>,
    total: u64,
}

/// In-memory adaptive model backing the reference server.
#[derive(Debug)]
pub struct PrefixModel {
    nodes: Vec<Node>,
    vocabulary: BTreeSet<i32>,
}

impl Default for PrefixModel {
    fn default() -> Self {
        Self::new("")
    }
}

impl PrefixModel {
    /// Create a model knowing the characters of `vocabulary` plus end-of-string.
    pub fn new(vocabulary: &str) -> Self {
        let mut symbols: BTreeSet<i32> = vocabulary.chars().map(|c| c as i32).collect();
        symbols.insert(END_OF_STRING);
        Self {
            nodes: vec![Node::default()],
            vocabulary: symbols,
        }
    }

    /// Number of states issued so far.
    pub fn num_states(&self) -> usize {
        self.nodes.len()
    }

    /// Vocabulary size including end-of-string.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    fn node_index(&self, state: StateHandle) -> Result<usize> {
        if state.is_unknown() {
            return Ok(ROOT);
        }
        usize::try_from(state.to_wire())
            .ok()
            .filter(|&i| i < self.nodes.len())
            .ok_or_else(|| StateLmError::InvalidState {
                state: state.to_wire(),
                message: format!("state {} was not issued by this server", state.to_wire()),
            })
    }

    /// Walk `context` without creating nodes; unseen prefixes fall back to root.
    fn lookup(&self, state: StateHandle, context: &str) -> Result<usize> {
        let mut idx = self.node_index(state)?;
        for c in context.chars() {
            idx = self.nodes[idx].children.get(&c).copied().unwrap_or(ROOT);
        }
        Ok(idx)
    }

    fn scores_at(&self, idx: usize) -> LmScores {
        let node = &self.nodes[idx];
        let denominator = (node.total + self.vocabulary.len() as u64) as f64;

        let mut scores = LmScores {
            symbols: Vec::with_capacity(self.vocabulary.len()),
            probabilities: Vec::with_capacity(self.vocabulary.len()),
        };
        for &sym in &self.vocabulary {
            let count = node.counts.get(&sym).copied().unwrap_or(0);
            // Vocabulary entries are validated on insertion.
            let text = Symbol::from_codepoint(sym)
                .map(Symbol::as_text)
                .unwrap_or_default();
            scores.symbols.push(text);
            scores.probabilities.push((count + 1) as f64 / denominator);
        }
        scores
    }

    /// Distribution after `context` from `state`.
    pub fn get_scores(&self, state: StateHandle, context: &str) -> Result<LmScores> {
        let idx = self.lookup(state, context)?;
        Ok(self.scores_at(idx))
    }

    /// State reached after `context`, creating states as needed.
    pub fn next_state(&mut self, state: StateHandle, context: &str) -> Result<StateHandle> {
        let mut idx = self.node_index(state)?;
        for c in context.chars() {
            idx = match self.nodes[idx].children.get(&c) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[idx].children.insert(c, child);
                    child
                },
            };
        }
        Ok(StateHandle::from_wire(idx as i64))
    }

    /// Add `count` observations of `utf8_sym` at `state` and return the new distribution.
    pub fn update(&mut self, state: StateHandle, utf8_sym: i32, count: i32) -> Result<LmScores> {
        let count = u64::try_from(count)
            .ok()
            .filter(|&c| c > 0)
            .ok_or_else(|| {
                StateLmError::InvalidArgument(format!("count must be positive, got {count}"))
            })?;
        Symbol::from_codepoint(utf8_sym)?;
        let idx = self.node_index(state)?;

        self.vocabulary.insert(utf8_sym);
        let node = &mut self.nodes[idx];
        *node.counts.entry(utf8_sym).or_insert(0) += count;
        node.total += count;

        Ok(self.scores_at(idx))
    }
}
