//! Per-document n-gram counting.

use std::collections::{HashMap, HashSet};

use crate::keys;

/// Token set plus context and n-gram tallies for one document (or a merge of many).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencySnapshot {
    /// Distinct tokens seen in the "next token" position of some window.
    pub tokens: HashSet<String>,
    /// Context key (N-1 tokens) -> occurrences.
    pub context_counts: HashMap<String, u64>,
    /// N-gram key (N tokens) -> occurrences.
    pub ngram_counts: HashMap<String, u64>,
}

impl FrequencySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when no window has been counted.
    pub fn is_empty(&self) -> bool {
        self.ngram_counts.is_empty()
    }

    /// Total number of windows counted.
    pub fn window_count(&self) -> u64 {
        self.ngram_counts.values().sum()
    }

    fn record(&mut self, window: &[&str]) {
        let (context, next) = window.split_at(window.len() - 1);
        let token = next[0];

        if !self.tokens.contains(token) {
            self.tokens.insert(token.to_string());
        }
        *self.context_counts.entry(keys::join(context)).or_insert(0) += 1;
        *self.ngram_counts.entry(keys::join(window)).or_insert(0) += 1;
    }
}

/// Count every width-`order` window of every line.
///
/// Windows never span two lines, and a line with fewer than `order` tokens adds
/// nothing. An `order` of 0 has no windows and yields an empty snapshot.
pub fn count<S: AsRef<str>>(lines: &[S], order: usize) -> FrequencySnapshot {
    let mut snapshot = FrequencySnapshot::new();
    if order == 0 {
        return snapshot;
    }

    for line in lines {
        let words: Vec<&str> = line.as_ref().split_whitespace().collect();
        if words.len() < order {
            continue;
        }
        for window in words.windows(order) {
            snapshot.record(window);
        }
    }

    snapshot
}
