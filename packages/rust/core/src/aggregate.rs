//! Merging per-document snapshots.
//!
//! Token sets are unioned and count maps summed key-wise, so the result does
//! not depend on the order snapshots arrive in.

use crate::counter::FrequencySnapshot;

impl FrequencySnapshot {
    /// Fold `other` into `self`.
    pub fn absorb(&mut self, other: FrequencySnapshot) {
        self.tokens.extend(other.tokens);
        for (key, n) in other.context_counts {
            *self.context_counts.entry(key).or_insert(0) += n;
        }
        for (key, n) in other.ngram_counts {
            *self.ngram_counts.entry(key).or_insert(0) += n;
        }
    }

    /// Merge two snapshots into a new one.
    pub fn merged(mut self, other: FrequencySnapshot) -> FrequencySnapshot {
        self.absorb(other);
        self
    }
}

/// Merge any number of snapshots into one.
pub fn merge<I>(snapshots: I) -> FrequencySnapshot
where
    I: IntoIterator<Item = FrequencySnapshot>,
{
    snapshots
        .into_iter()
        .fold(FrequencySnapshot::new(), FrequencySnapshot::merged)
}
