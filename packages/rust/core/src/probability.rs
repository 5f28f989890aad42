//! Conditional probability table from merged counts.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use markovcg_shared::ProbabilityTable;

use crate::counter::FrequencySnapshot;
use crate::keys;

/// `P(token | context) = ngram_counts[context token] / context_counts[context]`.
///
/// Only observed n-grams get an entry, so each context's row sums to 1 over
/// the tokens that actually followed it. Walks the n-grams that exist rather
/// than every (context, token) pair; the resulting table is the same.
#[instrument(skip_all, fields(contexts = context_counts.len(), ngrams = ngram_counts.len()))]
pub fn build_probabilities(
    tokens: &HashSet<String>,
    context_counts: &HashMap<String, u64>,
    ngram_counts: &HashMap<String, u64>,
) -> ProbabilityTable {
    let mut rows: HashMap<String, HashMap<String, f64>> =
        HashMap::with_capacity(context_counts.len());

    for (key, &n) in ngram_counts {
        let (context, token) = keys::split_ngram(key);
        debug_assert!(tokens.contains(token), "n-gram {key:?} ends in an unknown token");

        debug_assert!(
            context_counts.contains_key(context),
            "n-gram {key:?} has no context count"
        );
        let Some(&total) = context_counts.get(context) else {
            continue;
        };
        debug_assert!(total >= n, "context {context:?} seen {total} times, n-gram {n}");

        rows.entry(context.to_string())
            .or_default()
            .insert(token.to_string(), n as f64 / total as f64);
    }

    debug!(contexts = rows.len(), "probability table built");
    rows.into_iter().collect()
}

/// [`build_probabilities`] over a merged snapshot.
pub fn from_snapshot(snapshot: &FrequencySnapshot) -> ProbabilityTable {
    build_probabilities(
        &snapshot.tokens,
        &snapshot.context_counts,
        &snapshot.ngram_counts,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::merge;
    use crate::counter::count;

    /// Every context against every token, as a reference for the fast path.
    fn exhaustive(snapshot: &FrequencySnapshot) -> ProbabilityTable {
        let mut table = ProbabilityTable::new();
        for (context, &total) in &snapshot.context_counts {
            for token in &snapshot.tokens {
                let key = keys::ngram_key(context, token);
                if let Some(&n) = snapshot.ngram_counts.get(&key) {
                    table.insert(context.clone(), token.clone(), n as f64 / total as f64);
                }
            }
        }
        table
    }

    fn sample() -> FrequencySnapshot {
        merge([
            count(&["a b c", "a b d", "a b c e"], 3),
            count(&["<ldialogue> <speaker> JERRY: </speaker> Hi. </ldialogue>"], 3),
        ])
    }

    #[test]
    fn relative_frequencies() {
        let table = from_snapshot(&sample());
        assert!((table.probability("a b", "c").unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((table.probability("a b", "d").unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(table.probability("b c", "e"), Some(1.0));
        assert_eq!(table.probability("a b", "e"), None);
    }

    #[test]
    fn matches_exhaustive_construction() {
        let snapshot = sample();
        assert_eq!(from_snapshot(&snapshot), exhaustive(&snapshot));

        let unigram = count(&["a b a c"], 1);
        assert_eq!(from_snapshot(&unigram), exhaustive(&unigram));
    }

    #[test]
    fn probabilities_in_range_and_rows_sum_to_one() {
        let table = from_snapshot(&sample());
        for (context, row) in table.iter() {
            for p in row.values() {
                assert!(*p > 0.0 && *p <= 1.0, "{context}: {p}");
            }
            let sum: f64 = row.values().sum();
            assert!((sum - 1.0).abs() < 1e-9, "{context} sums to {sum}");
        }
    }

    #[test]
    fn every_context_gets_a_row() {
        let snapshot = sample();
        let table = from_snapshot(&snapshot);
        assert_eq!(table.len(), snapshot.context_counts.len());
        assert_eq!(table.entry_count(), snapshot.ngram_counts.len());
    }

    #[test]
    fn empty_counts_give_empty_table() {
        assert!(from_snapshot(&FrequencySnapshot::new()).is_empty());
    }
}
