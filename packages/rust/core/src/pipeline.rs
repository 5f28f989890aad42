//! Training coordinator: documents → tagged lines → counts → merged counts → table.

use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use markovcg_shared::{
    Document, DocumentFailure, FailurePolicy, MarkovError, ProbabilityTable, Result, TrainConfig,
};

use crate::aggregate;
use crate::counter::{self, FrequencySnapshot};
use crate::probability;

/// Summary of a finished training run.
#[derive(Debug, Clone, Default)]
pub struct TrainReport {
    /// Documents that contributed counts.
    pub documents: usize,
    /// Documents skipped under [`FailurePolicy::Skip`].
    pub failed: Vec<DocumentFailure>,
    /// Distinct next-tokens.
    pub tokens: usize,
    /// Distinct contexts.
    pub contexts: usize,
    /// Distinct n-grams.
    pub ngrams: usize,
    /// Wall time for the whole run.
    pub elapsed: Duration,
}

/// Table plus report.
#[derive(Debug)]
pub struct TrainResult {
    pub table: ProbabilityTable,
    pub report: TrainReport,
}

/// A document after tagging, for callers that only need the tagged text.
#[derive(Debug, Clone)]
pub struct TaggedDocument {
    pub origin: String,
    pub lines: Vec<String>,
}

/// Progress callback for reporting training status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each document's task is joined.
    fn document_done(&self, origin: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &TrainReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_done(&self, _origin: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &TrainReport) {}
}

/// Tag one document and count its windows.
pub fn process_document(document: &Document, order: usize) -> FrequencySnapshot {
    let lines = markovcg_tagger::tag(&document.text);
    counter::count(&lines, order)
}

/// Train a probability table from raw documents.
pub async fn train(documents: Vec<Document>, config: &TrainConfig) -> Result<ProbabilityTable> {
    Ok(train_with_progress(documents, config, &SilentProgress)
        .await?
        .table)
}

/// Train a probability table, reporting progress and returning run statistics.
///
/// 1. One blocking task per document runs tagger + counter
/// 2. Join every task; failures are skipped or abort per `config.failure_policy`
/// 3. Merge the snapshots
/// 4. Build the probability table
#[instrument(skip_all, fields(documents = documents.len(), order = config.order))]
pub async fn train_with_progress(
    documents: Vec<Document>,
    config: &TrainConfig,
    progress: &dyn ProgressReporter,
) -> Result<TrainResult> {
    config.validate()?;
    let start = Instant::now();

    info!(documents = documents.len(), order = config.order, "starting training");

    // --- Phase 1: Tag + count, one task per document ---
    progress.phase("Counting n-grams");
    let order = config.order;
    let outcomes = join_all(
        documents,
        move |document| process_document(&document, order),
        progress,
    )
    .await;

    let (snapshots, failed) = apply_policy(outcomes, config.failure_policy)?;
    let documents = snapshots.len();

    // --- Phase 2: Merge + build table ---
    progress.phase("Building probability table");
    let (merged_counts, table) = tokio::task::spawn_blocking(move || {
        let merged = aggregate::merge(snapshots);
        let counts = (
            merged.tokens.len(),
            merged.context_counts.len(),
            merged.ngram_counts.len(),
        );
        (counts, probability::from_snapshot(&merged))
    })
    .await
    .map_err(|e| MarkovError::Task(format!("probability build: {e}")))?;

    let (tokens, contexts, ngrams) = merged_counts;
    let report = TrainReport {
        documents,
        failed,
        tokens,
        contexts,
        ngrams,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        documents = report.documents,
        failed = report.failed.len(),
        tokens = report.tokens,
        contexts = report.contexts,
        ngrams = report.ngrams,
        elapsed_ms = report.elapsed.as_millis(),
        "training complete"
    );

    Ok(TrainResult { table, report })
}

/// Tag every document concurrently without counting.
#[instrument(skip_all, fields(documents = documents.len()))]
pub async fn tag_documents(
    documents: Vec<Document>,
    progress: &dyn ProgressReporter,
) -> Vec<std::result::Result<TaggedDocument, DocumentFailure>> {
    progress.phase("Tagging transcripts");
    join_all(
        documents,
        |document| TaggedDocument {
            lines: markovcg_tagger::tag(&document.text),
            origin: document.origin,
        },
        progress,
    )
    .await
}

/// Split joined outcomes into snapshots and failures under `policy`.
///
/// `Abort` returns the first failure in input order as [`MarkovError::Document`].
fn apply_policy(
    outcomes: Vec<std::result::Result<FrequencySnapshot, DocumentFailure>>,
    policy: FailurePolicy,
) -> Result<(Vec<FrequencySnapshot>, Vec<DocumentFailure>)> {
    let mut snapshots = Vec::with_capacity(outcomes.len());
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(failure) if policy == FailurePolicy::Abort => {
                return Err(MarkovError::document(failure.origin, failure.message));
            }
            Err(failure) => {
                warn!(origin = %failure.origin, error = %failure.message, "document failed, skipping");
                failed.push(failure);
            }
        }
    }
    Ok((snapshots, failed))
}

/// Spawn `work` once per document on the blocking pool and wait for all of them.
///
/// Tasks are launched eagerly with no cap. Results come back in input order;
/// a task that panics becomes a [`DocumentFailure`] for its document.
async fn join_all<T, F>(
    documents: Vec<Document>,
    work: F,
    progress: &dyn ProgressReporter,
) -> Vec<std::result::Result<T, DocumentFailure>>
where
    T: Send + 'static,
    F: Fn(Document) -> T + Clone + Send + 'static,
{
    let total = documents.len();
    let handles: Vec<(String, JoinHandle<T>)> = documents
        .into_iter()
        .map(|document| {
            let origin = document.origin.clone();
            let work = work.clone();
            (origin, tokio::task::spawn_blocking(move || work(document)))
        })
        .collect();

    let mut outcomes = Vec::with_capacity(total);
    for (i, (origin, handle)) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(value) => {
                debug!(%origin, "document processed");
                outcomes.push(Ok(value));
            }
            Err(e) => {
                warn!(%origin, error = %e, "document task failed");
                outcomes.push(Err(DocumentFailure {
                    origin: origin.clone(),
                    message: e.to_string(),
                }));
            }
        }
        progress.document_done(&origin, i + 1, total);
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn doc(origin: &str, text: &str) -> Document {
        Document::new(origin, text)
    }

    fn corpus() -> Vec<Document> {
        vec![
            doc(
                "s01e01.txt",
                "Monk's Cafe\nJERRY: What's the deal?\nGEORGE: (sighs) I don't know.\n\n\n\n\
                 [Jerry's apartment]\nKRAMER: Hey!\n(Kramer slides in)",
            ),
            doc(
                "s01e02.txt",
                "The street\nELAINE: Get out!\nJERRY: What's the deal?\n(laughs)",
            ),
            doc("empty.txt", ""),
        ]
    }

    #[tokio::test]
    async fn end_to_end_bigram_example() {
        let documents = vec![doc("pilot.txt", "JERRY: Hello.\n(laughs)\n")];
        let config = TrainConfig {
            order: 2,
            ..TrainConfig::default()
        };

        let snapshot = process_document(&documents[0], 2);
        assert_eq!(snapshot.context_counts["<ldialogue>"], 1);
        assert_eq!(snapshot.ngram_counts["<ldialogue> <speaker>"], 1);
        assert_eq!(snapshot.ngram_counts["<ldirection> (laughs)"], 1);

        let table = train(documents, &config).await.expect("train");
        assert_eq!(table.probability("<ldialogue>", "<speaker>"), Some(1.0));
        assert_eq!(table.probability("<speaker>", "JERRY:"), Some(1.0));
    }

    #[tokio::test]
    async fn result_independent_of_document_order() {
        let config = TrainConfig::default();
        let forward = train(corpus(), &config).await.expect("train");

        let mut reversed = corpus();
        reversed.reverse();
        let backward = train(reversed, &config).await.expect("train");

        assert_eq!(forward, backward);
    }

    #[tokio::test]
    async fn matches_sequential_pipeline() {
        let config = TrainConfig::default();
        let table = train(corpus(), &config).await.expect("train");

        let merged = aggregate::merge(
            corpus()
                .iter()
                .map(|d| counter::count(&markovcg_tagger::tag(&d.text), config.order)),
        );
        assert_eq!(table, probability::from_snapshot(&merged));
    }

    #[tokio::test]
    async fn report_counts_documents_and_rows() {
        let result = train_with_progress(corpus(), &TrainConfig::default(), &SilentProgress)
            .await
            .expect("train");

        assert_eq!(result.report.documents, 3);
        assert!(result.report.failed.is_empty());
        assert_eq!(result.report.contexts, result.table.len());
        assert!(result.report.ngrams >= result.table.entry_count());
        let deal = result
            .table
            .followers("JERRY: </speaker>")
            .expect("context seen twice");
        assert_eq!(deal.get("What's"), Some(&1.0));
    }

    #[tokio::test]
    async fn no_documents_yields_empty_table() {
        let table = train(Vec::new(), &TrainConfig::default())
            .await
            .expect("train");
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn zero_order_rejected_before_dispatch() {
        let config = TrainConfig {
            order: 0,
            ..TrainConfig::default()
        };
        let err = train(corpus(), &config).await.unwrap_err();
        assert!(matches!(err, MarkovError::Validation { .. }));
    }

    struct Recording(Mutex<Vec<(String, usize, usize)>>);

    impl ProgressReporter for Recording {
        fn phase(&self, _name: &str) {}
        fn document_done(&self, origin: &str, current: usize, total: usize) {
            self.0
                .lock()
                .unwrap()
                .push((origin.to_string(), current, total));
        }
        fn done(&self, _report: &TrainReport) {}
    }

    #[tokio::test]
    async fn progress_sees_every_document() {
        let recorder = Recording(Mutex::new(Vec::new()));
        train_with_progress(corpus(), &TrainConfig::default(), &recorder)
            .await
            .expect("train");

        let seen = recorder.0.into_inner().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2], ("empty.txt".to_string(), 3, 3));
    }

    #[tokio::test]
    async fn tag_documents_keeps_origins() {
        let tagged = tag_documents(corpus(), &SilentProgress).await;
        assert_eq!(tagged.len(), 3);

        let first = tagged[0].as_ref().expect("tagged");
        assert_eq!(first.origin, "s01e01.txt");
        assert_eq!(first.lines[0], "<start>");
        assert!(first.lines.contains(&"<lsetting> [Jerry's apartment] </lsetting>".to_string()));
    }

    #[tokio::test]
    async fn panicking_task_becomes_failure() {
        let outcomes = join_all(
            vec![doc("ok.txt", "fine"), doc("bad.txt", "boom")],
            |document| {
                if document.text == "boom" {
                    panic!("tagger exploded");
                }
                document.text.len()
            },
            &SilentProgress,
        )
        .await;

        assert_eq!(outcomes[0], Ok(4));
        let failure = outcomes[1].as_ref().unwrap_err();
        assert_eq!(failure.origin, "bad.txt");
    }

    fn outcomes() -> Vec<std::result::Result<FrequencySnapshot, DocumentFailure>> {
        let docs = corpus();
        vec![
            Ok(process_document(&docs[0], 2)),
            Err(DocumentFailure {
                origin: "bad.txt".to_string(),
                message: "task panicked".to_string(),
            }),
            Ok(process_document(&docs[1], 2)),
        ]
    }

    #[test]
    fn abort_policy_stops_on_failure() {
        let err = apply_policy(outcomes(), FailurePolicy::Abort).unwrap_err();
        match err {
            MarkovError::Document { origin, message } => {
                assert_eq!(origin, "bad.txt");
                assert_eq!(message, "task panicked");
            }
            other => panic!("expected document error, got {other:?}"),
        }
    }

    #[test]
    fn skip_policy_keeps_remaining_documents() {
        let (snapshots, failed) = apply_policy(outcomes(), FailurePolicy::Skip).expect("skip");
        assert_eq!(snapshots.len(), 2);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].origin, "bad.txt");

        let docs = corpus();
        let expected = aggregate::merge([
            process_document(&docs[0], 2),
            process_document(&docs[1], 2),
        ]);
        let table = probability::from_snapshot(&aggregate::merge(snapshots));
        assert_eq!(table, probability::from_snapshot(&expected));
        assert!(!table.is_empty());
    }

    #[test]
    fn policies_agree_without_failures() {
        let clean: Vec<_> = outcomes().into_iter().filter(|o| o.is_ok()).collect();
        let (skipped, failed) = apply_policy(clean.clone(), FailurePolicy::Skip).expect("skip");
        let (aborted, _) = apply_policy(clean, FailurePolicy::Abort).expect("abort");
        assert!(failed.is_empty());
        assert_eq!(skipped, aborted);
    }
}
