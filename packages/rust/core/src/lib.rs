//! Frequency counting, merging, probability estimation, and the training
//! coordinator for markovcg.
//!
//! Tagged lines come from `markovcg-tagger`; everything here is pure and
//! in-memory. Reading transcripts and writing models live in the corpus and
//! model crates.

pub mod aggregate;
pub mod counter;
pub mod keys;
pub mod pipeline;
pub mod probability;

pub use aggregate::merge;
pub use counter::{FrequencySnapshot, count};
pub use pipeline::{
    ProgressReporter, SilentProgress, TaggedDocument, TrainReport, TrainResult, process_document,
    tag_documents, train, train_with_progress,
};
pub use probability::build_probabilities;
