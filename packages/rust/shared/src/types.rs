//! Core domain types shared by the trainer, the corpus reader, and the model writer.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version for the model manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One raw transcript and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Origin identifier (usually the file path).
    pub origin: String,
    /// Raw, untagged transcript text.
    pub text: String,
}

impl Document {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }
}

/// A document that did not produce a frequency snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    /// Origin of the failed document.
    pub origin: String,
    /// Human-readable reason.
    pub message: String,
}

impl std::fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.origin, self.message)
    }
}

// ---------------------------------------------------------------------------
// ProbabilityTable
// ---------------------------------------------------------------------------

/// Sparse `context -> next token -> probability` mapping.
///
/// Only tokens that actually followed a context in training get an entry, so
/// a context's row sums to 1 over its observed followers and nothing else is
/// stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbabilityTable(HashMap<String, HashMap<String, f64>>);

impl ProbabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `P(token | context)`.
    pub fn insert(&mut self, context: impl Into<String>, token: impl Into<String>, p: f64) {
        self.0
            .entry(context.into())
            .or_default()
            .insert(token.into(), p);
    }

    /// All recorded followers of `context`.
    pub fn followers(&self, context: &str) -> Option<&HashMap<String, f64>> {
        self.0.get(context)
    }

    /// Followers of `context`, most probable first (ties broken by token).
    pub fn ranked_followers(&self, context: &str) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .followers(context)
            .map(|row| row.iter().map(|(t, p)| (t.as_str(), *p)).collect())
            .unwrap_or_default();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    /// `P(token | context)`, if the pair was observed.
    pub fn probability(&self, context: &str, token: &str) -> Option<f64> {
        self.0.get(context)?.get(token).copied()
    }

    /// Number of contexts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of (context, token) entries.
    pub fn entry_count(&self) -> usize {
        self.0.values().map(HashMap::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HashMap<String, f64>)> {
        self.0.iter()
    }
}

impl FromIterator<(String, HashMap<String, f64>)> for ProbabilityTable {
    fn from_iter<I: IntoIterator<Item = (String, HashMap<String, f64>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// ModelId / ModelManifest
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for trained model identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(pub Uuid);

impl ModelId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ModelId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The `<model>.manifest.json` sidecar describing how a model was trained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Unique identifier for this model.
    pub id: ModelId,
    /// Tool version that trained the model.
    pub tool_version: String,
    /// N-gram order used.
    pub order: usize,
    /// Documents that contributed counts.
    pub document_count: usize,
    /// Documents that failed and were skipped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_documents: Vec<DocumentFailure>,
    /// Distinct tokens seen.
    pub token_count: usize,
    /// Distinct contexts in the table.
    pub context_count: usize,
    /// Distinct n-grams seen.
    pub ngram_count: usize,
    /// SHA-256 over the training documents, hex encoded.
    pub corpus_digest: String,
    /// When training finished.
    pub created_at: DateTime<Utc>,
}
