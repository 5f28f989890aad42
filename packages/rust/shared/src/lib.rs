//! Shared types, error model, and configuration for markovcg.
//!
//! This crate is the foundation depended on by all other markovcg crates.
//! It provides:
//! - [`MarkovError`], the unified error type
//! - Domain types ([`Document`], [`ProbabilityTable`], [`ModelManifest`], [`ModelId`])
//! - Configuration ([`AppConfig`], [`TrainConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_ORDER, FailurePolicy, OutputConfig, TrainConfig, TrainingConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{MarkovError, Result};
pub use types::{
    CURRENT_SCHEMA_VERSION, Document, DocumentFailure, ModelId, ModelManifest, ProbabilityTable,
};
