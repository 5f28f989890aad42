//! Application configuration for markovcg.
//!
//! User config lives at `~/.markovcg/markovcg.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MarkovError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "markovcg.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".markovcg";

/// Default n-gram order.
pub const DEFAULT_ORDER: usize = 3;

// ---------------------------------------------------------------------------
// Config structs (matching markovcg.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Training defaults.
    #[serde(default)]
    pub training: TrainingConfig,

    /// Output locations.
    #[serde(default)]
    pub output: OutputConfig,
}

/// What the coordinator does when a single document fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Record the failure in the report and keep training on the rest.
    #[default]
    Skip,
    /// Stop the run with the first failure.
    Abort,
}

/// `[training]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// N-gram order (window width).
    #[serde(default = "default_order")]
    pub order: usize,

    /// Failure handling for individual documents.
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            order: default_order(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

fn default_order() -> usize {
    DEFAULT_ORDER
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where `train` writes the probability model.
    #[serde(default = "default_model_path")]
    pub model_path: String,

    /// Where `format` writes tagged transcripts.
    #[serde(default = "default_formatted_dir")]
    pub formatted_dir: String,

    /// Whether `train` writes a `.manifest.json` sidecar next to the model.
    #[serde(default = "default_true")]
    pub write_manifest: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            formatted_dir: default_formatted_dir(),
            write_manifest: true,
        }
    }
}

fn default_model_path() -> String {
    "./model.json".into()
}
fn default_formatted_dir() -> String {
    "training_proc".into()
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Train config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime training configuration consumed by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainConfig {
    /// N-gram order, constant for the whole run.
    pub order: usize,
    /// Failure handling for individual documents.
    pub failure_policy: FailurePolicy,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            failure_policy: FailurePolicy::Skip,
        }
    }
}

impl From<&AppConfig> for TrainConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            order: config.training.order,
            failure_policy: config.training.failure_policy,
        }
    }
}

impl TrainConfig {
    /// Reject orders the counter cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.order == 0 {
            return Err(MarkovError::validation("n-gram order must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.markovcg/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| MarkovError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.markovcg/markovcg.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| MarkovError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| MarkovError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| MarkovError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| MarkovError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| MarkovError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
