//! Model persistence: the probability table as JSON plus a manifest sidecar.
//!
//! The model file is a single JSON object keyed by context, each value an
//! object keyed by next token mapping to its probability. Keys are written in
//! table iteration order and nothing is HTML-escaped.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use markovcg_shared::{Document, MarkovError, ModelManifest, ProbabilityTable, Result};

/// Suffix appended to the model file name for its manifest.
const MANIFEST_SUFFIX: &str = ".manifest.json";

/// Write `table` to `path`, tab-indented, creating parent directories.
#[instrument(skip(table), fields(contexts = table.len()))]
pub fn write_model(table: &ProbabilityTable, path: &Path) -> Result<()> {
    write_json(table, path)?;
    info!(path = %path.display(), entries = table.entry_count(), "model written");
    Ok(())
}

/// Read a model previously written by [`write_model`].
pub fn load_model(path: &Path) -> Result<ProbabilityTable> {
    let file = File::open(path).map_err(|e| MarkovError::io(path, e))?;
    let table: ProbabilityTable = serde_json::from_reader(BufReader::new(file))?;

    if let Some((context, token, p)) = table
        .iter()
        .flat_map(|(c, row)| row.iter().map(move |(t, p)| (c, t, *p)))
        .find(|(_, _, p)| !(*p > 0.0 && *p <= 1.0))
    {
        return Err(MarkovError::validation(format!(
            "{}: probability {p} for {context:?} -> {token:?} is outside (0, 1]",
            path.display()
        )));
    }

    Ok(table)
}

/// Sidecar path for a model file: `model.json` -> `model.json.manifest.json`.
pub fn manifest_path(model_path: &Path) -> PathBuf {
    let mut name = model_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "model".into());
    name.push(MANIFEST_SUFFIX);
    model_path.with_file_name(name)
}

/// Write the manifest next to the model.
pub fn write_manifest(manifest: &ModelManifest, model_path: &Path) -> Result<PathBuf> {
    let path = manifest_path(model_path);
    write_json(manifest, &path)?;
    info!(path = %path.display(), id = %manifest.id, "manifest written");
    Ok(path)
}

/// SHA-256 over every document's origin and text, in the given order.
pub fn corpus_digest(documents: &[Document]) -> String {
    let mut hasher = Sha256::new();
    for doc in documents {
        hasher.update(doc.origin.as_bytes());
        hasher.update([0u8]);
        hasher.update(doc.text.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MarkovError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| MarkovError::io(path, e))?;
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(BufWriter::new(file), formatter);
    value.serialize(&mut serializer)?;

    let mut writer = serializer.into_inner();
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|e| MarkovError::io(path, e))
}
