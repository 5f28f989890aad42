//! Training corpus I/O: recursive transcript discovery and tagged-text output.
//!
//! The trainer itself never touches the filesystem. This crate walks input
//! paths into [`Document`]s and writes tagged transcripts back out for the
//! `format` command.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use markovcg_shared::{Document, MarkovError, Result};

/// A path that could not be read and was left out of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of walking the input paths.
#[derive(Debug, Default)]
pub struct CorpusRead {
    /// Readable transcripts, in walk order.
    pub documents: Vec<Document>,
    /// Entries that were logged and skipped.
    pub skipped: Vec<SkippedEntry>,
}

/// Read every file under `roots` as a transcript.
///
/// Directories are walked recursively in file-name order. Anything that cannot
/// be read (missing path, unreadable directory, non-UTF-8 file) is logged and
/// recorded in [`CorpusRead::skipped`] instead of failing the walk.
#[instrument(skip_all, fields(roots = roots.len()))]
pub fn read_corpus<P: AsRef<Path>>(roots: &[P]) -> CorpusRead {
    let mut corpus = CorpusRead::default();
    for root in roots {
        walk(root.as_ref(), &mut corpus);
    }

    info!(
        documents = corpus.documents.len(),
        skipped = corpus.skipped.len(),
        "corpus read"
    );
    corpus
}

fn walk(path: &Path, corpus: &mut CorpusRead) {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) => return skip(corpus, path, format!("cannot access: {e}")),
    };

    if meta.is_dir() {
        let entries = match std::fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) => return skip(corpus, path, format!("cannot read directory: {e}")),
        };

        let mut children: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    warn!(dir = %path.display(), error = %e, "bad directory entry, skipping");
                    None
                }
            })
            .collect();
        children.sort();

        for child in children {
            walk(&child, corpus);
        }
        return;
    }

    match std::fs::read_to_string(path) {
        Ok(text) => {
            debug!(path = %path.display(), bytes = text.len(), "read transcript");
            corpus
                .documents
                .push(Document::new(path.display().to_string(), text));
        }
        Err(e) => skip(corpus, path, format!("cannot read file: {e}")),
    }
}

fn skip(corpus: &mut CorpusRead, path: &Path, reason: String) {
    warn!(path = %path.display(), %reason, "skipping corpus entry");
    corpus.skipped.push(SkippedEntry {
        path: path.to_path_buf(),
        reason,
    });
}

/// Where the tagged version of `origin` goes under `out_dir`.
///
/// Keeps the path relative to `input_root`; a document that is not under it
/// (or is the root itself) keeps only its file name.
pub fn formatted_path(input_root: &Path, out_dir: &Path, origin: &str) -> PathBuf {
    let origin = Path::new(origin);
    let relative = match origin.strip_prefix(input_root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
        _ => origin
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("transcript.txt")),
    };
    out_dir.join(relative)
}

/// Write tagged lines for one document, creating parent directories.
pub fn write_formatted(
    input_root: &Path,
    out_dir: &Path,
    origin: &str,
    lines: &[String],
) -> Result<PathBuf> {
    let path = formatted_path(input_root, out_dir, origin);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| MarkovError::io(parent, e))?;
    }

    std::fs::write(&path, lines.join("\n")).map_err(|e| MarkovError::io(&path, e))?;
    debug!(path = %path.display(), lines = lines.len(), "wrote tagged transcript");

    Ok(path)
}
