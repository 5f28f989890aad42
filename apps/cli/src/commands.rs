//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use markovcg_core::{ProgressReporter, TaggedDocument, TrainReport};
use markovcg_shared::{
    AppConfig, CURRENT_SCHEMA_VERSION, DocumentFailure, FailurePolicy, ModelId, ModelManifest, TrainConfig,
    init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// markovcg: turn dialogue transcripts into a Markov chain model.
#[derive(Parser)]
#[command(
    name = "markovcg",
    version,
    about = "Train a fixed-order Markov chain over tagged dialogue transcripts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Train a model from transcript files or directories.
    Train {
        /// Transcript files or directories (walked recursively).
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Where to write the model (defaults to config `output.model_path`).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// N-gram order (defaults to config `training.order`).
        #[arg(short = 'n', long)]
        order: Option<usize>,

        /// Stop at the first document that fails instead of skipping it.
        #[arg(long)]
        abort_on_failure: bool,

        /// Do not write the `.manifest.json` sidecar.
        #[arg(long)]
        no_manifest: bool,
    },

    /// Tag raw transcripts and write the tagged text.
    Format {
        /// Transcript file or directory.
        path: PathBuf,

        /// Output directory (defaults to config `output.formatted_dir`).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Summarize a trained model, or list the followers of one context.
    Inspect {
        /// Model JSON file.
        model: PathBuf,

        /// Context to look up (tokens separated by single spaces).
        #[arg(short, long)]
        context: Option<String>,

        /// How many followers to show.
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "markovcg=info",
        1 => "markovcg=debug",
        _ => "markovcg=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Train {
            paths,
            out,
            order,
            abort_on_failure,
            no_manifest,
        } => {
            let options = TrainOptions {
                out,
                order,
                abort_on_failure,
                no_manifest,
            };
            cmd_train(&paths, options).await
        }
        Command::Format { path, out } => cmd_format(&path, out.as_deref()).await,
        Command::Inspect {
            model,
            context,
            top,
        } => cmd_inspect(&model, context.as_deref(), top),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// train
// ---------------------------------------------------------------------------

/// Flags for `train` that override config values.
#[derive(Debug, Default)]
struct TrainOptions {
    out: Option<PathBuf>,
    order: Option<usize>,
    abort_on_failure: bool,
    no_manifest: bool,
}

/// Merge config file values with CLI overrides.
fn resolve_train_config(config: &AppConfig, options: &TrainOptions) -> TrainConfig {
    let mut train = TrainConfig::from(config);
    if let Some(order) = options.order {
        train.order = order;
    }
    if options.abort_on_failure {
        train.failure_policy = FailurePolicy::Abort;
    }
    train
}

async fn cmd_train(paths: &[PathBuf], options: TrainOptions) -> Result<()> {
    let config = load_config()?;
    let train_config = resolve_train_config(&config, &options);
    train_config.validate()?;

    let model_path = options
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.model_path));

    info!(
        inputs = paths.len(),
        order = train_config.order,
        model = %model_path.display(),
        "training model"
    );

    let corpus = markovcg_corpus::read_corpus(paths);
    if corpus.documents.is_empty() {
        return Err(eyre!(
            "no readable transcripts under {} input path(s)",
            paths.len()
        ));
    }
    let corpus_digest = markovcg_model::corpus_digest(&corpus.documents);

    let reporter = CliProgress::new("Counting");
    let result =
        markovcg_core::train_with_progress(corpus.documents, &train_config, &reporter).await?;

    markovcg_model::write_model(&result.table, &model_path)?;

    let manifest_path = if options.no_manifest || !config.output.write_manifest {
        None
    } else {
        let manifest = ModelManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            id: ModelId::new(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            order: train_config.order,
            document_count: result.report.documents,
            failed_documents: result.report.failed.clone(),
            token_count: result.report.tokens,
            context_count: result.report.contexts,
            ngram_count: result.report.ngrams,
            corpus_digest,
            created_at: chrono::Utc::now(),
        };
        Some(markovcg_model::write_manifest(&manifest, &model_path)?)
    };

    let report = &result.report;
    println!();
    println!("  Model trained!");
    println!("  Documents: {}", report.documents);
    println!("  Skipped:   {}", corpus.skipped.len() + report.failed.len());
    println!("  Tokens:    {}", report.tokens);
    println!("  Contexts:  {}", report.contexts);
    println!("  N-grams:   {}", report.ngrams);
    println!("  Model:     {}", model_path.display());
    if let Some(path) = manifest_path {
        println!("  Manifest:  {}", path.display());
    }
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
    /// Verb shown per finished document ("Counting", "Tagging").
    action: &'static str,
}

impl CliProgress {
    fn new(action: &'static str) -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner, action }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_done(&self, origin: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("{} [{current}/{total}] {origin}", self.action));
    }

    fn done(&self, _report: &TrainReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// format
// ---------------------------------------------------------------------------

async fn cmd_format(path: &Path, out: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let out_dir = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.output.formatted_dir));

    info!(input = %path.display(), out = %out_dir.display(), "formatting transcripts");

    let corpus = markovcg_corpus::read_corpus(&[path]);
    let reporter = CliProgress::new("Tagging");
    let tagged = markovcg_core::tag_documents(corpus.documents, &reporter).await;
    reporter.spinner.finish_and_clear();

    let (written, failed) = write_tagged(path, &out_dir, tagged);
    let failed = failed + corpus.skipped.len();

    println!("Formatted {written} transcript(s) into {}", out_dir.display());
    if failed > 0 {
        println!("Skipped {failed} entr{}", if failed == 1 { "y" } else { "ies" });
    }
    Ok(())
}

/// Write every tagged document, logging and counting the ones that fail.
///
/// Returns `(written, failed)`.
fn write_tagged(
    input_root: &Path,
    out_dir: &Path,
    tagged: Vec<std::result::Result<TaggedDocument, DocumentFailure>>,
) -> (usize, usize) {
    let mut written = 0usize;
    let mut failed = 0usize;
    for outcome in tagged {
        match outcome {
            Ok(doc) => {
                match markovcg_corpus::write_formatted(input_root, out_dir, &doc.origin, &doc.lines)
                {
                    Ok(_) => written += 1,
                    Err(e) => {
                        warn!(origin = %doc.origin, error = %e, "cannot write tagged transcript, skipping");
                        failed += 1;
                    }
                }
            }
            Err(failure) => {
                warn!(origin = %failure.origin, error = %failure.message, "tagging failed");
                failed += 1;
            }
        }
    }
    (written, failed)
}

// ---------------------------------------------------------------------------
// inspect
// ---------------------------------------------------------------------------

fn cmd_inspect(model: &Path, context: Option<&str>, top: usize) -> Result<()> {
    let table = markovcg_model::load_model(model)?;

    match context {
        Some(context) => {
            let ranked = table.ranked_followers(context);
            if ranked.is_empty() {
                return Err(eyre!("context {context:?} not found in {}", model.display()));
            }
            println!("{context:?} is followed by {} token(s):", ranked.len());
            for (token, p) in ranked.into_iter().take(top) {
                println!("  {p:>8.4}  {token}");
            }
        }
        None => {
            println!("  Model:    {}", model.display());
            println!("  Contexts: {}", table.len());
            println!("  Entries:  {}", table.entry_count());

            let mut busiest: Vec<(&str, usize)> = table
                .iter()
                .map(|(c, row)| (c.as_str(), row.len()))
                .collect();
            busiest.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            if !busiest.is_empty() {
                println!("  Most varied contexts:");
                for (c, n) in busiest.into_iter().take(top) {
                    println!("  {n:>8}  {c}");
                }
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_train_flags() {
        let cli = Cli::try_parse_from([
            "markovcg",
            "train",
            "-n",
            "2",
            "--abort-on-failure",
            "-o",
            "out.json",
            "raw/",
            "more/",
        ])
        .expect("parse");

        match cli.command {
            Command::Train {
                paths,
                out,
                order,
                abort_on_failure,
                no_manifest,
            } => {
                assert_eq!(paths, vec![PathBuf::from("raw/"), PathBuf::from("more/")]);
                assert_eq!(out, Some(PathBuf::from("out.json")));
                assert_eq!(order, Some(2));
                assert!(abort_on_failure);
                assert!(!no_manifest);
            }
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn train_requires_a_path() {
        assert!(Cli::try_parse_from(["markovcg", "train"]).is_err());
    }

    #[test]
    fn flags_override_config() {
        let mut config = AppConfig::default();
        config.training.order = 4;

        let defaults = resolve_train_config(&config, &TrainOptions::default());
        assert_eq!(defaults.order, 4);
        assert_eq!(defaults.failure_policy, FailurePolicy::Skip);

        let overridden = resolve_train_config(
            &config,
            &TrainOptions {
                order: Some(2),
                abort_on_failure: true,
                ..TrainOptions::default()
            },
        );
        assert_eq!(overridden.order, 2);
        assert_eq!(overridden.failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn write_failures_are_counted_not_fatal() {
        let root = std::env::temp_dir().join(format!("markovcg_cli_{}", uuid::Uuid::now_v7()));
        let input = root.join("raw");
        let out = root.join("out");
        std::fs::create_dir_all(&out).expect("create out dir");
        // A plain file where a subdirectory is needed makes that write fail.
        std::fs::write(out.join("s1"), "not a directory").expect("block s1");

        let doc = |origin: &Path| -> std::result::Result<TaggedDocument, DocumentFailure> {
            Ok(TaggedDocument {
                origin: origin.display().to_string(),
                lines: vec!["<start>".to_string(), "<end>".to_string()],
            })
        };
        let tagged = vec![
            doc(&input.join("s1").join("e1.txt")),
            Err(DocumentFailure {
                origin: "bad.txt".to_string(),
                message: "task panicked".to_string(),
            }),
            doc(&input.join("e2.txt")),
        ];

        let (written, failed) = write_tagged(&input, &out, tagged);
        assert_eq!((written, failed), (1, 2));
        assert_eq!(
            std::fs::read_to_string(out.join("e2.txt")).expect("written"),
            "<start>\n<end>"
        );

        std::fs::remove_dir_all(&root).ok();
    }
}
