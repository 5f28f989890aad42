//! markovcg CLI: train a Markov chain over tagged dialogue transcripts.
//!
//! Reads raw transcripts, tags their structure, counts n-grams concurrently,
//! and writes the resulting probability table as JSON.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
