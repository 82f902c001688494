//! Leetscribe CLI: scrape problem solutions and annotate them with an LLM.
//!
//! Drives a real browser through login, the problem listing and each
//! problem's solutions page, then asks a chat model for complexity analysis
//! or a code conversion of every captured snippet.

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
