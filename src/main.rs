//! Entry point for the bashup CLI.
//!
//! Logs go to stderr; the download link is the only thing printed to stdout.

use anyhow::Result;
use clap::Parser;

use bashup::Cli;
use bashup::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level())?;

    let outcome = bashup::run(&cli).await?;
    println!("{}", outcome.url);

    Ok(())
}
