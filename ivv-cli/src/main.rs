//! Binary crate for the `ivv` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Installing the log sink
//! - Running one pipeline cycle for an external scheduler (cron)
//! - Human-friendly views of the persisted observations

use clap::Parser;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
