//! Print the `executive_summary` recorded in a run log.
//!
//! Exits 1 and prints `not found` when the log holds no summary.

use anyhow::{Context, Result};
use clap::Parser;
use lmp_lite::summary::{extract_executive_summary, DEFAULT_LOG_PATH, NOT_FOUND_MESSAGE};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "extract-summary",
    version,
    about = "Print the executive_summary field embedded in a run log"
)]
struct Cli {
    /// Log file to scan.
    #[arg(default_value = DEFAULT_LOG_PATH)]
    log: PathBuf,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let bytes = std::fs::read(&cli.log)
        .with_context(|| format!("Failed to read log file {:?}", cli.log))?;
    let log = String::from_utf8_lossy(&bytes);

    match extract_executive_summary(&log) {
        Some(summary) => {
            println!("{summary}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("{NOT_FOUND_MESSAGE}");
            Ok(ExitCode::FAILURE)
        }
    }
}
