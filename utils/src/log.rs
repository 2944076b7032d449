use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{filter::Targets, prelude::*};

/// Human readable logs on stdout, mirrored into `logfile` when given.
pub fn setup_tracing(verbose: bool, logfile: Option<&Path>) -> Result<()> {
    let filter = if verbose {
        Targets::new().with_default(Level::DEBUG)
    } else {
        Targets::default().with_default(Level::INFO)
    };
    let stdout_log = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(verbose)
        .with_line_number(verbose);
    let file_log = match logfile {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to open logfile {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(file_log)
        .with(filter)
        .try_init()
        .context("failed to install the tracing subscriber")
}
