use anyhow::Result;
use clap::{Parser, ValueHint};
use std::path::PathBuf;
use tracing::{debug, error};

use config::Config;
use tools::ExifToolExtractor;
use utils::log::setup_tracing;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// directory to sort, defaults to the current directory
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    input: Option<PathBuf>,
    /// config file, defaults to config.toml beside the executable
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
    /// test mode, do not create directories or move files
    #[arg(long, default_value = "false")]
    test: bool,
    /// enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// option point to the logfile path, must have RW permissions.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    logfile: Option<PathBuf>,
}

async fn run(args: &Cli) -> Result<()> {
    let input = match &args.input {
        Some(input) => input.clone(),
        None => std::env::current_dir()?,
    };
    let config = Config::load(args.config.as_deref())?;
    debug!(config = ?config, "loaded config");

    let extractor = ExifToolExtractor::new(&config.exiftool);
    place::process(&input, &config, &extractor, args.test).await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Cli::parse();
    if let Err(e) = setup_tracing(args.verbose, args.logfile.as_deref()) {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
    debug!("args: {:#?}", args);

    if let Err(e) = run(&args).await {
        error!("process error: {:#}", e);
        std::process::exit(1);
    }
}
