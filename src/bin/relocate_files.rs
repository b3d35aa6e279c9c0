use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use notebridge_lib::config::MigrationConfig;
use notebridge_lib::pipeline::relocate::{load_patients, Relocator};

/// Copy generated CCDA and note files into the import staging folders
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ~/.notebridge/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// EHR database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Generator output root holding ccda/ and notes/
    #[arg(long)]
    base_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MigrationConfig::load(path),
        None => MigrationConfig::load_default(),
    }
    .context("Failed to load configuration")?;

    if let Some(path) = args.database {
        config.database_path = path;
    }
    if let Some(path) = args.base_path {
        config.relocation.base_path = path;
    }
    if args.verbose {
        config.log.filter = "debug".into();
    }

    let patients = load_patients(&config).context("Connection to the EHR database failed")?;
    let summary = Relocator::from_config(&config)
        .run(&patients)
        .context("Relocation failed")?;

    println!("\n{summary}");
    Ok(())
}
