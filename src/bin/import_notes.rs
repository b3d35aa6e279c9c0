use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use notebridge_lib::config::MigrationConfig;
use notebridge_lib::pipeline::import::{connect, ImportOptions, ImportRunner};

/// Import clinical notes for every staged CCDA document
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ~/.notebridge/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// EHR database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Directory of staged CCDA documents
    #[arg(long)]
    ccda_dir: Option<PathBuf>,

    /// Directory of staged note files
    #[arg(long)]
    notes_dir: Option<PathBuf>,

    /// Run all inserts, then roll them back
    #[arg(long)]
    dry_run: bool,

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
    if let Some(dir) = args.ccda_dir {
        config.ccda_dir = dir;
    }
    if let Some(dir) = args.notes_dir {
        config.notes_dir = dir;
    }
    if args.verbose {
        config.log.filter = "debug".into();
    }

    let store = connect(&config).context("Connection to the EHR database failed")?;

    let options = ImportOptions {
        dry_run: args.dry_run,
        ..ImportOptions::from_config(&config)
    };
    let summary = ImportRunner::new(&store, options, config.log.clone())
        .run()
        .context("Import run failed")?;

    println!("{summary}");
    Ok(())
}
