//! Copies generator output into the staging folders the importer reads.
//!
//! For every patient in the EHR the expected basename is rebuilt with the
//! filename codec and looked up once per tracked file kind. Sources are
//! copied, never removed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::{LogConfig, MigrationConfig};
use crate::db::{self, DatabaseError, SqliteNoteStore};
use crate::models::{PatientIdentity, StagedFileKind};
use crate::pipeline::import::filename;
use crate::pipeline::traits::PatientDirectory;

#[derive(Error, Debug)]
pub enum RelocateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage connection failed: {0}")]
    StorageConnection(#[source] DatabaseError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("No patient data found")]
    NoPatients,
}

/// One tracked file kind with its source and staging folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationTarget {
    pub kind: StagedFileKind,
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindTally {
    pub moved: usize,
    pub errors: usize,
    pub not_found: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationSummary {
    pub tallies: BTreeMap<StagedFileKind, KindTally>,
}

impl RelocationSummary {
    pub fn tally(&self, kind: StagedFileKind) -> KindTally {
        self.tallies.get(&kind).copied().unwrap_or_default()
    }

    pub fn total_moved(&self) -> usize {
        self.tallies.values().map(|t| t.moved).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.tallies.values().map(|t| t.errors).sum()
    }

    pub fn total_not_found(&self) -> usize {
        self.tallies.values().map(|t| t.not_found).sum()
    }
}

impl fmt::Display for RelocationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "--------")?;
        for (kind, tally) in &self.tallies {
            writeln!(f)?;
            writeln!(f, "For {} files:", kind.extension())?;
            writeln!(f, "  Moved successfully: {}", tally.moved)?;
            writeln!(f, "  Errors during move: {}", tally.errors)?;
            writeln!(f, "  Files not found: {}", tally.not_found)?;
        }
        writeln!(f)?;
        writeln!(f, "Total files moved: {}", self.total_moved())?;
        writeln!(f, "Total errors: {}", self.total_errors())?;
        write!(f, "Total files not found: {}", self.total_not_found())
    }
}

/// Open the EHR database and read the patient roster, then let the
/// connection go before any file is touched.
pub fn load_patients(config: &MigrationConfig) -> Result<Vec<PatientIdentity>, RelocateError> {
    let conn = db::open_database(&config.database_path).map_err(RelocateError::StorageConnection)?;
    let store = SqliteNoteStore::new(conn, config.form_defaults.clone());
    Ok(store.list_patients()?)
}

pub struct Relocator {
    targets: Vec<RelocationTarget>,
    log: LogConfig,
}

impl Relocator {
    pub fn new(targets: Vec<RelocationTarget>, log: LogConfig) -> Self {
        Self { targets, log }
    }

    pub fn from_config(config: &MigrationConfig) -> Self {
        Self::new(config.relocation.targets(), config.log.clone())
    }

    /// Copy every patient's files. An empty roster is an error.
    pub fn run(&self, patients: &[PatientIdentity]) -> Result<RelocationSummary, RelocateError> {
        let dispatch = self.log.dispatch();
        tracing::dispatcher::with_default(&dispatch, || self.relocate(patients))
    }

    fn relocate(&self, patients: &[PatientIdentity]) -> Result<RelocationSummary, RelocateError> {
        if patients.is_empty() {
            return Err(RelocateError::NoPatients);
        }

        for target in &self.targets {
            std::fs::create_dir_all(&target.destination_dir)?;
        }

        let mut summary = RelocationSummary::default();
        for target in &self.targets {
            summary.tallies.entry(target.kind).or_default();
        }

        tracing::info!(patients = patients.len(), kinds = self.targets.len(), "Relocating files");

        for patient in patients {
            let stem = filename::encode(patient);
            for target in &self.targets {
                let name = format!("{stem}{}", target.kind.extension());
                let source = target.source_dir.join(&name);
                let tally = summary.tallies.entry(target.kind).or_default();

                if !source.exists() {
                    tracing::warn!(path = %source.display(), "File not found");
                    tally.not_found += 1;
                    continue;
                }

                match std::fs::copy(&source, target.destination_dir.join(&name)) {
                    Ok(_) => tally.moved += 1,
                    Err(e) => {
                        tracing::error!(file = %name, error = %e, "Error copying file");
                        tally.errors += 1;
                    }
                }
            }
        }

        tracing::info!(
            moved = summary.total_moved(),
            errors = summary.total_errors(),
            not_found = summary.total_not_found(),
            "Relocation complete"
        );
        Ok(summary)
    }
}
