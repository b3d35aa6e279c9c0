//! CCDA note import: one pass over a directory of staged CCDA documents,
//! matching each encounter against the EHR and attaching the note body
//! written for that day.

pub mod ccda;
pub mod filename;
pub mod importer;
pub mod notes;
pub mod resolver;
pub mod summary;

pub use ccda::{extract_encounters, parse_encounters};
pub use importer::{connect, ImportOptions, ImportRunner};
pub use notes::{load_notes, split_notes};
pub use resolver::{resolve_encounter_id, resolve_patient_id};
pub use summary::{RunSummary, SkipCounts};

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::SkipReason;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Filename {0} does not match <first>_<last>_<referrer>.<ext>")]
    MalformedFilename(String),

    #[error("No patient found for {first_name} {last_name} (referrer {referrer_id})")]
    PatientNotFound {
        first_name: String,
        last_name: String,
        referrer_id: String,
    },

    #[error("No encounter found for pid {patient_id} on {date}")]
    EncounterNotFound { patient_id: i64, date: NaiveDate },

    #[error("Could not parse CCDA document {file}: {reason}")]
    DocumentParse { file: String, reason: String },

    #[error("No encounters found in {0}")]
    NoEncounters(String),

    #[error("No encounters imported for {0}")]
    NothingImported(String),

    #[error("No corresponding notes file: {}", .0.display())]
    NotesFileMissing(PathBuf),

    #[error("Storage connection failed: {0}")]
    StorageConnection(#[source] DatabaseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ImportError {
    /// Run-summary bucket a file lands in when this error ends its processing.
    pub fn skip_reason(&self) -> SkipReason {
        match self {
            Self::MalformedFilename(_) | Self::PatientNotFound { .. } => SkipReason::NoPid,
            Self::DocumentParse { .. } | Self::NoEncounters(_) | Self::NothingImported(_) => {
                SkipReason::NoEncounters
            }
            Self::NotesFileMissing(_) => SkipReason::NoNotes,
            Self::EncounterNotFound { .. }
            | Self::StorageConnection(_)
            | Self::Io(_)
            | Self::Database(_) => SkipReason::OtherError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_reasons_by_error() {
        assert_eq!(
            ImportError::MalformedFilename("x.xml".into()).skip_reason(),
            SkipReason::NoPid
        );
        assert_eq!(
            ImportError::PatientNotFound {
                first_name: "A".into(),
                last_name: "B".into(),
                referrer_id: "1".into(),
            }
            .skip_reason(),
            SkipReason::NoPid
        );
        assert_eq!(
            ImportError::DocumentParse { file: "a.xml".into(), reason: "eof".into() }
                .skip_reason(),
            SkipReason::NoEncounters
        );
        assert_eq!(
            ImportError::NotesFileMissing(PathBuf::from("a.txt")).skip_reason(),
            SkipReason::NoNotes
        );
        assert_eq!(
            ImportError::Io(std::io::Error::other("disk")).skip_reason(),
            SkipReason::OtherError
        );
    }
}
