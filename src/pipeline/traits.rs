//! Storage seams for the import and relocation passes.
//!
//! - PatientLookup: patient and encounter id resolution
//! - NoteStore: writes plus run-scoped transaction control
//! - PatientDirectory: the patient roster the relocator walks

use chrono::NaiveDate;

use crate::db::DatabaseError;
use crate::models::{ImportRecord, PatientIdentity};

pub trait PatientLookup {
    /// Patient id for an exact identity match, first row wins.
    fn find_patient_id(&self, identity: &PatientIdentity) -> Result<Option<i64>, DatabaseError>;

    /// Encounter id for a patient whose stored date begins with `date`.
    fn find_encounter_id(&self, patient_id: i64, date: NaiveDate)
        -> Result<Option<i64>, DatabaseError>;
}

pub trait NoteStore: PatientLookup {
    /// Write one form and its clinical note. Returns the form id.
    fn persist_note(&self, record: &ImportRecord) -> Result<i64, DatabaseError>;

    /// Open the single transaction that spans a whole run.
    fn begin_run(&self) -> Result<(), DatabaseError>;

    fn commit_run(&self) -> Result<(), DatabaseError>;

    fn rollback_run(&self) -> Result<(), DatabaseError>;
}

pub trait PatientDirectory {
    fn list_patients(&self) -> Result<Vec<PatientIdentity>, DatabaseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify traits are object-safe (can be used as `dyn Trait`)
    #[test]
    fn traits_are_object_safe() {
        fn _assert_lookup(_: &dyn PatientLookup) {}
        fn _assert_store(_: &dyn NoteStore) {}
        fn _assert_directory(_: &dyn PatientDirectory) {}
    }
}
