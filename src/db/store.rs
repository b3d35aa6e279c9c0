//! SQLite-backed implementation of the pipeline storage traits.

use chrono::NaiveDate;
use rusqlite::Connection;

use super::{repository, DatabaseError};
use crate::config::FormDefaults;
use crate::models::{ImportRecord, PatientIdentity};
use crate::pipeline::traits::{NoteStore, PatientDirectory, PatientLookup};

/// Holds the one storage session used for a whole run.
pub struct SqliteNoteStore {
    conn: Connection,
    defaults: FormDefaults,
}

impl SqliteNoteStore {
    pub fn new(conn: Connection, defaults: FormDefaults) -> Self {
        Self { conn, defaults }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl PatientLookup for SqliteNoteStore {
    fn find_patient_id(&self, identity: &PatientIdentity) -> Result<Option<i64>, DatabaseError> {
        repository::find_patient_id(&self.conn, identity)
    }

    fn find_encounter_id(
        &self,
        patient_id: i64,
        date: NaiveDate,
    ) -> Result<Option<i64>, DatabaseError> {
        repository::find_encounter_id(&self.conn, patient_id, date)
    }
}

impl NoteStore for SqliteNoteStore {
    /// Writes the `forms` row and its note under a savepoint, so a failed
    /// note insert leaves no orphan form in the run transaction.
    fn persist_note(&self, record: &ImportRecord) -> Result<i64, DatabaseError> {
        self.conn.execute_batch("SAVEPOINT persist_note")?;
        let written = repository::insert_form(&self.conn, record, &self.defaults).and_then(
            |form_id| {
                repository::insert_clinical_note(&self.conn, form_id, record, &self.defaults)?;
                Ok(form_id)
            },
        );

        match written {
            Ok(form_id) => {
                self.conn.execute_batch("RELEASE persist_note")?;
                Ok(form_id)
            }
            Err(e) => {
                self.conn
                    .execute_batch("ROLLBACK TO persist_note; RELEASE persist_note")?;
                Err(e)
            }
        }
    }

    fn begin_run(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch("BEGIN DEFERRED")?;
        Ok(())
    }

    fn commit_run(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback_run(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl PatientDirectory for SqliteNoteStore {
    fn list_patients(&self) -> Result<Vec<PatientIdentity>, DatabaseError> {
        repository::list_patients(&self.conn)
    }
}
