use std::path::{Path, PathBuf};

use crate::config::{LogConfig, MigrationConfig, APP_VERSION};
use crate::db::{self, SqliteNoteStore};
use crate::models::ImportRecord;
use crate::pipeline::traits::NoteStore;
use super::ccda::extract_encounters;
use super::filename;
use super::notes::load_notes;
use super::resolver::{resolve_encounter_id, resolve_patient_id};
use super::summary::RunSummary;
use super::ImportError;

/// Directories and switches for one import pass.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub ccda_dir: PathBuf,
    pub notes_dir: PathBuf,
    /// Run every insert, then roll the whole run back.
    pub dry_run: bool,
}

impl ImportOptions {
    pub fn from_config(config: &MigrationConfig) -> Self {
        Self {
            ccda_dir: config.ccda_dir.clone(),
            notes_dir: config.notes_dir.clone(),
            dry_run: false,
        }
    }
}

/// Open the EHR database named in the config. Failure here aborts the run.
pub fn connect(config: &MigrationConfig) -> Result<SqliteNoteStore, ImportError> {
    let conn = db::open_database(&config.database_path).map_err(ImportError::StorageConnection)?;
    Ok(SqliteNoteStore::new(conn, config.form_defaults.clone()))
}

/// Drives one pass over a directory of CCDA files.
pub struct ImportRunner<'a> {
    store: &'a dyn NoteStore,
    options: ImportOptions,
    log: LogConfig,
}

impl<'a> ImportRunner<'a> {
    pub fn new(store: &'a dyn NoteStore, options: ImportOptions, log: LogConfig) -> Self {
        Self { store, options, log }
    }

    /// Import every `*.xml` file in the CCDA directory.
    ///
    /// Per-file failures are counted and logged; only storage failures
    /// around the run transaction end the run early.
    pub fn run(&self) -> Result<RunSummary, ImportError> {
        let dispatch = self.log.dispatch();
        tracing::dispatcher::with_default(&dispatch, || self.run_pass())
    }

    fn run_pass(&self) -> Result<RunSummary, ImportError> {
        let files = list_ccda_files(&self.options.ccda_dir)?;
        let mut summary = RunSummary::new(files.len());
        let progress_interval = self.log.progress_interval.max(1);

        tracing::info!(
            ccda_dir = %self.options.ccda_dir.display(),
            notes_dir = %self.options.notes_dir.display(),
            files = files.len(),
            dry_run = self.options.dry_run,
            version = APP_VERSION,
            "Starting clinical note import"
        );

        self.store.begin_run()?;

        for path in &files {
            summary.seen += 1;
            let file = display_name(path);

            match self.import_file(path, &mut summary) {
                Ok(notes) => {
                    tracing::debug!(file = %file, notes, "File imported");
                    summary.record_processed(notes);
                }
                Err(e) => {
                    let reason = e.skip_reason();
                    match &e {
                        ImportError::DocumentParse { .. }
                        | ImportError::Io(_)
                        | ImportError::Database(_) => {
                            tracing::error!(file = %file, reason = %reason, error = %e, "Skipping file");
                        }
                        _ => {
                            tracing::warn!(file = %file, reason = %reason, error = %e, "Skipping file");
                        }
                    }
                    summary.record_skip(reason);
                }
            }

            if summary.seen % progress_interval == 0 {
                tracing::info!("Processed {}/{} files", summary.seen, summary.total_files);
            }
        }

        if self.options.dry_run {
            self.store.rollback_run()?;
            tracing::warn!(
                notes = summary.notes_inserted,
                "Dry run: all inserts rolled back"
            );
        } else {
            self.store.commit_run()?;
            summary.committed = true;
        }

        tracing::info!(
            "Processing complete. Total files: {}, Processed: {}, Skipped: {}",
            summary.total_files,
            summary.processed,
            summary.skipped
        );
        tracing::info!("Skip reasons: {}", summary.skip_reasons);

        Ok(summary)
    }

    /// Import one CCDA file. Returns the number of notes written.
    fn import_file(&self, path: &Path, summary: &mut RunSummary) -> Result<usize, ImportError> {
        let file = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ImportError::MalformedFilename(path.display().to_string()))?;

        let identity = filename::decode(file)?;
        let patient_id = resolve_patient_id(self.store, &identity)?;
        tracing::debug!(file = %file, pid = patient_id, patient = %identity, "Patient resolved");

        let encounters = extract_encounters(path)?;
        if encounters.is_empty() {
            return Err(ImportError::NoEncounters(file.to_string()));
        }

        let notes_path = self.options.notes_dir.join(Path::new(file).with_extension("txt"));
        if !notes_path.exists() {
            return Err(ImportError::NotesFileMissing(notes_path));
        }
        let notes = load_notes(&notes_path)?;

        let mut persisted = 0;
        for encounter in &encounters {
            tracing::debug!(
                file = %file,
                description = %encounter.description,
                start = %encounter.start_label(),
                end = %encounter.end_label(),
                "Encounter found"
            );
            let Some(date) = encounter.start_date else {
                tracing::warn!(
                    file = %file,
                    pid = patient_id,
                    description = %encounter.description,
                    "Encounter has no start date"
                );
                summary.unresolved_encounters += 1;
                continue;
            };

            let resolved = match resolve_encounter_id(self.store, patient_id, date) {
                Ok(resolved) => resolved,
                Err(e @ ImportError::EncounterNotFound { .. }) => {
                    tracing::warn!(file = %file, pid = patient_id, date = %date, error = %e, "Encounter not resolved");
                    summary.unresolved_encounters += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Some(body) = notes.get(&resolved.date) else {
                tracing::debug!(file = %file, date = %date, "No note written for encounter date");
                continue;
            };

            let record = ImportRecord::new(patient_id, &resolved, body.as_str());
            let form_id = self.store.persist_note(&record)?;
            tracing::debug!(
                file = %file,
                pid = patient_id,
                encounter = resolved.encounter_id,
                form_id,
                date = %date,
                "Clinical note inserted"
            );
            persisted += 1;
        }

        if persisted == 0 {
            return Err(ImportError::NothingImported(file.to_string()));
        }
        Ok(persisted)
    }
}

/// `*.xml` files in a directory, sorted by name.
fn list_ccda_files(dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "xml") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::NaiveDate;

    use super::*;
    use crate::config::FormDefaults;
    use crate::db::{
        count_forms, insert_encounter, insert_patient, list_clinical_notes, open_memory_database,
    };
    use crate::db::DatabaseError;
    use crate::models::{PatientIdentity, SkipReason};
    use crate::pipeline::traits::{PatientDirectory, PatientLookup};

    struct Fixture {
        _dir: tempfile::TempDir,
        options: ImportOptions,
        store: SqliteNoteStore,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let ccda_dir = dir.path().join("moved_ccda");
            let notes_dir = dir.path().join("moved_notes");
            std::fs::create_dir_all(&ccda_dir).unwrap();
            std::fs::create_dir_all(&notes_dir).unwrap();
            let store =
                SqliteNoteStore::new(open_memory_database().unwrap(), FormDefaults::default());
            Self {
                _dir: dir,
                options: ImportOptions { ccda_dir, notes_dir, dry_run: false },
                store,
            }
        }

        fn patient(&self, pid: i64, first: &str, last: &str, referrer: &str) {
            insert_patient(self.store.connection(), pid, &PatientIdentity::new(first, last, referrer))
                .unwrap();
        }

        fn encounter(&self, pid: i64, encounter: i64, date: &str) {
            insert_encounter(self.store.connection(), pid, encounter, date, None).unwrap();
        }

        fn ccda(&self, name: &str, low_values: &[&str]) {
            std::fs::write(self.options.ccda_dir.join(name), ccda_document(low_values)).unwrap();
        }

        fn notes(&self, name: &str, content: &str) {
            std::fs::write(self.options.notes_dir.join(name), content).unwrap();
        }

        fn run(&self) -> RunSummary {
            ImportRunner::new(&self.store, self.options.clone(), quiet()).run().unwrap()
        }
    }

    fn quiet() -> LogConfig {
        LogConfig { filter: "off".into(), ..LogConfig::default() }
    }

    /// An empty `low` value writes an encounter with no `effectiveTime`.
    fn ccda_document(low_values: &[&str]) -> String {
        let entries: String = low_values
            .iter()
            .map(|low| {
                let time = if low.is_empty() {
                    String::new()
                } else {
                    format!(r#"<effectiveTime><low value="{low}"/><high value="{low}"/></effectiveTime>"#)
                };
                format!(
                    r#"<entry><encounter classCode="ENC" moodCode="EVN">
  <code code="185349003" displayName="Encounter for check up"/>
  {time}
</encounter></entry>"#
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0"?>
<ClinicalDocument xmlns="urn:hl7-org:v3">
  <component><structuredBody><component><section>
    <code code="46240-8" displayName="History of encounters"/>
    {entries}
  </section></component></structuredBody></component>
</ClinicalDocument>"#
        )
    }

    #[test]
    fn end_to_end_single_note() {
        let fx = Fixture::new();
        fx.patient(42, "John", "Smith", "7");
        fx.encounter(42, 9001, "2023-04-15 10:15:00");
        fx.ccda("John_Smith_7.xml", &["20230415101500"]);
        fx.notes("John_Smith_7.txt", "2023-04-15\nPatient seen for annual exam.\nVitals normal.\n");

        let summary = fx.run();

        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.notes_inserted, 1);
        assert!(summary.committed);

        let notes = list_clinical_notes(fx.store.connection(), 42).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].encounter_id, 9001);
        assert_eq!(notes[0].date, "2023-04-15");
        assert_eq!(notes[0].description, "Patient seen for annual exam.\nVitals normal.");
        assert_eq!(notes[0].user, "admin");
        assert_eq!(count_forms(fx.store.connection()).unwrap(), 1);
    }

    #[test]
    fn partial_success_counts_as_processed() {
        let fx = Fixture::new();
        fx.patient(42, "John", "Smith", "7");
        fx.encounter(42, 9001, "2023-04-15 10:15:00");
        fx.encounter(42, 9002, "2023-05-20 09:00:00");
        fx.ccda(
            "John_Smith_7.xml",
            &["20230415101500", "20230520090000", "20230601120000"],
        );
        // 2023-05-20 resolves but has no note; 2023-06-01 has a note but no encounter
        fx.notes("John_Smith_7.txt", "2023-04-15\nSeen.\n2023-06-01\nPhone call.\n");

        let summary = fx.run();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.notes_inserted, 1);
        assert_eq!(summary.unresolved_encounters, 1);
        assert_eq!(list_clinical_notes(fx.store.connection(), 42).unwrap().len(), 1);
    }

    #[test]
    fn unknown_patient_skipped_as_no_pid() {
        let fx = Fixture::new();
        fx.ccda("Jane_Doe_3.xml", &["20230415101500"]);
        fx.notes("Jane_Doe_3.txt", "2023-04-15\nBody\n");

        let summary = fx.run();
        assert_eq!(summary.skip_reasons.get(SkipReason::NoPid), 1);
        assert_eq!(summary.processed, 0);
    }

    #[test]
    fn missing_notes_file_skipped_as_no_notes() {
        let fx = Fixture::new();
        fx.patient(42, "John", "Smith", "7");
        fx.encounter(42, 9001, "2023-04-15");
        fx.ccda("John_Smith_7.xml", &["20230415101500"]);

        let summary = fx.run();
        assert_eq!(summary.skip_reasons.get(SkipReason::NoNotes), 1);
    }

    #[test]
    fn no_matching_note_dates_skipped_as_no_encounters() {
        let fx = Fixture::new();
        fx.patient(42, "John", "Smith", "7");
        fx.encounter(42, 9001, "2023-04-15");
        fx.ccda("John_Smith_7.xml", &["20230415101500"]);
        fx.notes("John_Smith_7.txt", "2023-04-16\nWrong day.\n");

        let summary = fx.run();
        assert_eq!(summary.skip_reasons.get(SkipReason::NoEncounters), 1);
        assert_eq!(count_forms(fx.store.connection()).unwrap(), 0);
    }

    #[test]
    fn unparseable_document_skipped_and_run_continues() {
        let fx = Fixture::new();
        fx.patient(42, "John", "Smith", "7");
        fx.patient(43, "Ana", "Lopez", "8");
        fx.encounter(43, 9100, "2023-04-15 08:00:00");
        std::fs::write(fx.options.ccda_dir.join("John_Smith_7.xml"), "<ClinicalDocument>").unwrap();
        fx.ccda("Ana_Lopez_8.xml", &["20230415080000"]);
        fx.notes("Ana_Lopez_8.txt", "2023-04-15\nNote.\n");

        let summary = fx.run();
        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skip_reasons.get(SkipReason::NoEncounters), 1);
    }

    #[test]
    fn unreadable_notes_counted_as_other_error_and_run_continues() {
        let fx = Fixture::new();
        fx.patient(42, "John", "Smith", "7");
        fx.patient(43, "Ana", "Lopez", "8");
        fx.encounter(42, 9001, "2023-04-15 10:15:00");
        fx.encounter(43, 9100, "2023-04-15 08:00:00");
        fx.ccda("Ana_Lopez_8.xml", &["20230415080000"]);
        fx.notes("Ana_Lopez_8.txt", "2023-04-15\nNote.\n");
        fx.ccda("John_Smith_7.xml", &["20230415101500"]);
        // a directory where the note file should be fails the read
        std::fs::create_dir_all(fx.options.notes_dir.join("John_Smith_7.txt")).unwrap();

        let summary = fx.run();

        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.skip_reasons.get(SkipReason::OtherError), 1);
        assert!(summary.committed);
        assert_eq!(count_forms(fx.store.connection()).unwrap(), 1);
        assert_eq!(list_clinical_notes(fx.store.connection(), 43).unwrap().len(), 1);
    }

    #[test]
    fn encounter_without_start_date_counted_unresolved() {
        let fx = Fixture::new();
        fx.patient(42, "John", "Smith", "7");
        fx.encounter(42, 9001, "2023-04-15 10:15:00");
        fx.ccda("John_Smith_7.xml", &["", "20230415101500"]);
        fx.notes("John_Smith_7.txt", "2023-04-15\nSeen.\n");

        let summary = fx.run();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.unresolved_encounters, 1);
        assert_eq!(summary.notes_inserted, 1);
    }

    #[test]
    fn only_undated_encounters_skipped_as_no_encounters() {
        let fx = Fixture::new();
        fx.patient(42, "John", "Smith", "7");
        fx.ccda("John_Smith_7.xml", &[""]);
        fx.notes("John_Smith_7.txt", "2023-04-15\nSeen.\n");

        let summary = fx.run();

        assert_eq!(summary.unresolved_encounters, 1);
        assert_eq!(summary.skip_reasons.get(SkipReason::NoEncounters), 1);
        assert_eq!(count_forms(fx.store.connection()).unwrap(), 0);
    }

    #[test]
    fn connect_rejects_database_without_ehr_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.db");
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE unrelated (x INTEGER)")
            .unwrap();
        let config = MigrationConfig { database_path: path, ..MigrationConfig::default() };

        assert!(matches!(connect(&config), Err(ImportError::StorageConnection(_))));
    }

    #[test]
    fn non_xml_files_ignored() {
        let fx = Fixture::new();
        std::fs::write(fx.options.ccda_dir.join("README.md"), "notes").unwrap();
        std::fs::write(fx.options.ccda_dir.join("John_Smith_7.XML.bak"), "x").unwrap();

        let summary = fx.run();
        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.seen, 0);
    }

    #[test]
    fn dry_run_rolls_back_inserts() {
        let mut fx = Fixture::new();
        fx.options.dry_run = true;
        fx.patient(42, "John", "Smith", "7");
        fx.encounter(42, 9001, "2023-04-15 10:15:00");
        fx.ccda("John_Smith_7.xml", &["20230415101500"]);
        fx.notes("John_Smith_7.txt", "2023-04-15\nBody\n");

        let summary = fx.run();
        assert_eq!(summary.notes_inserted, 1);
        assert!(!summary.committed);
        assert_eq!(count_forms(fx.store.connection()).unwrap(), 0);
        // patient rows seeded before the run are untouched
        assert_eq!(fx.store.list_patients().unwrap().len(), 1);
    }

    #[test]
    fn missing_ccda_dir_fails_run() {
        let mut fx = Fixture::new();
        fx.options.ccda_dir = fx.options.ccda_dir.join("absent");
        let result = ImportRunner::new(&fx.store, fx.options.clone(), quiet()).run();
        assert!(matches!(result, Err(ImportError::Io(_))));
    }

    #[test]
    fn connect_to_missing_database_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = MigrationConfig {
            database_path: dir.path().join("absent.db"),
            ..MigrationConfig::default()
        };
        assert!(matches!(connect(&config), Err(ImportError::StorageConnection(_))));
    }

    /// Store that records lookups and writes nothing.
    #[derive(Default)]
    struct CountingStore {
        patient_lookups: Cell<usize>,
    }

    impl PatientLookup for CountingStore {
        fn find_patient_id(&self, _: &PatientIdentity) -> Result<Option<i64>, DatabaseError> {
            self.patient_lookups.set(self.patient_lookups.get() + 1);
            Ok(None)
        }

        fn find_encounter_id(&self, _: i64, _: NaiveDate) -> Result<Option<i64>, DatabaseError> {
            Ok(None)
        }
    }

    impl NoteStore for CountingStore {
        fn persist_note(&self, _: &ImportRecord) -> Result<i64, DatabaseError> {
            Ok(1)
        }

        fn begin_run(&self) -> Result<(), DatabaseError> {
            Ok(())
        }

        fn commit_run(&self) -> Result<(), DatabaseError> {
            Ok(())
        }

        fn rollback_run(&self) -> Result<(), DatabaseError> {
            Ok(())
        }
    }

    #[test]
    fn malformed_filename_never_reaches_patient_lookup() {
        let fx = Fixture::new();
        fx.ccda("Smith_7.xml", &["20230415101500"]);
        fx.ccda("summary.xml", &["20230415101500"]);

        let store = CountingStore::default();
        let summary = ImportRunner::new(&store, fx.options.clone(), quiet()).run().unwrap();

        assert_eq!(summary.skip_reasons.get(SkipReason::NoPid), 2);
        assert_eq!(store.patient_lookups.get(), 0);
    }
}
