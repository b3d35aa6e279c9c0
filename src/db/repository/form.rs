use rusqlite::{params, Connection};

use crate::config::FormDefaults;
use crate::db::DatabaseError;
#[cfg(test)]
use crate::models::ClinicalNote;
use crate::models::ImportRecord;

/// Insert the `forms` row that registers a note against its encounter.
/// Returns the generated form id.
pub fn insert_form(
    conn: &Connection,
    record: &ImportRecord,
    defaults: &FormDefaults,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO forms (date, encounter, form_name, pid, user, groupname, authorized, formdir)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            record.date,
            record.encounter_id,
            defaults.form_name,
            record.patient_id,
            defaults.user,
            defaults.group_name,
            defaults.authorized,
            defaults.form_dir,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert the note body keyed to a form created by [`insert_form`].
pub fn insert_clinical_note(
    conn: &Connection,
    form_id: i64,
    record: &ImportRecord,
    defaults: &FormDefaults,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO form_clinical_notes (form_id, uuid, date, pid, encounter, user, groupname,
         authorized, activity, description, clinical_notes_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            form_id,
            record.uuid,
            record.date,
            record.patient_id,
            record.encounter_id,
            defaults.user,
            defaults.group_name,
            defaults.authorized,
            defaults.activity,
            record.body,
            defaults.note_type,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
pub fn list_clinical_notes(
    conn: &Connection,
    pid: i64,
) -> Result<Vec<ClinicalNote>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, form_id, uuid, date, pid, encounter, user, groupname, description,
         clinical_notes_type
         FROM form_clinical_notes WHERE pid = ?1 ORDER BY id"
    )?;

    let rows = stmt.query_map(params![pid], |row| {
        Ok(ClinicalNote {
            id: row.get(0)?,
            form_id: row.get(1)?,
            uuid: row.get(2)?,
            date: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            patient_id: row.get(4)?,
            encounter_id: row.get(5)?,
            user: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            group_name: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
            description: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
            note_type: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
        })
    })?;

    let mut notes = Vec::new();
    for row in rows {
        notes.push(row?);
    }
    Ok(notes)
}

#[cfg(test)]
pub fn count_forms(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM forms", [], |row| row.get(0))?;
    Ok(count)
}
