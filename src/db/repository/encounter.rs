use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::db::DatabaseError;

/// Encounter id for a patient on a calendar day.
///
/// `form_encounter.date` usually carries a time component, so the match is
/// a prefix match on `YYYY-MM-DD`.
pub fn find_encounter_id(
    conn: &Connection,
    pid: i64,
    date: NaiveDate,
) -> Result<Option<i64>, DatabaseError> {
    let result = conn.query_row(
        "SELECT encounter FROM form_encounter
         WHERE pid = ?1 AND date LIKE ?2
         ORDER BY id LIMIT 1",
        params![pid, format!("{date}%")],
        |row| row.get::<_, i64>(0),
    );

    match result {
        Ok(encounter) => Ok(Some(encounter)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
pub fn insert_encounter(
    conn: &Connection,
    pid: i64,
    encounter: i64,
    date: &str,
    reason: Option<&str>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO form_encounter (date, reason, pid, encounter) VALUES (?1, ?2, ?3, ?4)",
        params![date, reason, pid, encounter],
    )?;
    Ok(())
}
