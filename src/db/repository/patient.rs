use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::PatientIdentity;

/// Exact match on first name, last name and referrer id.
/// Duplicate rows are not disambiguated: the first one wins.
pub fn find_patient_id(
    conn: &Connection,
    identity: &PatientIdentity,
) -> Result<Option<i64>, DatabaseError> {
    let result = conn.query_row(
        "SELECT pid FROM patient_data
         WHERE fname = ?1 AND lname = ?2 AND referrerID = ?3
         ORDER BY id LIMIT 1",
        params![identity.first_name, identity.last_name, identity.referrer_id],
        |row| row.get::<_, i64>(0),
    );

    match result {
        Ok(pid) => Ok(Some(pid)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_patients(conn: &Connection) -> Result<Vec<PatientIdentity>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT fname, lname, referrerID FROM patient_data ORDER BY id"
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(PatientIdentity {
            first_name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
            last_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            referrer_id: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        })
    })?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(row?);
    }
    Ok(patients)
}

/// Seed a `patient_data` row. The EHR owns patient registration.
#[cfg(test)]
pub fn insert_patient(
    conn: &Connection,
    pid: i64,
    identity: &PatientIdentity,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patient_data (pid, fname, lname, referrerID) VALUES (?1, ?2, ?3, ?4)",
        params![pid, identity.first_name, identity.last_name, identity.referrer_id],
    )?;
    Ok(())
}
