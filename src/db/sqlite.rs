use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use super::DatabaseError;

/// Tables the importer reads from or writes to. The EHR owns them.
pub const REQUIRED_TABLES: [&str; 4] =
    ["patient_data", "form_encounter", "forms", "form_clinical_notes"];

/// Open an existing EHR database.
///
/// The file is never created and its schema is never touched: a missing
/// file, or one lacking any of [`REQUIRED_TABLES`], is a connection failure.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let connection_failed = |reason: String| DatabaseError::ConnectionFailed {
        path: path.display().to_string(),
        reason,
    };

    let conn = Connection::open_with_flags(path, flags)
        .map_err(|e| connection_failed(e.to_string()))?;
    let missing = missing_tables(&conn).map_err(|e| connection_failed(e.to_string()))?;
    if !missing.is_empty() {
        return Err(connection_failed(format!(
            "not an EHR database, missing tables: {}",
            missing.join(", ")
        )));
    }
    Ok(conn)
}

fn missing_tables(conn: &Connection) -> Result<Vec<&'static str>, rusqlite::Error> {
    let mut stmt =
        conn.prepare("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    let mut missing = Vec::new();
    for table in REQUIRED_TABLES {
        let count: i64 = stmt.query_row([table], |row| row.get(0))?;
        if count == 0 {
            missing.push(table);
        }
    }
    Ok(missing)
}

/// Open an in-memory database carrying the EHR tables (for testing)
#[cfg(test)]
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Create the EHR tables in a fixture database
#[cfg(test)]
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![
        (1, include_str!("../../resources/migrations/001_initial.sql")),
    ];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
#[cfg(test)]
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, i64>(0),
    )
    .unwrap_or(0)
}
