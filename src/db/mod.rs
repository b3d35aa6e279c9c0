pub mod repository;
pub mod sqlite;
pub mod store;

pub use repository::*;
pub use sqlite::*;
pub use store::SqliteNoteStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cannot open database {path}: {reason}")]
    ConnectionFailed { path: String, reason: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },
}
