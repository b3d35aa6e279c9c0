use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::models::StagedFileKind;
use crate::pipeline::relocate::RelocationTarget;

/// Application-level constants
pub const APP_NAME: &str = "notebridge";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Files between two progress lines in the import log.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Cannot determine home directory")]
    NoHomeDir,
}

/// Default tracing filter when neither `RUST_LOG` nor the config sets one.
pub fn default_log_filter() -> &'static str {
    "info"
}

/// ~/.notebridge/ on all platforms
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(format!(".{APP_NAME}")))
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_data_dir()?.join("config.json"))
}

/// Everything both batch binaries need for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// EHR database file. Must already exist.
    pub database_path: PathBuf,
    /// Staged CCDA documents read by the importer.
    pub ccda_dir: PathBuf,
    /// Staged note files read by the importer.
    pub notes_dir: PathBuf,
    pub relocation: RelocationConfig,
    pub form_defaults: FormDefaults,
    pub log: LogConfig,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("openemr.db"),
            ccda_dir: PathBuf::from("moved_ccda"),
            notes_dir: PathBuf::from("moved_notes"),
            relocation: RelocationConfig::default(),
            form_defaults: FormDefaults::default(),
            log: LogConfig::default(),
        }
    }
}

impl MigrationConfig {
    /// Load config from file, or fall back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&default_config_path()?)
    }
}

/// Where the generator wrote its output and where the importer expects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelocationConfig {
    /// Generator output root; CCDA files live in `ccda/`, notes in `notes/`.
    pub base_path: PathBuf,
    pub ccda_destination: PathBuf,
    pub notes_destination: PathBuf,
}

impl Default for RelocationConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("synthea/output"),
            ccda_destination: PathBuf::from("moved_ccda"),
            notes_destination: PathBuf::from("moved_notes"),
        }
    }
}

impl RelocationConfig {
    pub fn targets(&self) -> Vec<RelocationTarget> {
        vec![
            RelocationTarget {
                kind: StagedFileKind::Ccda,
                source_dir: self.base_path.join("ccda"),
                destination_dir: self.ccda_destination.clone(),
            },
            RelocationTarget {
                kind: StagedFileKind::Notes,
                source_dir: self.base_path.join("notes"),
                destination_dir: self.notes_destination.clone(),
            },
        ]
    }
}

/// Fixed authorship metadata written with every imported note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormDefaults {
    pub form_name: String,
    pub user: String,
    pub group_name: String,
    pub authorized: i32,
    pub form_dir: String,
    pub activity: i32,
    pub note_type: String,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            form_name: "Clinical Notes".into(),
            user: "admin".into(),
            group_name: "Default".into(),
            authorized: 1,
            form_dir: "clinical_notes".into(),
            activity: 1,
            note_type: "Clinical Note".into(),
        }
    }
}

/// Logging setup for a single run. Installed by the runner for the
/// duration of its pass, never as a process-wide default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub filter: String,
    pub progress_interval: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter().into(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl LogConfig {
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter))
    }

    pub fn dispatch(&self) -> tracing::Dispatch {
        tracing::Dispatch::new(
            tracing_subscriber::fmt()
                .with_env_filter(self.env_filter())
                .finish(),
        )
    }
}
