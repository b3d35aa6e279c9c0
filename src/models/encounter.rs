use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder rendered for descriptions and dates missing from a document.
pub const UNKNOWN: &str = "Unknown";

/// One `encounter` entry from a CCDA Encounters section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterRecord {
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl EncounterRecord {
    pub fn start_label(&self) -> String {
        date_label(self.start_date)
    }

    pub fn end_label(&self) -> String {
        date_label(self.end_date)
    }
}

/// Encounter matched against `form_encounter` for a given patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEncounter {
    pub date: NaiveDate,
    pub encounter_id: i64,
}

fn date_label(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| UNKNOWN.to_string())
}
