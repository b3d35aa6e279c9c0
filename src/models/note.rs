use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::encounter::ResolvedEncounter;

/// Note bodies keyed by the date header that introduced them.
pub type NoteMap = BTreeMap<NaiveDate, String>;

/// One clinical note ready to be written as a `forms` + `form_clinical_notes` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub uuid: Uuid,
    pub patient_id: i64,
    pub encounter_id: i64,
    pub date: NaiveDate,
    pub body: String,
}

impl ImportRecord {
    pub fn new(patient_id: i64, encounter: &ResolvedEncounter, body: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            patient_id,
            encounter_id: encounter.encounter_id,
            date: encounter.date,
            body: body.into(),
        }
    }
}

/// Stored clinical note as read back from `form_clinical_notes`.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalNote {
    pub id: i64,
    pub form_id: i64,
    pub uuid: Option<Uuid>,
    pub date: String,
    pub patient_id: i64,
    pub encounter_id: i64,
    pub user: String,
    pub group_name: String,
    pub description: String,
    pub note_type: String,
}
