use chrono::NaiveDate;

use crate::models::{PatientIdentity, ResolvedEncounter};
use crate::pipeline::traits::PatientLookup;
use super::ImportError;

pub fn resolve_patient_id<L: PatientLookup + ?Sized>(
    lookup: &L,
    identity: &PatientIdentity,
) -> Result<i64, ImportError> {
    lookup
        .find_patient_id(identity)?
        .ok_or_else(|| ImportError::PatientNotFound {
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            referrer_id: identity.referrer_id.clone(),
        })
}

pub fn resolve_encounter_id<L: PatientLookup + ?Sized>(
    lookup: &L,
    patient_id: i64,
    date: NaiveDate,
) -> Result<ResolvedEncounter, ImportError> {
    let encounter_id = lookup
        .find_encounter_id(patient_id, date)?
        .ok_or(ImportError::EncounterNotFound { patient_id, date })?;
    Ok(ResolvedEncounter { date, encounter_id })
}
