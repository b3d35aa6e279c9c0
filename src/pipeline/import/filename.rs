//! File basename codec shared by the relocator and the importer:
//! `<first>_<last>_<referrer>.<ext>`, spaces in names written as `_`.

use crate::models::PatientIdentity;
use super::ImportError;

/// Basename (without extension) the generator uses for a patient.
pub fn encode(identity: &PatientIdentity) -> String {
    format!(
        "{}_{}_{}",
        identity.first_name.replace(' ', "_"),
        identity.last_name.replace(' ', "_"),
        identity.referrer_id
    )
}

/// Recover the identity from a file name.
///
/// The last token is the referrer id and the one before it the last name;
/// everything in front is the first name, re-joined with single spaces so
/// multi-word first names survive.
pub fn decode(filename: &str) -> Result<PatientIdentity, ImportError> {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _ext)| stem)
        .unwrap_or(filename);

    let tokens: Vec<&str> = stem.split('_').collect();
    if tokens.len() < 3 {
        return Err(ImportError::MalformedFilename(filename.to_string()));
    }

    let referrer_id = tokens[tokens.len() - 1];
    let last_name = tokens[tokens.len() - 2];
    let first_name = tokens[..tokens.len() - 2].join(" ");

    if first_name.is_empty() || last_name.is_empty() || referrer_id.is_empty() {
        return Err(ImportError::MalformedFilename(filename.to_string()));
    }

    Ok(PatientIdentity::new(first_name, last_name, referrer_id))
}
