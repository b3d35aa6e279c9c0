//! Encounter extraction from CCDA documents.
//!
//! Only the History of Encounters section (LOINC `46240-8`) is read. Other
//! sections and entry types are ignored without error.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use roxmltree::{Document, Node, ParsingOptions};

use crate::models::{EncounterRecord, UNKNOWN};
use super::ImportError;

/// HL7 v3 / CDA namespace.
pub const CDA_NS: &str = "urn:hl7-org:v3";

/// LOINC code of the History of Encounters section.
pub const ENCOUNTERS_SECTION_CODE: &str = "46240-8";

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Read and parse a CCDA file.
pub fn extract_encounters(path: &Path) -> Result<Vec<EncounterRecord>, ImportError> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|e| ImportError::DocumentParse {
        file: file.clone(),
        reason: e.to_string(),
    })?;
    parse_encounters(&text).map_err(|reason| ImportError::DocumentParse { file, reason })
}

/// Encounter records in document order.
pub fn parse_encounters(xml: &str) -> Result<Vec<EncounterRecord>, String> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options).map_err(|e| e.to_string())?;

    let mut encounters = Vec::new();
    for section in doc.descendants().filter(|n| is_cda(n, "section")) {
        if !is_encounters_section(section) {
            continue;
        }
        for entry in section.descendants().filter(|n| is_cda(n, "encounter")) {
            encounters.push(read_encounter(entry)?);
        }
    }
    Ok(encounters)
}

fn is_cda(node: &Node, local_name: &str) -> bool {
    node.is_element() && node.has_tag_name((CDA_NS, local_name))
}

fn is_encounters_section(section: Node) -> bool {
    section
        .children()
        .find(|n| is_cda(n, "code"))
        .and_then(|code| code.attribute("code"))
        == Some(ENCOUNTERS_SECTION_CODE)
}

fn read_encounter(entry: Node) -> Result<EncounterRecord, String> {
    let description = entry
        .descendants()
        .find(|n| is_cda(n, "code"))
        .and_then(|code| code.attribute("displayName"))
        .unwrap_or(UNKNOWN)
        .to_string();

    let effective_time = entry.children().find(|n| is_cda(n, "effectiveTime"));
    let bound = |name: &str| -> Result<Option<NaiveDate>, String> {
        effective_time
            .and_then(|time| time.children().find(|n| is_cda(n, name)))
            .and_then(|node| node.attribute("value"))
            .map(parse_timestamp)
            .transpose()
    };

    Ok(EncounterRecord {
        description,
        start_date: bound("low")?,
        end_date: bound("high")?,
    })
}

/// Calendar date of an HL7 `TS` value.
///
/// Accepts `YYYYMMDDhhmmss` with an optional `+hhmm`/`-hhmm` zone offset,
/// or a bare `YYYYMMDD`. Every other shape is rejected.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    let digits_end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, rest) = raw.split_at(digits_end);

    let parsed = match digits.len() {
        14 if rest.is_empty() || is_zone_offset(rest) => {
            NaiveDateTime::parse_from_str(digits, TIMESTAMP_FORMAT).map(|dt| dt.date())
        }
        8 if rest.is_empty() => NaiveDate::parse_from_str(digits, "%Y%m%d"),
        _ => return Err(format!("unsupported timestamp '{raw}'")),
    };
    parsed.map_err(|e| format!("invalid timestamp '{raw}': {e}"))
}

fn is_zone_offset(s: &str) -> bool {
    let Some(hhmm) = s.strip_prefix(['+', '-']) else {
        return false;
    };
    hhmm.len() == 4 && hhmm.bytes().all(|b| b.is_ascii_digit())
}
