//! Splits a generated notes file into per-day note bodies.
//!
//! A note starts at a line holding nothing but an ISO date (`YYYY-MM-DD`)
//! and runs until the next such line.

use std::path::Path;

use chrono::NaiveDate;

use crate::models::NoteMap;
use super::ImportError;

pub fn load_notes(path: &Path) -> Result<NoteMap, ImportError> {
    let bytes = std::fs::read(path)?;
    Ok(split_notes(&String::from_utf8_lossy(&bytes)))
}

/// Later blocks for the same date replace earlier ones. Text ahead of the
/// first header belongs to no date and is dropped.
pub fn split_notes(content: &str) -> NoteMap {
    let mut notes = NoteMap::new();
    let mut current: Option<(NaiveDate, Vec<&str>)> = None;

    for line in content.lines() {
        match parse_header(line) {
            Some(date) => {
                if let Some((open_date, body)) = current.take() {
                    notes.insert(open_date, body.join("\n"));
                }
                current = Some((date, Vec::new()));
            }
            None => {
                if let Some((_, body)) = current.as_mut() {
                    body.push(line);
                }
            }
        }
    }

    if let Some((open_date, body)) = current {
        notes.insert(open_date, body.join("\n"));
    }
    notes
}

/// A header is exactly `YYYY-MM-DD` once trimmed, and must be a real date.
fn parse_header(line: &str) -> Option<NaiveDate> {
    let trimmed = line.trim();
    if trimmed.len() != 10 || trimmed.split('-').count() != 3 {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}
