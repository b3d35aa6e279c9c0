use std::fmt;

use crate::models::SkipReason;

/// Files skipped, by the reason that stopped them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub no_pid: usize,
    pub no_encounters: usize,
    pub no_notes: usize,
    pub other_error: usize,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        *self.slot(reason) += 1;
    }

    pub fn get(&self, reason: SkipReason) -> usize {
        match reason {
            SkipReason::NoPid => self.no_pid,
            SkipReason::NoEncounters => self.no_encounters,
            SkipReason::NoNotes => self.no_notes,
            SkipReason::OtherError => self.other_error,
        }
    }

    pub fn total(&self) -> usize {
        SkipReason::ALL.iter().map(|r| self.get(*r)).sum()
    }

    fn slot(&mut self, reason: SkipReason) -> &mut usize {
        match reason {
            SkipReason::NoPid => &mut self.no_pid,
            SkipReason::NoEncounters => &mut self.no_encounters,
            SkipReason::NoNotes => &mut self.no_notes,
            SkipReason::OtherError => &mut self.other_error,
        }
    }
}

impl fmt::Display for SkipCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = SkipReason::ALL
            .iter()
            .map(|r| format!("{}: {}", r.as_str(), self.get(*r)))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Counters for one import run. Lives for the run only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_files: usize,
    pub seen: usize,
    pub processed: usize,
    pub skipped: usize,
    pub notes_inserted: usize,
    pub unresolved_encounters: usize,
    pub skip_reasons: SkipCounts,
    pub committed: bool,
}

impl RunSummary {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Self::default()
        }
    }

    pub fn record_processed(&mut self, notes: usize) {
        self.processed += 1;
        self.notes_inserted += notes;
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        self.skipped += 1;
        self.skip_reasons.record(reason);
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Processing complete. Total files: {}, Processed: {}, Skipped: {}",
            self.total_files, self.processed, self.skipped
        )?;
        writeln!(f, "Skip reasons: {}", self.skip_reasons)?;
        write!(
            f,
            "Notes inserted: {}, unresolved encounters: {}{}",
            self.notes_inserted,
            self.unresolved_encounters,
            if self.committed { "" } else { " (not committed)" }
        )
    }
}
