/**
 * Per-file outcomes and the end-of-run report
 */

use chrono::{NaiveDateTime, Timelike};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::file_ops::TransferMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The capture date was written.
    Updated(NaiveDateTime),
    /// The stored capture date already matched the allocated one.
    AlreadySet(NaiveDateTime),
    /// The file was placed in the export folder.
    Exported(PathBuf),
    Skipped(String),
    Errored(String),
}

/// Which batch produced a report; selects the counters in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    SetDates,
    Export(TransferMode),
}

#[derive(Debug)]
pub struct RunReport {
    pub kind: RunKind,
    pub updated: usize,
    pub already_set: usize,
    pub exported: usize,
    pub skipped: Vec<(PathBuf, String)>,
    pub errors: Vec<(PathBuf, String)>,
}

impl RunReport {
    pub fn new(kind: RunKind) -> Self {
        Self {
            kind,
            updated: 0,
            already_set: 0,
            exported: 0,
            skipped: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record(&mut self, file_path: &Path, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Updated(_) => self.updated += 1,
            FileOutcome::AlreadySet(_) => self.already_set += 1,
            FileOutcome::Exported(_) => self.exported += 1,
            FileOutcome::Skipped(reason) => self.skipped.push((file_path.to_path_buf(), reason.clone())),
            FileOutcome::Errored(error) => self.errors.push((file_path.to_path_buf(), error.clone())),
        }
    }

    pub fn total(&self) -> usize {
        self.updated + self.already_set + self.exported + self.skipped.len() + self.errors.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn summary_line(&self) -> String {
        match self.kind {
            RunKind::SetDates => format!(
                "Summary: {} updated, {} already set, {} skipped, {} errors",
                self.updated,
                self.already_set,
                self.skipped.len(),
                self.errors.len()
            ),
            RunKind::Export(mode) => {
                let verb = match mode {
                    TransferMode::Copy => "copied",
                    TransferMode::Move => "moved",
                };
                format!(
                    "Summary: {} {}, {} skipped, {} errors",
                    self.exported,
                    verb,
                    self.skipped.len(),
                    self.errors.len()
                )
            }
        }
    }

    /// Tally line followed by the itemised skipped and error listings.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.summary_line());

        if !self.skipped.is_empty() {
            let _ = writeln!(out, "\n=== SKIPPED FILES ===");
            for (file, reason) in &self.skipped {
                let _ = writeln!(out, "  {}", file.display());
                let _ = writeln!(out, "    Reason: {}", reason);
            }
        }

        if !self.errors.is_empty() {
            let _ = writeln!(out, "\n=== ERROR FILES ===");
            for (file, error) in &self.errors {
                let _ = writeln!(out, "  {}", file.display());
                let _ = writeln!(out, "    Error: {}", error);
            }
        }
        out
    }
}

/// One console line for a processed file, e.g. `[3/10] ✓ Set date 2021-06-01 00:00:02: a/b.jpg`.
pub fn format_outcome_line(index: usize, total: usize, file_path: &Path, outcome: &FileOutcome) -> String {
    let prefix = format!("[{}/{}]", index, total);
    match outcome {
        FileOutcome::Updated(ts) => {
            format!("{} ✓ Set date {}: {}", prefix, format_timestamp(ts), file_path.display())
        }
        FileOutcome::AlreadySet(ts) => {
            format!("{} = Already set {}: {}", prefix, format_timestamp(ts), file_path.display())
        }
        FileOutcome::Exported(dest) => {
            let name = dest.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            format!("{} ✓ Exported: {} -> {}", prefix, file_path.display(), name)
        }
        FileOutcome::Skipped(reason) => {
            format!("{} - Skipped ({}): {}", prefix, reason, file_path.display())
        }
        FileOutcome::Errored(error) => {
            format!("{} ✗ Error: {}: {}", prefix, file_path.display(), error)
        }
    }
}

fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }
}
