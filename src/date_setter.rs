/**
 * Date setting batch
 *
 * For every file, in processing order:
 * 1. resolve a date from the path (file name first, then folders)
 * 2. allocate the next free timestamp for that date
 * 3. compare with the stored capture time and write only when it differs
 */

use indicatif::ProgressBar;
use log::{debug, info};
use std::io;
use std::path::{Path, PathBuf};

use crate::allocator::TimestampAllocator;
use crate::exif::CaptureTimeStore;
use crate::file_ops::{order_for_processing, print_line};
use crate::path_date::resolve_date_from_path;
use crate::report::{format_outcome_line, FileOutcome, RunKind, RunReport};

pub const NO_DATE_REASON: &str = "No date found in path";

pub struct DateSetter<S: CaptureTimeStore> {
    store: S,
    allocator: TimestampAllocator,
}

impl<S: CaptureTimeStore> DateSetter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            allocator: TimestampAllocator::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Classify one file. Must be called in processing order for stable timestamps.
    pub fn process_file(&mut self, file_path: &Path) -> FileOutcome {
        let date = match resolve_date_from_path(file_path) {
            Some(date) => date,
            None => return FileOutcome::Skipped(NO_DATE_REASON.to_string()),
        };

        let timestamp = match self.allocator.allocate(date) {
            Ok(timestamp) => timestamp,
            Err(e) => return FileOutcome::Errored(e.to_string()),
        };

        let current = match self.store.read_capture_time(file_path) {
            Ok(current) => current,
            Err(e) => {
                debug!("Could not read capture time of {}: {}", file_path.display(), e);
                None
            }
        };

        if current == Some(timestamp) {
            return FileOutcome::AlreadySet(timestamp);
        }

        match self.store.write_capture_time(file_path, timestamp) {
            Ok(()) => FileOutcome::Updated(timestamp),
            Err(e) => FileOutcome::Errored(format!("Failed to set EXIF date: {}", e)),
        }
    }

    /// Process `files` sequentially in processing order, reporting each line through `pb`.
    pub fn run(&mut self, files: Vec<PathBuf>, pb: &ProgressBar) -> RunReport {
        let files = order_for_processing(files);
        let total = files.len();
        info!("Setting dates on {} files", total);

        let mut report = RunReport::new(RunKind::SetDates);
        let mut stdout = io::stdout();
        for (i, file_path) in files.iter().enumerate() {
            let outcome = self.process_file(file_path);
            let line = format_outcome_line(i + 1, total, file_path, &outcome);
            if let Err(e) = print_line(pb, &mut stdout, &line) {
                debug!("Failed to print progress line: {}", e);
            }
            report.record(file_path, &outcome);
            pb.inc(1);
        }

        pb.finish_and_clear();
        info!("Used {} date buckets", self.allocator.bucket_count());
        report
    }
}
