/**
 * File operations module: discovery, processing order, transfers and the export batch
 */

use anyhow::{Context, Result};
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ScanError;
use crate::naming::{flattened_name, unique_destination};
use crate::report::{format_outcome_line, FileOutcome, RunKind, RunReport};

/// Extensions (compared lowercase) of the image container we handle.
pub const IMAGE_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];

/// Default name of the export folder created under the input root.
pub const EXPORT_DIR_NAME: &str = "EXPORT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransferMode {
    /// Copy files, keep originals
    Copy,
    /// Move files
    Move,
}

impl TransferMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferMode::Copy => "copy",
            TransferMode::Move => "move",
        }
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Recursively collect image files under `directory`.
///
/// Any unreadable directory aborts the scan.
pub fn find_image_files(directory: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(directory) {
        let entry = entry.map_err(|source| {
            let path = source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| directory.to_path_buf());
            ScanError { path, source }
        })?;

        if entry.file_type().is_file() && is_image_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    debug!("Found {} image files under {}", files.len(), directory.display());
    Ok(files)
}

/// Stable processing order: by containing directory, then by file name.
pub fn order_for_processing(mut files: Vec<PathBuf>) -> Vec<PathBuf> {
    files.sort_by(|a, b| {
        let key_a = (a.parent().map(Path::as_os_str), a.file_name());
        let key_b = (b.parent().map(Path::as_os_str), b.file_name());
        key_a.cmp(&key_b)
    });
    files
}

/// Progress bar used by both batches; per-file lines are printed through it.
pub fn progress_bar(len: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec:.1} files/s) ETA: {eta} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Write one per-file line to `out` without tearing the bar.
///
/// A hidden bar (stderr is not a terminal) would swallow `ProgressBar::println`, so the
/// line is written directly in that case.
pub fn print_line<W: Write>(pb: &ProgressBar, out: &mut W, line: &str) -> io::Result<()> {
    if pb.is_hidden() {
        writeln!(out, "{}", line)
    } else {
        pb.suspend(|| writeln!(out, "{}", line))
    }
}

/// Copy or move `source_path` to `target_path`, creating the parent directory if needed.
pub fn perform_file_operation(source_path: &Path, target_path: &Path, mode: TransferMode) -> Result<()> {
    debug!("Attempting {} operation: '{}' -> '{}'", mode.as_str(), source_path.display(), target_path.display());

    if let Some(parent) = target_path.parent() {
        if !parent.exists() {
            debug!("Creating target directory: {}", parent.display());
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create target directory: {}", parent.display()))?;
        }
    }

    match mode {
        TransferMode::Move => match fs::rename(source_path, target_path) {
            Ok(_) => {
                debug!("Move operation successful");
            }
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                debug!("Cross-device move detected, using copy+delete strategy");
                fs::copy(source_path, target_path)
                    .with_context(|| format!("Failed to copy file from '{}' to '{}'",
                        source_path.display(), target_path.display()))?;
                fs::remove_file(source_path)
                    .with_context(|| format!("Failed to remove original file: {}", source_path.display()))?;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to move file from '{}' to '{}'",
                    source_path.display(), target_path.display()));
            }
        },
        TransferMode::Copy => {
            fs::copy(source_path, target_path)
                .with_context(|| format!("Failed to copy file from '{}' to '{}'",
                    source_path.display(), target_path.display()))?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub export_dir: PathBuf,
    pub mode: TransferMode,
}

impl ExportOptions {
    /// `<root>/EXPORT` in copy mode.
    pub fn for_root(root: &Path) -> Self {
        Self {
            export_dir: root.join(EXPORT_DIR_NAME),
            mode: TransferMode::Copy,
        }
    }
}

/// Flattens a photo tree into one export folder.
pub struct Exporter {
    root: PathBuf,
    options: ExportOptions,
}

impl Exporter {
    pub fn new(root: PathBuf, options: ExportOptions) -> Self {
        Self { root, options }
    }

    pub fn export_dir(&self) -> &Path {
        &self.options.export_dir
    }

    /// Create the export folder if it does not exist yet and resolve it to a canonical path,
    /// so files already inside it are recognised.
    pub fn prepare(&mut self) -> Result<()> {
        let export_dir = &self.options.export_dir;
        if !export_dir.exists() {
            fs::create_dir_all(export_dir)
                .with_context(|| format!("Failed to create export folder: {}", export_dir.display()))?;
            info!("Created export folder: {}", export_dir.display());
        }
        let canonical = export_dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve export folder: {}", export_dir.display()))?;
        self.options.export_dir = canonical;
        Ok(())
    }

    pub fn export_file(&self, file_path: &Path) -> FileOutcome {
        if file_path.starts_with(&self.options.export_dir) {
            return FileOutcome::Skipped("already in export folder".to_string());
        }

        let relative = match file_path.strip_prefix(&self.root) {
            Ok(relative) => relative,
            Err(_) => {
                return FileOutcome::Errored(format!("Not under input directory {}", self.root.display()));
            }
        };

        let name = match flattened_name(relative) {
            Some(name) => name,
            None => return FileOutcome::Errored("File has no name".to_string()),
        };

        let destination = unique_destination(&self.options.export_dir, &name);
        match perform_file_operation(file_path, &destination, self.options.mode) {
            Ok(()) => FileOutcome::Exported(destination),
            Err(e) => FileOutcome::Errored(format!("Failed to {} file: {:#}", self.options.mode.as_str(), e)),
        }
    }

    /// Export `files` in processing order. Only creating the export folder can fail the run.
    pub fn run(&mut self, files: Vec<PathBuf>, pb: &ProgressBar) -> Result<RunReport> {
        self.prepare()?;

        let files = order_for_processing(files);
        let total = files.len();
        let mut report = RunReport::new(RunKind::Export(self.options.mode));
        let mut stdout = io::stdout();

        for (i, file_path) in files.iter().enumerate() {
            let outcome = self.export_file(file_path);
            let line = format_outcome_line(i + 1, total, file_path, &outcome);
            if let Err(e) = print_line(pb, &mut stdout, &line) {
                debug!("Failed to print progress line: {}", e);
            }
            report.record(file_path, &outcome);
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(report)
    }
}
