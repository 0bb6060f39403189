/**
 * Error types for input validation, scanning, metadata I/O and timestamp allocation
 */

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Problems with what the user asked for. These abort before any file is touched.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Directory path cannot be empty")]
    EmptyPath,

    #[error("Directory '{}' does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Invalid choice '{0}'. Please enter 1 or 2")]
    InvalidChoice(String),
}

/// The input tree could not be enumerated. Aborts the whole batch.
#[derive(Debug, Error)]
#[error("Error accessing directory {}: {source}", .path.display())]
pub struct ScanError {
    pub path: PathBuf,
    #[source]
    pub source: walkdir::Error,
}

/// Reading or rewriting the embedded metadata of one image failed.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode EXIF data: {0}")]
    Encode(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("No unique timestamp left on {0}")]
    BucketExhausted(NaiveDate),
}
