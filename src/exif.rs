/**
 * EXIF capture time access
 *
 * Reading uses kamadak-exif on the file container. The stored capture time is
 * DateTimeOriginal, refined by SubSecTimeOriginal when that tag is present.
 * Writing is delegated to `ExifWriter`.
 */

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use exif::{Exif, In, Reader as ExifReader, Tag, Value};
use log::debug;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::MetadataError;
use crate::exif_writer::ExifWriter;

/// Format of every EXIF date/time ASCII field.
pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Where capture timestamps are read from and written to.
///
/// The batch driver only talks to this trait, so it can run against an
/// in-memory store in tests.
pub trait CaptureTimeStore {
    /// Stored capture timestamp, or `None` when the image carries none.
    fn read_capture_time(&self, file_path: &Path) -> Result<Option<NaiveDateTime>, MetadataError>;

    /// Write `timestamp` into the modification, original and digitized date fields.
    fn write_capture_time(&self, file_path: &Path, timestamp: NaiveDateTime) -> Result<(), MetadataError>;
}

pub struct ExifProcessor {
    writer: ExifWriter,
}

impl ExifProcessor {
    pub fn new() -> Self {
        Self {
            writer: ExifWriter::new(),
        }
    }

    fn read_exif(&self, file_path: &Path) -> Result<Option<Exif>, MetadataError> {
        let file = File::open(file_path)?;
        let mut bufreader = BufReader::new(&file);

        match ExifReader::new().read_from_container(&mut bufreader) {
            Ok(exif) => Ok(Some(exif)),
            Err(exif::Error::NotFound(_)) => {
                debug!("No EXIF data in {}", file_path.display());
                Ok(None)
            }
            Err(exif::Error::Io(e)) => Err(MetadataError::Io(e)),
            Err(e) => Err(MetadataError::Decode(e.to_string())),
        }
    }
}

impl Default for ExifProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureTimeStore for ExifProcessor {
    fn read_capture_time(&self, file_path: &Path) -> Result<Option<NaiveDateTime>, MetadataError> {
        let exif = match self.read_exif(file_path)? {
            Some(exif) => exif,
            None => return Ok(None),
        };
        Ok(capture_time_from_exif(&exif))
    }

    fn write_capture_time(&self, file_path: &Path, timestamp: NaiveDateTime) -> Result<(), MetadataError> {
        self.writer.write_capture_time(file_path, timestamp)
    }
}

/// DateTimeOriginal (+ SubSecTimeOriginal) of an already parsed EXIF block.
pub fn capture_time_from_exif(exif: &Exif) -> Option<NaiveDateTime> {
    let base = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .and_then(|field| first_ascii(&field.value))?;

    let subsec = exif
        .get_field(Tag::SubSecTimeOriginal, In::PRIMARY)
        .and_then(|field| first_ascii(&field.value));

    match parse_exif_timestamp(&base, subsec.as_deref()) {
        Ok(dt) => Some(dt),
        Err(e) => {
            debug!("Ignoring unparsable DateTimeOriginal '{}': {}", base, e);
            None
        }
    }
}

fn first_ascii(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string()),
        _ => None,
    }
}

/// Parse "YYYY:MM:DD HH:MM:SS" plus an optional sub-second digit string.
pub fn parse_exif_timestamp(timestamp_str: &str, subsec: Option<&str>) -> Result<NaiveDateTime> {
    let timestamp_str = timestamp_str.trim();
    let naive_dt = NaiveDateTime::parse_from_str(timestamp_str, EXIF_DATE_FORMAT)
        .with_context(|| format!("Failed to parse EXIF timestamp '{}'", timestamp_str))?;

    let milliseconds = match subsec.map(str::trim).filter(|s| !s.is_empty()) {
        Some(digits) => {
            // Sub-second tags are a run of decimal digits; keep millisecond precision.
            let digits = digits.trim_matches('"');
            let truncated: String = digits.chars().take(3).collect();
            let padded = format!("{:0<3}", truncated);
            padded
                .parse::<i64>()
                .with_context(|| format!("Failed to parse subseconds '{}'", digits))?
        }
        None => 0,
    };

    Ok(naive_dt + Duration::milliseconds(milliseconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_whole_seconds() {
        let dt = parse_exif_timestamp("2021:06:01 00:00:02", None).unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2021, 6, 1).unwrap().and_hms_opt(0, 0, 2).unwrap()
        );
    }

    #[test]
    fn test_parse_with_subseconds() {
        let expected = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 7)
            .unwrap();
        assert_eq!(parse_exif_timestamp("2021:06:01 23:59:59", Some("007")).unwrap(), expected);

        let padded = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 500)
            .unwrap();
        assert_eq!(parse_exif_timestamp("2021:06:01 23:59:59", Some("5")).unwrap(), padded);
        assert_eq!(parse_exif_timestamp("2021:06:01 23:59:59", Some("50012")).unwrap(), padded);
    }

    #[test]
    fn test_blank_subseconds_are_ignored() {
        let dt = parse_exif_timestamp("2000:01:01 12:00:00", Some("  ")).unwrap();
        assert_eq!(
            dt,
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_rejects_other_formats() {
        assert!(parse_exif_timestamp("2021-06-01 00:00:00", None).is_err());
        assert!(parse_exif_timestamp("    :  :     :  :  ", None).is_err());
        assert!(parse_exif_timestamp("2021:06:01 00:00:00", Some("ab")).is_err());
    }

    #[test]
    fn test_first_ascii_strips_nul() {
        let value = Value::Ascii(vec![b"2021:06:01 00:00:00\0".to_vec()]);
        assert_eq!(first_ascii(&value).as_deref(), Some("2021:06:01 00:00:00"));
        assert_eq!(first_ascii(&Value::Short(vec![1])), None);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let processor = ExifProcessor::new();
        let result = processor.read_capture_time(Path::new("/nonexistent/definitely/missing.jpg"));
        assert!(matches!(result, Err(MetadataError::Io(_))));
    }
}
