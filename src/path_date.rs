/**
 * Date inference from a file's full path
 *
 * The path is split into segments and searched from the file name back
 * towards the root, so the most specific name wins over its folders.
 */

use chrono::NaiveDate;
use log::trace;
use std::path::Path;

use crate::date_parse::parse_date_token;

/// Split a path on '/' and on the platform separator(s), keeping empty segments.
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split(|c: char| c == '/' || std::path::is_separator(c))
        .collect()
}

/// First date found walking the segments from last (file name) to first.
pub fn resolve_date_from_path(path: &Path) -> Option<NaiveDate> {
    let text = path.to_string_lossy();
    resolve_date_from_str(&text)
}

pub fn resolve_date_from_str(path: &str) -> Option<NaiveDate> {
    path_segments(path).into_iter().rev().find_map(|segment| {
        let date = parse_date_token(segment);
        if let Some(date) = date {
            trace!("Segment '{}' yields {}", segment, date);
        }
        date
    })
}
