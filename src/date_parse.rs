/**
 * Date token parsing for single path segments
 *
 * Recognised prefixes, tried in order:
 * 1. YYYY-MM-DD followed by one whitespace character or '_'
 * 2. YYYY-MM followed by one whitespace character or '_'   (day = 1)
 * 3. YYYY followed by one whitespace character or '_'      (month = day = 1)
 *
 * Every pattern is anchored at the start of the segment. A pattern whose
 * digits do not form a valid date simply does not match, and the next
 * pattern is tried against the same text.
 */

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 2100;

static FULL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})[\s_]").unwrap());
static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})[\s_]").unwrap());
static YEAR_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]{4})[\s_]").unwrap());

type DateMatcher = fn(&str) -> Option<NaiveDate>;

/// Matchers in priority order; the first one returning a date wins.
static MATCHERS: &[DateMatcher] = &[match_full_date, match_year_month, match_year_only];

/// Extract a calendar date from the start of `text`.
///
/// Returns `None` for the (common) case of a segment that carries no date.
pub fn parse_date_token(text: &str) -> Option<NaiveDate> {
    if text.trim().is_empty() {
        return None;
    }

    MATCHERS.iter().find_map(|matcher| matcher(text))
}

fn match_full_date(text: &str) -> Option<NaiveDate> {
    let caps = FULL_DATE.captures(text)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    valid_date(year, month, day)
}

fn match_year_month(text: &str) -> Option<NaiveDate> {
    let caps = YEAR_MONTH.captures(text)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    valid_date(year, month, 1)
}

fn match_year_only(text: &str) -> Option<NaiveDate> {
    let caps = YEAR_ONLY.captures(text)?;
    let year = caps[1].parse().ok()?;
    valid_date(year, 1, 1)
}

pub fn is_year_in_range(year: i32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
}

/// Build a date if the year is in range and month/day form a real calendar day.
pub fn valid_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if !is_year_in_range(year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_full_date_with_space_or_underscore() {
        assert_eq!(parse_date_token("2022-03-15 trip"), date(2022, 3, 15));
        assert_eq!(parse_date_token("2022-03-15_IMG_001.jpg"), date(2022, 3, 15));
        assert_eq!(parse_date_token("2022-03-15\tnotes"), date(2022, 3, 15));
    }

    #[test]
    fn test_year_month_defaults_day() {
        assert_eq!(parse_date_token("2021-07 summer"), date(2021, 7, 1));
        assert_eq!(parse_date_token("1999-12_party"), date(1999, 12, 1));
    }

    #[test]
    fn test_year_only_defaults_month_and_day() {
        assert_eq!(parse_date_token("2005 holidays"), date(2005, 1, 1));
        assert_eq!(parse_date_token("1900_scans"), date(1900, 1, 1));
        assert_eq!(parse_date_token("2100_future"), date(2100, 1, 1));
    }

    #[test]
    fn test_delimiter_is_required() {
        assert_eq!(parse_date_token("2022-03-15"), None);
        assert_eq!(parse_date_token("2022-03"), None);
        assert_eq!(parse_date_token("2022"), None);
        assert_eq!(parse_date_token("2022.jpg"), None);
        assert_eq!(parse_date_token("2022-03-15.jpg"), None);
    }

    #[test]
    fn test_match_is_anchored_at_start() {
        assert_eq!(parse_date_token("IMG_2023-05-01_x"), None);
        assert_eq!(parse_date_token(" 2023-05-01 x"), None);
        assert_eq!(parse_date_token("trip 2019 beach"), None);
    }

    #[test]
    fn test_years_outside_range_never_match() {
        assert_eq!(parse_date_token("1899 old"), None);
        assert_eq!(parse_date_token("2101 new"), None);
        assert_eq!(parse_date_token("1899-05 old"), None);
        assert_eq!(parse_date_token("2101-05-05 new"), None);
    }

    #[test]
    fn test_invalid_day_falls_through_to_later_patterns() {
        // The year-month pattern needs a delimiter right after MM, so a
        // "-31_" tail cannot satisfy it and nothing matches.
        assert_eq!(parse_date_token("2023-02-31_x"), None);
        assert_eq!(parse_date_token("2023-13-01 x"), None);
        // Feb 29 only exists in leap years.
        assert_eq!(parse_date_token("2024-02-29 leap"), date(2024, 2, 29));
        assert_eq!(parse_date_token("2023-02-29 leap"), None);
    }

    #[test]
    fn test_invalid_month_in_year_month_pattern() {
        assert_eq!(parse_date_token("2020-00 x"), None);
        assert_eq!(parse_date_token("2020-13 x"), None);
    }

    #[test]
    fn test_blank_and_plain_segments() {
        assert_eq!(parse_date_token(""), None);
        assert_eq!(parse_date_token("   "), None);
        assert_eq!(parse_date_token("IMG_001.jpg"), None);
        assert_eq!(parse_date_token("photos"), None);
    }

    #[test]
    fn test_valid_date_bounds() {
        assert!(valid_date(1900, 1, 1).is_some());
        assert!(valid_date(2100, 12, 31).is_some());
        assert!(valid_date(1899, 12, 31).is_none());
        assert!(valid_date(2000, 4, 31).is_none());
        assert!(valid_date(2000, 0, 1).is_none());
    }
}
