//! Date-only normalization.
//!
//! Survey windows and case dates are stored as bare `YYYY-MM-DD` strings.
//! Dropping the time-of-day and timezone at the write boundary avoids the
//! off-by-one-day shifts that naive date parsing produces across locales.

use chrono::NaiveDate;

/// Normalize a caller-supplied date to a `YYYY-MM-DD` string.
///
/// - Bare `YYYY-MM-DD` input is returned as-is.
/// - Input with a time component (e.g. `2025-10-22T21:30`) is truncated to
///   the date prefix.
/// - Anything else (including non-existent calendar dates) is rejected.
pub fn normalize_date(input: &str) -> Option<String> {
    let date_part = match input.split_once('T') {
        Some((date, _)) => date,
        None => input,
    };

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    Some(date_part.to_string())
}
