//! Elapsed-time derivation.
//!
//! A time column is first read as calendar timestamps; elapsed seconds are
//! measured from the first timestamp that parses.  When no cell parses as a
//! timestamp the column is taken to be elapsed time already and is coerced
//! to numbers instead.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use super::model::{DecimalSeparator, Table};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Parse one cell as a calendar timestamp.  Plain numbers are not
/// timestamps; bare clock times are placed on 1970-01-01.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() || s.parse::<f64>().is_ok() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return NaiveDate::from_ymd_opt(1970, 1, 1).map(|d| d.and_time(t));
        }
    }
    None
}

/// Seconds between two timestamps, microsecond resolution.
fn seconds_between(t0: NaiveDateTime, t: NaiveDateTime) -> f64 {
    let delta = t - t0;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Elapsed seconds for raw time cells.  The result has one entry per cell;
/// cells that cannot be interpreted are `None`.
pub fn elapsed_seconds(cells: &[&str], decimal: DecimalSeparator) -> Vec<Option<f64>> {
    let stamps: Vec<Option<NaiveDateTime>> = cells.iter().map(|c| parse_timestamp(c)).collect();

    match stamps.iter().flatten().next().copied() {
        Some(t0) => stamps
            .into_iter()
            .map(|t| t.map(|t| seconds_between(t0, t)))
            .collect(),
        None => cells.iter().map(|c| decimal.parse_number(c)).collect(),
    }
}

/// Elapsed seconds of `table` measured on `time_column`, one value per row.
/// `None` when the table has no such column.
pub fn normalize(table: &Table, time_column: &str) -> Option<Vec<Option<f64>>> {
    let cells = table.column(time_column)?;
    Some(elapsed_seconds(&cells, table.decimal))
}
