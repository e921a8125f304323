//! Timestamp normalization shared by the text-based adapters.

use crate::domain::error::InvestatsError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a timestamp into a timezone-aware value. Inputs without an offset
/// are taken as UTC; a bare date is UTC midnight.
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, InvestatsError> {
    let s = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts);
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        });

    naive
        .and_then(|n| {
            FixedOffset::east_opt(0).and_then(|utc| utc.from_local_datetime(&n).single())
        })
        .ok_or_else(|| InvestatsError::InvalidTimestamp {
            value: value.to_string(),
        })
}

/// Renders a timestamp as `YYYY-MM-DD HH:MM:SS+HH:MM`.
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}
