//! Age eligibility of upstream records.
//!
//! The upstream refuses automated downloads of torrents younger than its
//! threshold, so a record is only served once it is at least `min_age_hours`
//! old. Anything whose age cannot be established is excluded.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::warn;

use crate::metrics::RECORDS_FILTERED;

use super::TorrentRecord;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("Timestamp missing")]
    Missing,

    #[error("Unrecognized timestamp format: {0}")]
    Unparsable(String),
}

/// Formats carrying an explicit offset.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
];

/// Formats without an offset; interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an upstream timestamp.
///
/// Tries, in order: RFC 3339, RFC 2822, ISO-like forms with an offset,
/// ISO-like forms without one (taken as UTC), a bare date (midnight UTC) and
/// unix epoch seconds.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(TimestampError::Missing);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    let naive = s.strip_suffix('Z').unwrap_or(s);
    for format in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(naive, format) {
            return Ok(ndt.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(naive, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(ndt.and_utc());
        }
    }

    if s.len() >= 9 && s.bytes().all(|b| b.is_ascii_digit()) {
        if let Some(dt) = s.parse::<i64>().ok().and_then(|secs| DateTime::from_timestamp(secs, 0)) {
            return Ok(dt);
        }
    }

    Err(TimestampError::Unparsable(s.to_string()))
}

/// Eligibility predicate over a record's creation timestamp.
#[derive(Debug, Clone, Copy)]
pub struct AgeFilter {
    min_age_hours: u32,
}

impl AgeFilter {
    pub fn new(min_age_hours: u32) -> Self {
        Self { min_age_hours }
    }

    /// Whether the record is old enough right now.
    pub fn is_eligible(&self, record: &TorrentRecord) -> bool {
        self.is_eligible_at(record, Utc::now())
    }

    /// Whether the record is old enough at `now`. Fails closed.
    pub fn is_eligible_at(&self, record: &TorrentRecord, now: DateTime<Utc>) -> bool {
        match record_age(record, now) {
            Ok(age) => {
                let eligible = age >= TimeDelta::hours(self.min_age_hours as i64);
                RECORDS_FILTERED
                    .with_label_values(&[if eligible { "eligible" } else { "too_young" }])
                    .inc();
                eligible
            }
            Err(e) => {
                warn!(
                    record = %record.id,
                    created_at = ?record.created_at,
                    error = %e,
                    "Excluding record with unusable timestamp"
                );
                RECORDS_FILTERED.with_label_values(&["bad_timestamp"]).inc();
                false
            }
        }
    }
}

/// Age of a record at `now`; negative for timestamps in the future.
pub fn record_age(record: &TorrentRecord, now: DateTime<Utc>) -> Result<TimeDelta, TimestampError> {
    let raw = record.created_at.as_deref().ok_or(TimestampError::Missing)?;
    let created = parse_timestamp(raw)?;
    Ok(now - created)
}
