//! Timestamp helpers and the tick source used for stage filenames.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Last tick handed out in this process.
static LAST_TICK: AtomicU64 = AtomicU64::new(0);

/// Returns the current UTC time as an ISO 8601 formatted string.
///
/// # Examples
///
/// ```
/// use feedflow::utils::iso_timestamp;
///
/// let ts = iso_timestamp();
/// assert!(ts.contains('T'));
/// ```
#[must_use]
pub fn iso_timestamp() -> String {
    format_iso8601(&Utc::now())
}

/// Formats a timestamp as ISO 8601 string.
#[must_use]
pub fn format_iso8601(dt: &Timestamp) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Formats a calendar date the way stage filenames carry it.
#[must_use]
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y_%m_%d").to_string()
}

/// Parses a `YYYY_MM_DD` date stamp back into a date.
#[must_use]
pub fn parse_date_stamp(stamp: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(stamp, "%Y_%m_%d").ok()
}

/// Returns the next filename tick for `now`.
///
/// A tick is the number of microseconds since the Unix epoch, bumped so that
/// every call in this process returns a strictly greater value than the last.
#[must_use]
pub fn next_tick(now: &Timestamp) -> u64 {
    let micros = u64::try_from(now.timestamp_micros()).unwrap_or(0);
    let mut last = LAST_TICK.load(Ordering::Relaxed);
    loop {
        let candidate = micros.max(last + 1);
        match LAST_TICK.compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}
