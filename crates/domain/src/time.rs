//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `discovered_at`, variable `updated_at`, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Parse an RFC 3339 string (as written by storage adapters) into a [`Timestamp`].
///
/// # Errors
///
/// Returns the chrono parse error when `text` is not valid RFC 3339.
pub fn parse_timestamp(text: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text).map(|ts| ts.with_timezone(&Utc))
}
