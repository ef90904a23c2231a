//! ISO-8601 timestamps with millisecond precision and a `Z` suffix,
//! the form every export (CSV and JSON) uses.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;

pub fn iso8601(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `serialize_with` adapter for `DateTime<Utc>` fields.
pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&iso8601(at))
}
