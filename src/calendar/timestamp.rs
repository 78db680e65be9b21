use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid timestamp: '{input}'")]
pub struct TimestampParseError {
    pub input: String,
}

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parses a wire or form timestamp.
///
/// RFC 3339 strings keep their offset; strings without an offset
/// (`YYYY-MM-DDTHH:MM[:SS]`) are read as UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, TimestampParseError> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimestampParseError { input: input.to_string() })
}

/// Renders the `YYYY-MM-DDTHH:MM` value used to pre-fill form fields.
pub fn format_for_input(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M").to_string()
}

pub fn format_for_wire(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
