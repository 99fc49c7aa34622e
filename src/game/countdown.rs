//! Turn deadline parsing and countdown derivation
//!
//! Servers have been seen sending the deadline as an RFC 3339 string with a
//! trailing `Z`, as an HTTP date (`Fri, 16 Oct 2026 12:00:30 GMT`), as a
//! naive ISO-8601 timestamp, or as epoch milliseconds.

use super::Millis;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parse a deadline string into epoch milliseconds.
pub fn parse_deadline(raw: &str) -> Option<Millis> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ms) = raw.parse::<i64>() {
        return Some(ms);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.timestamp_millis());
    }

    // No offset at all: the servers store UTC
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Deserialize an optional deadline. Anything unparseable becomes `None`.
pub(crate) fn deserialize_deadline<'de, D>(deserializer: D) -> Result<Option<Millis>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => parse_deadline(&s),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    })
}

/// Whole seconds left until `deadline`, floored, never negative.
pub fn seconds_remaining(deadline: Millis, now: Millis) -> u64 {
    if deadline <= now {
        0
    } else {
        ((deadline - now) / 1000) as u64
    }
}
