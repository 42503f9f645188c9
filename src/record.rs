// Consultation record as served by the upstream API

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One consultation entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    /// Upstream identifier, used for deletes and row identity
    #[serde(rename = "_id", alias = "id", deserialize_with = "display_string")]
    pub id: String,
    /// Raw creation timestamp, parsed on every filter evaluation
    #[serde(rename = "createdAt", default, deserialize_with = "display_string")]
    pub created_at: String,
    #[serde(default, deserialize_with = "display_string")]
    pub name: String,
    #[serde(default, deserialize_with = "display_string")]
    pub email: String,
    #[serde(default, deserialize_with = "display_string")]
    pub contact: String,
    #[serde(default, deserialize_with = "display_string")]
    pub place: String,
    #[serde(default, deserialize_with = "display_string")]
    pub duration: String,
}

impl Consultation {
    /// Parse `created_at`, reading offset-less timestamps in `tz`.
    ///
    /// Returns `None` for anything unparseable. Callers treat that as a record
    /// that fails every date comparison.
    pub fn created_instant<Tz: TimeZone>(&self, tz: &Tz) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at, tz)
    }
}

/// Accepts strings, numbers, booleans and null for display fields.
fn display_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp into an instant.
///
/// - With an offset (`Z`, `+05:30`, `+0530`): that instant.
/// - Without an offset: wall-clock time in `tz`.
/// - Date only: UTC midnight of that day.
pub fn parse_timestamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return resolve_local(tz, naive);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Resolve a wall-clock time in `tz` to an instant.
///
/// Ambiguous times (clocks going back) resolve to the earliest instant. Times
/// inside a gap (clocks going forward) resolve to the first valid instant after it.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    let mut candidate = naive;
    // Real-world gaps are at most a couple of hours
    for _ in 0..=96 {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => return Some(earliest.with_timezone(&Utc)),
            LocalResult::None => {
                candidate = truncate_to_quarter(candidate)? + Duration::minutes(15);
            }
        }
    }
    None
}

fn truncate_to_quarter(naive: NaiveDateTime) -> Option<NaiveDateTime> {
    use chrono::Timelike;
    naive
        .with_minute(naive.minute() - naive.minute() % 15)
        .and_then(|n| n.with_second(0))
        .and_then(|n| n.with_nanosecond(0))
}
