//! Replay metadata (the root record of a replay load).
//!
//! The replay details endpoint returns `{"data": {...}}`. The payload is
//! decoded into [`ReplayRecordResponse`] and then mapped into a
//! [`ReplayRecord`]; mapping only renames and coerces fields.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Replay metadata, immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// Replay id (32 hex chars).
    pub id: String,

    /// Id of the project the replay was recorded in.
    pub project_id: String,

    /// Number of recording segments stored for this replay.
    pub count_segments: u64,

    /// Ids of error events linked to this replay.
    pub error_ids: Vec<String>,

    /// Number of errors reported by the replay index.
    pub count_errors: u64,

    pub started_at: DateTime<Utc>,

    /// End of the replay. The replay index stores this truncated to seconds.
    pub finished_at: DateTime<Utc>,

    /// Replay length in milliseconds (`finished_at - started_at`).
    pub duration_ms: i64,

    pub urls: Vec<String>,

    pub tags: BTreeMap<String, Vec<String>>,

    pub platform: Option<String>,
}

impl ReplayRecord {
    pub fn duration(&self) -> Duration {
        Duration::milliseconds(self.duration_ms)
    }

    /// Time window used to search for the replay's error events.
    ///
    /// The end bound is `finished_at` truncated to whole seconds plus one
    /// second: the record's end is stored without milliseconds while events
    /// are indexed with them, so an event at `12:00:00.450` must still fall
    /// inside a replay that "finished" at `12:00:00`.
    pub fn errors_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self.finished_at.trunc_subsecs(0) + Duration::seconds(1);
        (self.started_at, end)
    }
}

/// Raw replay payload as served by the API.
///
/// Unknown fields are ignored; nullable counters default to zero.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayRecordResponse {
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub project_id: String,
    #[serde(default, deserialize_with = "nullable_count")]
    pub count_segments: u64,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub error_ids: Vec<String>,
    #[serde(default, deserialize_with = "nullable_count")]
    pub count_errors: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "nullable_vec")]
    pub urls: Vec<String>,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    pub platform: Option<String>,
}

impl From<ReplayRecordResponse> for ReplayRecord {
    fn from(raw: ReplayRecordResponse) -> Self {
        let duration_ms = (raw.finished_at - raw.started_at).num_milliseconds().max(0);
        Self {
            id: raw.id,
            project_id: raw.project_id,
            count_segments: raw.count_segments,
            error_ids: raw.error_ids,
            count_errors: raw.count_errors,
            started_at: raw.started_at,
            finished_at: raw.finished_at,
            duration_ms,
            urls: raw.urls,
            tags: raw.tags.unwrap_or_default(),
            platform: raw.platform,
        }
    }
}

/// Map the `data` payload of the replay details response into a [`ReplayRecord`].
pub fn map_response_to_replay_record(data: Value) -> Result<ReplayRecord, serde_json::Error> {
    let raw: ReplayRecordResponse = serde_json::from_value(data)?;
    Ok(raw.into())
}

/// Format a timestamp the way the search endpoints expect it
/// (`2024-01-01T00:00:01.000Z`).
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn nullable_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

fn nullable_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": "761104e184c64d439ee1014b72b4d83b",
            "project_id": 42,
            "count_segments": 250,
            "error_ids": ["5c83aaccfffb4a708ae893bad9be3a1c"],
            "count_errors": 1,
            "started_at": "2024-01-01T00:00:00Z",
            "finished_at": "2024-01-01T00:05:00Z",
            "duration": 300,
            "urls": ["https://example.com/"],
            "tags": {"browser.name": ["Chrome"]},
            "user": {"id": "1"}
        })
    }

    #[test]
    fn test_maps_fields_and_derives_duration() {
        let record = map_response_to_replay_record(sample()).unwrap();
        assert_eq!(record.project_id, "42");
        assert_eq!(record.count_segments, 250);
        assert_eq!(record.error_ids.len(), 1);
        assert_eq!(record.duration_ms, 300_000);
        assert_eq!(record.tags["browser.name"], vec!["Chrome".to_string()]);
        assert_eq!(record.platform, None);
    }

    #[test]
    fn test_null_counters_default_to_zero() {
        let mut data = sample();
        data["count_segments"] = Value::Null;
        data["error_ids"] = Value::Null;
        data["tags"] = Value::Null;
        let record = map_response_to_replay_record(data).unwrap();
        assert_eq!(record.count_segments, 0);
        assert!(record.error_ids.is_empty());
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_missing_timestamps_are_rejected() {
        let mut data = sample();
        data.as_object_mut().unwrap().remove("started_at");
        assert!(map_response_to_replay_record(data).is_err());
    }

    #[test]
    fn test_errors_window_end_rounds_down_then_adds_a_second() {
        let mut data = sample();
        data["finished_at"] = json!("2024-01-01T00:00:00.450Z");
        data["started_at"] = json!("2023-12-31T23:59:00.000Z");
        let record = map_response_to_replay_record(data).unwrap();

        let (start, end) = record.errors_window();
        assert_eq!(format_timestamp(start), "2023-12-31T23:59:00.000Z");
        assert_eq!(format_timestamp(end), "2024-01-01T00:00:01.000Z");
    }

    #[test]
    fn test_errors_window_on_whole_second() {
        let record = map_response_to_replay_record(sample()).unwrap();
        let (_, end) = record.errors_window();
        assert_eq!(format_timestamp(end), "2024-01-01T00:05:01.000Z");
    }
}
