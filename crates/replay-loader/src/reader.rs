//! Read-only view over a loaded replay.
//!
//! The reader is derived, never cached: the loader rebuilds it from the
//! current record, error events and attachments every time a result is
//! produced.

use chrono::{DateTime, Duration, Utc};
use replay_types::{ReplayError, ReplayRecord};
use serde_json::Value;

/// Merged replay data.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReader {
    record: ReplayRecord,
    errors: Vec<ReplayError>,
    attachments: Vec<Value>,
}

impl ReplayReader {
    /// Build a reader, or `None` while the replay record is not loaded.
    ///
    /// Attachments arrive page by page in no particular order, so they are
    /// sorted by their `timestamp` field (stable; items without one first).
    pub fn factory(
        record: Option<&ReplayRecord>,
        errors: &[ReplayError],
        attachments: &[Value],
    ) -> Option<Self> {
        let record = record?.clone();
        let mut attachments = attachments.to_vec();
        attachments.sort_by(|a, b| attachment_timestamp(a).total_cmp(&attachment_timestamp(b)));

        Some(Self {
            record,
            errors: errors.to_vec(),
            attachments,
        })
    }

    pub fn record(&self) -> &ReplayRecord {
        &self.record
    }

    pub fn errors(&self) -> &[ReplayError] {
        &self.errors
    }

    pub fn attachments(&self) -> &[Value] {
        &self.attachments
    }

    pub fn duration(&self) -> Duration {
        self.record.duration()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.record.started_at
    }

    /// Error events that fall inside the replay, ordered by timestamp.
    /// Events without a parseable timestamp are dropped.
    pub fn errors_in_replay(&self) -> Vec<&ReplayError> {
        let (start, end) = self.record.errors_window();
        let mut errors: Vec<_> = self
            .errors
            .iter()
            .filter_map(|e| e.timestamp().map(|ts| (ts, e)))
            .filter(|(ts, _)| *ts >= start && *ts < end)
            .collect();
        errors.sort_by_key(|(ts, _)| *ts);
        errors.into_iter().map(|(_, e)| e).collect()
    }
}

fn attachment_timestamp(item: &Value) -> f64 {
    item.get("timestamp")
        .and_then(Value::as_f64)
        .unwrap_or(f64::NEG_INFINITY)
}
