//! Error events linked to a replay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row from the replay events search endpoint.
///
/// Only the fields the loader and reader look at are typed; everything else
/// the server returns is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayError {
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    /// ISO-8601 timestamp with millisecond precision.
    #[serde(default)]
    pub timestamp: Option<String>,

    #[serde(default, rename = "project.name")]
    pub project_name: Option<String>,

    /// Short issue id (e.g. `JAVASCRIPT-1A2B`).
    #[serde(default)]
    pub issue: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReplayError {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }
}
