//! Loading state and the caller-facing result.

use replay_transport::FetchError;
use replay_types::{find_project_slug, Project, ReplayError, ReplayRecord};
use serde_json::Value;

use crate::reader::ReplayReader;

/// Per-lane loading flags plus the shared error slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadState {
    pub fetching_replay: bool,
    pub fetching_errors: bool,
    pub fetching_attachments: bool,
    /// Most recent failure of the current cycle (last write wins).
    pub fetch_error: Option<FetchError>,
}

impl Default for LoadState {
    fn default() -> Self {
        Self {
            fetching_replay: true,
            fetching_errors: true,
            fetching_attachments: true,
            fetch_error: None,
        }
    }
}

impl LoadState {
    pub fn fetching(&self) -> bool {
        self.fetching_replay || self.fetching_errors || self.fetching_attachments
    }
}

/// Everything the lanes write to. Only touched under the loader's lock.
#[derive(Debug, Default)]
pub(crate) struct LoaderState {
    /// Bumped on every load cycle; writes tagged with an older value are dropped.
    pub generation: u64,
    pub torn_down: bool,
    /// The attachment lane is waiting for the record's project to become known.
    pub attachments_parked: bool,
    pub load: LoadState,
    pub record: Option<ReplayRecord>,
    pub errors: Vec<ReplayError>,
    pub attachments: Vec<Value>,
}

impl LoaderState {
    /// Lane 1 succeeded: swap in the new record and re-arm lanes 2 and 3.
    pub fn start_record(&mut self, record: ReplayRecord) {
        self.record = Some(record);
        self.attachments_parked = false;
        self.errors.clear();
        self.attachments.clear();
        self.load = LoadState {
            fetching_replay: false,
            fetching_errors: true,
            fetching_attachments: true,
            fetch_error: None,
        };
    }

    /// Lane 1 failed: record the error. Lanes 2 and 3 will not run this
    /// cycle, so every flag settles together with the error.
    pub fn fail_cycle(&mut self, error: FetchError) {
        self.attachments_parked = false;
        self.load = LoadState {
            fetching_replay: false,
            fetching_errors: false,
            fetching_attachments: false,
            fetch_error: Some(error),
        };
    }
}

/// What a caller sees of a replay load.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayDataResult {
    pub replay_record: Option<ReplayRecord>,
    pub replay_errors: Vec<ReplayError>,
    pub fetching: bool,
    pub fetch_error: Option<FetchError>,
    pub replay: Option<ReplayReader>,
    pub replay_id: String,
    pub project_slug: Option<String>,
}

impl ReplayDataResult {
    pub(crate) fn derive(state: &LoaderState, replay_id: &str, projects: &[Project]) -> Self {
        let project_slug = state
            .record
            .as_ref()
            .and_then(|record| find_project_slug(projects, &record.project_id));

        Self {
            replay_record: state.record.clone(),
            replay_errors: state.errors.clone(),
            fetching: state.load.fetching(),
            fetch_error: state.load.fetch_error.clone(),
            replay: ReplayReader::factory(state.record.as_ref(), &state.errors, &state.attachments),
            replay_id: replay_id.to_string(),
            project_slug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replay_types::map_response_to_replay_record;
    use serde_json::json;

    fn record(project_id: &str) -> ReplayRecord {
        map_response_to_replay_record(json!({
            "id": "abc",
            "project_id": project_id,
            "started_at": "2024-01-01T00:00:00Z",
            "finished_at": "2024-01-01T00:01:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_initial_state_is_fetching() {
        let state = LoaderState::default();
        assert!(state.load.fetching());

        let result = ReplayDataResult::derive(&state, "abc", &[]);
        assert!(result.fetching);
        assert!(result.replay.is_none());
        assert!(result.project_slug.is_none());
    }

    #[test]
    fn test_fail_cycle_settles_all_lanes() {
        let mut state = LoaderState::default();
        state.fail_cycle(FetchError::transport("/x/", Some(500), "boom"));
        assert!(!state.load.fetching());
        assert!(state.load.fetch_error.is_some());
    }

    #[test]
    fn test_start_record_resets_previous_cycle() {
        let mut state = LoaderState::default();
        state.errors.push(serde_json::from_value(json!({"id": "old"})).unwrap());
        state.attachments.push(json!({"old": true}));
        state.load.fetch_error = Some(FetchError::PaginationHeader("x".into()));

        state.attachments_parked = true;
        state.start_record(record("42"));
        assert!(!state.attachments_parked);
        assert!(state.errors.is_empty());
        assert!(state.attachments.is_empty());
        assert_eq!(state.load.fetch_error, None);
        assert!(!state.load.fetching_replay);
        assert!(state.load.fetching());
    }

    #[test]
    fn test_project_slug_is_derived_from_current_projects() {
        let mut state = LoaderState::default();
        state.start_record(record("42"));

        let without = ReplayDataResult::derive(&state, "abc", &[]);
        assert_eq!(without.project_slug, None);

        let with = ReplayDataResult::derive(&state, "abc", &[Project::new("42", "javascript")]);
        assert_eq!(with.project_slug.as_deref(), Some("javascript"));
        assert!(with.replay.is_some());
    }
}
