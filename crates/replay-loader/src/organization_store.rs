//! Organization state container.
//!
//! State only changes through [`OrganizationAction`]s applied by the pure
//! [`reduce`] function; the store adds locking and change notification on
//! top.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use replay_transport::{organization_path, ApiRequest, FetchError, Transport};
use replay_types::Project;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Why the organization could not be loaded, when the status says so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgFetchErrorType {
    OrgNoAccess,
    OrgNotFound,
}

impl OrgFetchErrorType {
    pub fn from_status(status: Option<u16>) -> Option<Self> {
        match status {
            Some(401) => Some(Self::OrgNoAccess),
            Some(404) => Some(Self::OrgNotFound),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationState {
    pub organization: Option<Value>,
    pub loading: bool,
    pub error: Option<FetchError>,
    pub error_type: Option<OrgFetchErrorType>,
    pub dirty: bool,
}

impl Default for OrganizationState {
    fn default() -> Self {
        Self {
            organization: None,
            loading: true,
            error: None,
            error_type: None,
            dirty: false,
        }
    }
}

impl OrganizationState {
    /// Projects listed under the organization's `projects` key. Entries that
    /// lack an id or slug are skipped.
    pub fn projects(&self) -> Vec<Project> {
        self.organization
            .as_ref()
            .and_then(|org| org.get("projects"))
            .and_then(Value::as_array)
            .map(|projects| {
                projects
                    .iter()
                    .filter_map(|p| serde_json::from_value(p.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub enum OrganizationAction {
    /// New organization data. Merged key by key into the current object
    /// unless `replace` is set.
    Update { organization: Value, replace: bool },
    Reset,
    FetchOrgError(FetchError),
}

pub fn reduce(state: &OrganizationState, action: OrganizationAction) -> OrganizationState {
    match action {
        OrganizationAction::Reset => OrganizationState::default(),
        OrganizationAction::Update {
            organization,
            replace,
        } => {
            let organization = match (replace, state.organization.clone(), organization) {
                (false, Some(Value::Object(mut current)), Value::Object(update)) => {
                    current.extend(update);
                    Value::Object(current)
                }
                (_, _, organization) => organization,
            };
            OrganizationState {
                organization: Some(organization),
                loading: false,
                error: None,
                error_type: None,
                dirty: false,
            }
        }
        OrganizationAction::FetchOrgError(error) => OrganizationState {
            organization: None,
            loading: false,
            error_type: OrgFetchErrorType::from_status(error.status()),
            error: Some(error),
            dirty: false,
        },
    }
}

type Listener = Arc<dyn Fn(&OrganizationState) + Send + Sync>;

/// Handle returned by [`OrganizationStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

/// Holds one organization's state and notifies subscribers of every change.
#[derive(Default)]
pub struct OrganizationStore {
    state: RwLock<OrganizationState>,
    listeners: Mutex<Listeners>,
}

impl OrganizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> OrganizationState {
        self.state.read().clone()
    }

    /// Apply `action` and notify subscribers with the new state.
    pub fn dispatch(&self, action: OrganizationAction) -> OrganizationState {
        let next = {
            let mut state = self.state.write();
            *state = reduce(&state, action);
            state.clone()
        };
        debug!(
            loading = next.loading,
            has_org = next.organization.is_some(),
            error_type = ?next.error_type,
            "organization state changed"
        );

        // Listeners run outside both locks so they may call back into the store.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&next);
        }
        next
    }

    pub fn update(&self, organization: Value, replace: bool) -> OrganizationState {
        self.dispatch(OrganizationAction::Update {
            organization,
            replace,
        })
    }

    pub fn reset(&self) -> OrganizationState {
        self.dispatch(OrganizationAction::Reset)
    }

    pub fn fetch_org_error(&self, error: FetchError) -> OrganizationState {
        self.dispatch(OrganizationAction::FetchOrgError(error))
    }

    /// Fetch the organization and dispatch the outcome. The store's state
    /// reflects the result either way; the error is also returned.
    pub async fn load(
        &self,
        transport: &dyn Transport,
        org_slug: &str,
    ) -> Result<OrganizationState, FetchError> {
        let request = ApiRequest::new(organization_path(org_slug));
        let fetched = transport.get(&request).await;
        match fetched.and_then(|response| response.json::<Value>()) {
            Ok(organization) => Ok(self.update(organization, true)),
            Err(e) => {
                warn!(org = %org_slug, error = %e, "failed to fetch organization");
                self.fetch_org_error(e.clone());
                Err(e)
            }
        }
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&OrganizationState) + Send + Sync + 'static,
    ) -> ListenerId {
        let mut listeners = self.listeners.lock();
        let id = ListenerId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    /// Returns whether `id` was subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry, _)| *entry != id);
        listeners.entries.len() != before
    }
}
