//! Fixture-backed transport.
//!
//! Serves canned responses keyed by request path and (optionally) cursor.
//! Routes can be built in code or loaded from a JSON file:
//!
//! ```json
//! {
//!   "routes": [
//!     {"path": "/organizations/acme/replays/abc/", "body": {"data": {}}},
//!     {"path": "/organizations/acme/replays-events-meta/", "cursor": "0:0:0",
//!      "link": "<u>; rel=\"next\"; results=\"false\"; cursor=\"0:50:0\"",
//!      "body": {"data": []}}
//!   ]
//! }
//! ```
//!
//! Every request is recorded, and the peak number of concurrently pending
//! requests is tracked so callers can check fan-out behaviour.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::FetchError;
use crate::transport::{ApiRequest, ApiResponse, Transport};

fn default_status() -> u16 {
    200
}

/// One canned response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureRoute {
    pub path: String,
    /// Only match requests with this cursor; `None` matches any cursor.
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub body: Value,
}

impl FixtureRoute {
    pub fn ok(path: impl Into<String>, body: Value) -> Self {
        Self {
            path: path.into(),
            cursor: None,
            status: 200,
            link: None,
            body,
        }
    }

    pub fn failing(path: impl Into<String>, status: u16) -> Self {
        Self {
            status,
            body: Value::String("fixture failure".to_string()),
            ..Self::ok(path, Value::Null)
        }
    }

    pub fn for_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    fn matches(&self, request: &ApiRequest) -> bool {
        self.path == request.path
            && self
                .cursor
                .as_deref()
                .map_or(true, |cursor| request.cursor() == Some(cursor))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FixtureFile {
    routes: Vec<FixtureRoute>,
}

/// In-memory [`Transport`] serving [`FixtureRoute`]s.
pub struct FixtureTransport {
    routes: Mutex<Vec<FixtureRoute>>,
    requests: Mutex<Vec<ApiRequest>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    paused: watch::Sender<bool>,
}

impl Default for FixtureTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            paused: watch::Sender::new(false),
        }
    }

    pub fn with_routes(routes: impl IntoIterator<Item = FixtureRoute>) -> Self {
        let transport = Self::new();
        for route in routes {
            transport.add_route(route);
        }
        transport
    }

    /// Load routes from a fixture JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FetchError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let json = std::fs::read_to_string(path)
            .map_err(|e| FetchError::transport(&display, None, e.to_string()))?;
        let file: FixtureFile =
            serde_json::from_str(&json).map_err(|e| FetchError::Deserialization {
                url: display,
                message: e.to_string(),
            })?;
        Ok(Self::with_routes(file.routes))
    }

    /// Add a route. Earlier routes win when several match.
    pub fn add_route(&self, route: FixtureRoute) {
        self.routes.lock().push(route);
    }

    /// Every request served so far, in arrival order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Highest number of requests pending at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Hold every request (new and pending) until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    fn route_for(&self, request: &ApiRequest) -> Option<FixtureRoute> {
        self.routes.lock().iter().find(|r| r.matches(request)).cloned()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, FetchError> {
        self.requests.lock().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        // Give sibling requests a chance to start before this one resolves.
        tokio::task::yield_now().await;
        let mut paused = self.paused.subscribe();
        let _ = paused.wait_for(|paused| !*paused).await;

        let route = self
            .route_for(request)
            .ok_or_else(|| FetchError::transport(&request.path, Some(404), "no fixture route"))?;

        if !(200..300).contains(&route.status) {
            return Err(FetchError::transport(
                &request.path,
                Some(route.status),
                route.body.to_string(),
            ));
        }

        Ok(ApiResponse {
            url: request.path.clone(),
            status: route.status,
            link: route.link,
            body: route.body.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_cursor_specific_route_wins_when_listed_first() {
        let transport = FixtureTransport::with_routes([
            FixtureRoute::ok("/p/", json!([2])).for_cursor("0:1:0"),
            FixtureRoute::ok("/p/", json!([1])),
        ]);

        let first = ApiRequest::new("/p/").with_query("cursor", "0:0:0");
        let second = ApiRequest::new("/p/").with_query("cursor", "0:1:0");
        let first = transport.get(&first).await.unwrap();
        let second = transport.get(&second).await.unwrap();
        assert_eq!(first.body, "[1]");
        assert_eq!(second.body, "[2]");
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_and_failing_routes() {
        let transport = FixtureTransport::with_routes([FixtureRoute::failing("/broken/", 500)]);

        let err = transport.get(&ApiRequest::new("/broken/")).await.unwrap_err();
        assert_eq!(err.status(), Some(500));

        let err = transport.get(&ApiRequest::new("/nowhere/")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.json");
        std::fs::write(
            &path,
            r#"{"routes": [{"path": "/a/", "link": "<u>; rel=\"next\"", "body": {"data": []}}]}"#,
        )
        .unwrap();

        let transport = FixtureTransport::from_file(&path).unwrap();
        let route = transport.route_for(&ApiRequest::new("/a/")).unwrap();
        assert_eq!(route.status, 200);
        assert_eq!(route.link.as_deref(), Some("<u>; rel=\"next\""));
    }
}
