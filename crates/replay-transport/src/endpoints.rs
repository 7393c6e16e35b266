//! API endpoints and connection configuration.

use std::time::Duration;

use replay_types::{env_string, env_var_or};

/// Default API base (paths below are appended to it).
pub const DEFAULT_BASE_URL: &str = "https://sentry.io/api/0";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Organization details: `GET /organizations/{org}/`.
pub fn organization_path(org_slug: &str) -> String {
    format!("/organizations/{}/", org_slug)
}

/// Replay details: `GET /organizations/{org}/replays/{id}/`.
pub fn replay_details_path(org_slug: &str, replay_id: &str) -> String {
    format!("/organizations/{}/replays/{}/", org_slug, replay_id)
}

/// Error events search: `GET /organizations/{org}/replays-events-meta/`.
pub fn replay_errors_path(org_slug: &str) -> String {
    format!("/organizations/{}/replays-events-meta/", org_slug)
}

/// Recording segments: `GET /projects/{org}/{project}/replays/{id}/recording-segments/`.
pub fn recording_segments_path(org_slug: &str, project_slug: &str, replay_id: &str) -> String {
    format!(
        "/projects/{}/{}/replays/{}/recording-segments/",
        org_slug, project_slug, replay_id
    )
}

/// Connection settings for [`HttpTransport`](crate::HttpTransport).
///
/// Configuration via environment variables:
///
/// - `REPLAY_API_BASE_URL` - API base (default: `https://sentry.io/api/0`)
/// - `REPLAY_API_TOKEN` - bearer token (optional)
/// - `REPLAY_HTTP_TIMEOUT_MS` - per-request timeout (default: 30000)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env_string("REPLAY_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token: env_string("REPLAY_API_TOKEN"),
            timeout: Duration::from_millis(env_var_or(
                "REPLAY_HTTP_TIMEOUT_MS",
                DEFAULT_TIMEOUT_MS,
            )),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Absolute URL for an API path.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(organization_path("acme"), "/organizations/acme/");
        assert_eq!(replay_details_path("acme", "abc"), "/organizations/acme/replays/abc/");
        assert_eq!(replay_errors_path("acme"), "/organizations/acme/replays-events-meta/");
        assert_eq!(
            recording_segments_path("acme", "javascript", "abc"),
            "/projects/acme/javascript/replays/abc/recording-segments/"
        );
    }

    #[test]
    fn test_url_for_joins_single_slash() {
        let config = ApiConfig::default().with_base_url("http://localhost:8000/api/0/");
        assert_eq!(
            config.url_for("/organizations/acme/replays/abc/"),
            "http://localhost:8000/api/0/organizations/acme/replays/abc/"
        );
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("REPLAY_API_BASE_URL", "http://localhost:9000/api/0");
        std::env::set_var("REPLAY_HTTP_TIMEOUT_MS", "1500");
        let config = ApiConfig::from_env();
        assert_eq!(config.base_url, "http://localhost:9000/api/0");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        std::env::remove_var("REPLAY_API_BASE_URL");
        std::env::remove_var("REPLAY_HTTP_TIMEOUT_MS");
    }
}
