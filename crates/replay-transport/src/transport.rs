//! Transport abstraction.
//!
//! The loader only ever issues `GET`s with query parameters, so the trait is
//! deliberately narrow. Backends: [`HttpTransport`](crate::HttpTransport)
//! for the live API and [`FixtureTransport`](crate::FixtureTransport) for
//! canned responses.

use serde::de::DeserializeOwned;

use crate::error::FetchError;

/// A `GET` against an API path (relative to the configured base URL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Append a query parameter, replacing any existing value for `key`.
    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.retain(|(k, _)| k != key);
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Pagination cursor of this request, if any.
    pub fn cursor(&self) -> Option<&str> {
        self.query_value("cursor")
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Path the response was served for, used in error messages.
    pub url: String,
    pub status: u16,
    /// Raw `Link` header, if the server sent one.
    pub link: Option<String>,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_str(&self.body).map_err(|e| FetchError::Deserialization {
            url: self.url.clone(),
            message: e.to_string(),
        })
    }
}

/// Issues requests against the replay API.
///
/// Implementations map non-2xx statuses to [`FetchError::Transport`].
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_query_replaces_existing_key() {
        let request = ApiRequest::new("/x/")
            .with_query("cursor", "0:0:0")
            .with_query("per_page", 50)
            .with_query("cursor", "0:50:0");
        assert_eq!(request.cursor(), Some("0:50:0"));
        assert_eq!(request.query.len(), 2);
    }

    #[test]
    fn test_json_decode_error_names_url() {
        let response = ApiResponse {
            url: "/x/".into(),
            status: 200,
            link: None,
            body: "not json".into(),
        };
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, FetchError::Deserialization { ref url, .. } if url == "/x/"));
    }
}
