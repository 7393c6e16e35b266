//! Fetch errors surfaced by the transport and loader.

use thiserror::Error;

/// Failure of a replay API request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network failure or non-success HTTP status.
    #[error("request to {url} failed ({}): {message}", status_label(.status))]
    Transport {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("failed to decode response from {url}: {message}")]
    Deserialization { url: String, message: String },

    /// A `Link` header that could not be parsed. The paginator downgrades
    /// this to end-of-stream.
    #[error("malformed Link header: {0}")]
    PaginationHeader(String),
}

impl FetchError {
    pub fn transport(
        url: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::Transport {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("HTTP {}", code),
        None => "no response".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_status() {
        let err = FetchError::transport("/organizations/acme/replays/abc/", Some(404), "not found");
        assert_eq!(
            err.to_string(),
            "request to /organizations/acme/replays/abc/ failed (HTTP 404): not found"
        );
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_status_only_for_transport_errors() {
        let err = FetchError::PaginationHeader("missing rel".into());
        assert_eq!(err.status(), None);
        let err = FetchError::transport("/x/", None, "connection refused");
        assert!(err.to_string().contains("no response"));
    }
}
