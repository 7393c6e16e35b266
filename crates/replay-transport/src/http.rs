//! HTTP transport backed by a ureq agent.
//!
//! ureq is blocking, so each request runs on tokio's blocking pool; callers
//! still see an ordinary async [`Transport`].

use async_trait::async_trait;
use tracing::debug;

use crate::endpoints::ApiConfig;
use crate::error::FetchError;
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Transport for the live replay API.
#[derive(Clone)]
pub struct HttpTransport {
    config: ApiConfig,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self {
            config: config.clone(),
            agent,
        }
    }

    pub fn from_env() -> Self {
        Self::new(&ApiConfig::from_env())
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn get_blocking(&self, request: &ApiRequest) -> Result<ApiResponse, FetchError> {
        let url = self.config.url_for(&request.path);
        let start = std::time::Instant::now();

        let mut call = self.agent.get(&url);
        for (key, value) in &request.query {
            call = call.query(key, value);
        }
        if let Some(token) = &self.config.token {
            call = call.set("Authorization", &format!("Bearer {}", token));
        }

        let response = match call.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(FetchError::transport(&request.path, Some(code), body));
            }
            Err(ureq::Error::Transport(e)) => {
                return Err(FetchError::transport(&request.path, None, e.to_string()));
            }
        };

        let status = response.status();
        let link = response.header("Link").map(str::to_string);
        let body = response
            .into_string()
            .map_err(|e| FetchError::transport(&request.path, Some(status), e.to_string()))?;

        debug!(
            url = %url,
            status = status,
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "http get"
        );

        Ok(ApiResponse {
            url: request.path.clone(),
            status,
            link,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, FetchError> {
        let this = self.clone();
        let owned = request.clone();
        tokio::task::spawn_blocking(move || this.get_blocking(&owned))
            .await
            .map_err(|e| {
                FetchError::transport(&request.path, None, format!("request task failed: {}", e))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let config = ApiConfig::default()
            .with_base_url("http://127.0.0.1:9/api/0")
            .with_token(Some("secret".into()));
        let transport = HttpTransport::new(&config);

        let err = transport
            .get(&ApiRequest::new("/organizations/acme/replays/abc/"))
            .await
            .unwrap_err();
        match err {
            FetchError::Transport { url, status, .. } => {
                assert_eq!(url, "/organizations/acme/replays/abc/");
                assert_eq!(status, None);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
