//! Replay API Transport Layer
//!
//! Network access for the replay loader.
//!
//! This crate provides:
//! - [`transport`]: the [`Transport`] trait plus request/response types
//! - [`http`]: a ureq-backed [`HttpTransport`] for the real API
//! - [`fixture`]: an in-memory / file-backed [`FixtureTransport`]
//! - [`link_header`]: parsing of `Link` pagination headers
//! - [`pagination`]: cursors, single-page fetches, and the [`Paginator`]
//! - [`endpoints`]: URL builders and [`ApiConfig`]
//!
//! # Example
//!
//! ```ignore
//! use replay_transport::{ApiConfig, ApiRequest, HttpTransport, Paginator};
//!
//! let transport = Arc::new(HttpTransport::new(&ApiConfig::from_env()));
//! let request = ApiRequest::new(replay_errors_path("acme"));
//! let errors: Vec<ReplayError> = Paginator::new(transport, request, 50).collect_all().await?;
//! ```

pub mod endpoints;
pub mod error;
pub mod fixture;
pub mod http;
pub mod link_header;
pub mod pagination;
pub mod transport;

pub use endpoints::{
    organization_path, recording_segments_path, replay_details_path, replay_errors_path, ApiConfig,
};
pub use error::FetchError;
pub use fixture::{FixtureRoute, FixtureTransport};
pub use http::HttpTransport;
pub use link_header::{parse_link_header, LinkHeader, ParsedLink};
pub use pagination::{fetch_page, Cursor, Page, Paginator, INITIAL_CURSOR};
pub use transport::{ApiRequest, ApiResponse, Transport};
