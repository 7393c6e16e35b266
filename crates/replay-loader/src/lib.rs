//! Replay Data Loader
//!
//! Loads a replay's record, its error events and its recording segments,
//! and merges them into a [`ReplayReader`].
//!
//! - [`loader`]: the [`ReplayDataLoader`] orchestrator
//! - [`fetchers`]: one fetcher per resource
//! - [`state`]: loading flags and the published [`ReplayDataResult`]
//! - [`reader`]: read-only view over a loaded replay
//! - [`organization_store`]: explicit organization state container
//! - [`settle`]: settle-all joining of concurrent requests
//!
//! # Example
//!
//! ```ignore
//! use replay_loader::{LoaderOptions, ReplayDataLoader};
//!
//! let options = LoaderOptions::new("acme", "backend:abc123");
//! let loader = ReplayDataLoader::new(transport, options, projects);
//! loader.load().await;
//!
//! let result = loader.result();
//! if let Some(replay) = result.replay {
//!     println!("{} attachments", replay.attachments().len());
//! }
//! ```

pub mod fetchers;
pub mod loader;
pub mod metrics;
pub mod options;
pub mod organization_store;
pub mod reader;
pub mod settle;
pub mod state;

pub use fetchers::{
    fetch_recording_segments, fetch_replay_record, replay_error_pages, segment_cursors,
};
pub use loader::ReplayDataLoader;
pub use metrics::{FetchMetrics, MetricsSnapshot};
pub use options::{LoaderOptions, DEFAULT_ERRORS_PER_PAGE, DEFAULT_SEGMENTS_PER_PAGE};
pub use organization_store::{
    ListenerId, OrgFetchErrorType, OrganizationAction, OrganizationState, OrganizationStore,
};
pub use reader::ReplayReader;
pub use settle::{settle_all, SettleSummary};
pub use state::{LoadState, ReplayDataResult};
