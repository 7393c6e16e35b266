//! Shared types for the replay-fetch workspace.
//!
//! This crate provides the domain records used across the transport and
//! loader crates:
//!
//! - [`ReplayRecord`](record::ReplayRecord) - replay metadata (the root record)
//! - [`ReplayError`](error_event::ReplayError) - an error event linked to a replay
//! - [`Project`](project::Project) - project id/slug pairs used to locate segments
//!
//! plus replay slug parsing and environment variable helpers.

pub mod env_utils;
pub mod error_event;
pub mod project;
pub mod record;
pub mod slug;

pub use env_utils::{env_string, env_var, env_var_or};
pub use error_event::ReplayError;
pub use project::{find_project_slug, Project};
pub use record::{format_timestamp, map_response_to_replay_record, ReplayRecord};
pub use slug::parse_replay_id;
