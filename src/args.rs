use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use replay_types::Project;

#[derive(Debug, Parser)]
#[command(
    name = "replay-fetch",
    author,
    version,
    about = "Load a session replay from the replay API",
    long_about = "Fetches a replay's record, its error events and its recording segments,\n\
                  then prints a summary of what was loaded.\n\n\
                  API settings come from REPLAY_API_BASE_URL, REPLAY_API_TOKEN and\n\
                  REPLAY_HTTP_TIMEOUT_MS; log verbosity from RUST_LOG."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load a replay and print what was fetched
    Load(LoadCmd),

    /// Print the replay id a slug refers to
    ParseSlug {
        /// `{replayId}` or `{projectSlug}:{replayId}`
        slug: String,
    },
}

#[derive(Debug, Args)]
pub struct LoadCmd {
    /// Organization slug
    #[arg(long, value_name = "SLUG")]
    pub org: String,

    /// Replay slug: `{replayId}` or `{projectSlug}:{replayId}`
    #[arg(long, value_name = "SLUG")]
    pub replay: String,

    /// Known project as `ID=SLUG`. Can be provided multiple times. When
    /// omitted, projects are read from the organization details.
    #[arg(long, value_name = "ID=SLUG", value_parser = parse_project)]
    pub project: Vec<Project>,

    /// Error events per page (default: REPLAY_ERRORS_PER_PAGE or 50)
    #[arg(long, value_name = "N")]
    pub errors_per_page: Option<usize>,

    /// Recording segments per page (default: REPLAY_SEGMENTS_PER_PAGE or 100)
    #[arg(long, value_name = "N")]
    pub segments_per_page: Option<usize>,

    /// Serve requests from a fixture file instead of the network
    #[arg(long, value_name = "PATH")]
    pub fixtures: Option<PathBuf>,

    /// API base URL (overrides REPLAY_API_BASE_URL)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
}

pub fn parse_project(value: &str) -> Result<Project, String> {
    match value.split_once('=') {
        Some((id, slug)) if !id.is_empty() && !slug.is_empty() => Ok(Project::new(id, slug)),
        _ => Err(format!("expected ID=SLUG, got '{}'", value)),
    }
}
