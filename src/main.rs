//! replay-fetch: load a session replay from the replay API.
//!
//! ## Example Usage
//!
//! ```bash
//! # Load a replay, resolving its project through the organization details
//! replay-fetch load --org acme --replay 761104e184c64d439ee1014b72b4d83b
//!
//! # Legacy slug, explicit project, JSON output
//! replay-fetch --json load --org acme --replay javascript:761104e1... --project 42=javascript
//!
//! # Offline, from recorded responses
//! replay-fetch load --org acme --replay 761104e1... --fixtures replay.json
//! ```

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use replay_loader::{LoaderOptions, OrganizationStore, ReplayDataLoader};
use replay_transport::{ApiConfig, FixtureTransport, HttpTransport, Transport};
use replay_types::parse_replay_id;

mod args;
mod output;

use args::{Cli, Commands, LoadCmd};
use output::{print_report, LoadReport};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let Cli { command, json } = Cli::parse();

    match command {
        Commands::Load(cmd) => run_load(cmd, json).await,
        Commands::ParseSlug { slug } => {
            let replay_id = parse_replay_id(&slug);
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "slug": slug,
                        "replay_id": replay_id,
                    }))?
                );
            } else {
                println!("{}", replay_id);
            }
            Ok(())
        }
    }
}

async fn run_load(cmd: LoadCmd, json: bool) -> Result<()> {
    let transport: Arc<dyn Transport> = match &cmd.fixtures {
        Some(path) => Arc::new(
            FixtureTransport::from_file(path)
                .with_context(|| format!("failed to load fixtures from {}", path.display()))?,
        ),
        None => {
            let mut config = ApiConfig::from_env();
            if let Some(base_url) = &cmd.base_url {
                config = config.with_base_url(base_url.clone());
            }
            Arc::new(HttpTransport::new(&config))
        }
    };

    let mut options = LoaderOptions::from_env(cmd.org.clone(), cmd.replay.clone());
    if let Some(n) = cmd.errors_per_page {
        options = options.errors_per_page(n);
    }
    if let Some(n) = cmd.segments_per_page {
        options = options.segments_per_page(n);
    }

    let projects = if cmd.project.is_empty() {
        let store = OrganizationStore::new();
        store
            .load(transport.as_ref(), &cmd.org)
            .await
            .with_context(|| format!("failed to load organization '{}'", cmd.org))?
            .projects()
    } else {
        cmd.project
    };

    let loader = ReplayDataLoader::new(transport, options, projects);
    loader.load().await;

    let result = loader.result();
    let report = LoadReport::new(&result, loader.metrics());
    print_report(&report, json)?;

    if let Some(e) = result.fetch_error {
        error!(replay_id = %result.replay_id, error = %e, "replay load finished with an error");
        bail!("replay {} loaded with errors: {}", result.replay_id, e);
    }
    if result.fetching {
        // The record's project is not in the project list, so segments were never requested.
        warn!(
            replay_id = %result.replay_id,
            project_id = ?result.replay_record.as_ref().map(|r| r.project_id.as_str()),
            "recording segments skipped: project not found"
        );
    }
    Ok(())
}
