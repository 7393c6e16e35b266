//! Rendering of load results.

use replay_loader::{MetricsSnapshot, ReplayDataResult};
use replay_types::{ReplayError, ReplayRecord};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct LoadReport {
    pub replay_id: String,
    pub project_slug: Option<String>,
    pub record: Option<ReplayRecord>,
    pub errors: Vec<ReplayError>,
    pub errors_in_replay: usize,
    pub attachment_count: usize,
    pub fetch_error: Option<String>,
    pub metrics: MetricsSnapshot,
}

impl LoadReport {
    pub fn new(result: &ReplayDataResult, metrics: MetricsSnapshot) -> Self {
        let (errors_in_replay, attachment_count) = result
            .replay
            .as_ref()
            .map(|replay| (replay.errors_in_replay().len(), replay.attachments().len()))
            .unwrap_or_default();

        Self {
            replay_id: result.replay_id.clone(),
            project_slug: result.project_slug.clone(),
            record: result.replay_record.clone(),
            errors: result.replay_errors.clone(),
            errors_in_replay,
            attachment_count,
            fetch_error: result.fetch_error.as_ref().map(ToString::to_string),
            metrics,
        }
    }
}

pub fn print_report(report: &LoadReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Replay:       {}", report.replay_id);
    println!("Project:      {}", report.project_slug.as_deref().unwrap_or("(unknown)"));
    if let Some(record) = &report.record {
        println!("Started:      {}", record.started_at.to_rfc3339());
        println!("Duration:     {}s", record.duration().num_seconds());
        println!("Segments:     {}", record.count_segments);
    }
    println!(
        "Errors:       {} fetched, {} inside the replay",
        report.errors.len(),
        report.errors_in_replay
    );
    println!("Attachments:  {}", report.attachment_count);
    println!("Requests:     {}", report.metrics.total_requests());
    if report.metrics.error_page_failures > 0 {
        println!("Failed:       {} error page(s)", report.metrics.error_page_failures);
    }
    if report.metrics.segment_page_failures > 0 {
        println!("Skipped:      {} segment page(s)", report.metrics.segment_page_failures);
    }
    if let Some(error) = &report.fetch_error {
        println!("Fetch error:  {}", error);
    }
    Ok(())
}
