//! Resource fetchers for the three replay lanes.
//!
//! Each fetcher only talks to the API and hands results back; loading flags,
//! the error slot and accumulation live in the loader.

use std::sync::Arc;

use replay_transport::{
    fetch_page, recording_segments_path, replay_details_path, replay_errors_path, ApiRequest,
    Cursor, FetchError, Paginator, Transport,
};
use replay_types::{format_timestamp, map_response_to_replay_record, ReplayError, ReplayRecord};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::metrics::FetchMetrics;
use crate::settle::{settle_all, SettleSummary};

#[derive(Deserialize)]
struct RecordEnvelope {
    data: Value,
}

/// Fetch and map the replay record (one request).
pub async fn fetch_replay_record(
    transport: &dyn Transport,
    org_slug: &str,
    replay_id: &str,
) -> Result<ReplayRecord, FetchError> {
    let request = ApiRequest::new(replay_details_path(org_slug, replay_id));
    let response = transport.get(&request).await?;
    let envelope: RecordEnvelope = response.json()?;
    map_response_to_replay_record(envelope.data).map_err(|e| FetchError::Deserialization {
        url: request.path,
        message: e.to_string(),
    })
}

/// Pages of error events linked to `record`, or `None` when the record has
/// no error ids and nothing needs fetching.
///
/// The search is scoped to the replay id and to [`ReplayRecord::errors_window`].
pub fn replay_error_pages(
    transport: Arc<dyn Transport>,
    org_slug: &str,
    record: &ReplayRecord,
    per_page: usize,
) -> Option<Paginator<ReplayError>> {
    if record.error_ids.is_empty() {
        return None;
    }

    let (start, end) = record.errors_window();
    let request = ApiRequest::new(replay_errors_path(org_slug))
        .with_query("start", format_timestamp(start))
        .with_query("end", format_timestamp(end))
        .with_query("query", format!("replayId:[{}]", record.id));

    Some(Paginator::new(transport, request, per_page))
}

/// Offsets of every segment page, computed from the known segment count.
pub fn segment_cursors(count_segments: u64, per_page: usize) -> Vec<Cursor> {
    let per_page = per_page.max(1) as u64;
    let pages = count_segments.div_ceil(per_page);
    (0..pages).map(|i| Cursor::at_offset(i * per_page)).collect()
}

/// Segment pages are arrays of segments, each segment an array of
/// attachments. Flatten one level.
fn flatten_segments(segments: Vec<Value>) -> Vec<Value> {
    let mut attachments = Vec::new();
    for segment in segments {
        match segment {
            Value::Array(items) => attachments.extend(items),
            other => attachments.push(other),
        }
    }
    attachments
}

/// Fetch every recording segment page of `record` concurrently.
///
/// All page requests are issued up front. `on_page` receives each page's
/// attachments as soon as that page resolves. A failed page is logged and
/// skipped without affecting its siblings; the call returns once every page
/// has settled.
pub async fn fetch_recording_segments<F>(
    transport: &dyn Transport,
    org_slug: &str,
    project_slug: &str,
    record: &ReplayRecord,
    per_page: usize,
    metrics: &FetchMetrics,
    on_page: F,
) -> SettleSummary
where
    F: Fn(Vec<Value>),
{
    let cursors = segment_cursors(record.count_segments, per_page);
    if cursors.is_empty() {
        return SettleSummary::default();
    }

    let request = ApiRequest::new(recording_segments_path(org_slug, project_slug, &record.id))
        .with_query("download", "true");
    let request = &request;
    let on_page = &on_page;

    let outcomes = settle_all(cursors.into_iter().map(|cursor| async move {
        match fetch_page::<Value>(transport, request, &cursor, per_page).await {
            Ok(page) => {
                metrics.record_segment_page();
                on_page(flatten_segments(page.items));
                Ok(())
            }
            Err(e) => {
                metrics.record_segment_page_failure();
                warn!(
                    replay_id = %record.id,
                    cursor = %cursor.token,
                    error = %e,
                    "skipping failed recording segment page"
                );
                Err(e)
            }
        }
    }))
    .await;

    let summary = SettleSummary::from_outcomes(&outcomes);
    debug!(
        replay_id = %record.id,
        pages = summary.total(),
        failed = summary.rejected,
        "recording segments settled"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_segment_cursors() {
        let tokens: Vec<_> = segment_cursors(250, 100).into_iter().map(|c| c.token).collect();
        assert_eq!(tokens, vec!["0:0:0", "0:100:0", "0:200:0"]);

        assert_eq!(segment_cursors(100, 100).len(), 1);
        assert_eq!(segment_cursors(101, 100).len(), 2);
        assert!(segment_cursors(0, 100).is_empty());
    }

    #[test]
    fn test_flatten_segments() {
        let page = vec![json!([{"a": 1}, {"a": 2}]), json!({"a": 3}), json!([])];
        assert_eq!(flatten_segments(page), vec![json!({"a": 1}), json!({"a": 2}), json!({"a": 3})]);
    }
}
