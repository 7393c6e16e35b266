//! Replay data loader.
//!
//! A load cycle runs up to three lanes:
//!
//! 1. the replay record (one request, must succeed before anything else runs)
//! 2. error events, paged sequentially through `Link` cursors
//! 3. recording segments, all pages requested at once
//!
//! Lanes 2 and 3 run side by side once the record is in. Every write is
//! tagged with the cycle's generation; writes from a superseded cycle or
//! after [`ReplayDataLoader::teardown`] are dropped.

use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use replay_transport::Transport;
use replay_types::{find_project_slug, parse_replay_id, Project, ReplayRecord};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::fetchers::{fetch_recording_segments, fetch_replay_record, replay_error_pages};
use crate::metrics::{FetchMetrics, MetricsSnapshot};
use crate::options::LoaderOptions;
use crate::state::{LoadState, LoaderState, ReplayDataResult};

struct Shared {
    replay_id: String,
    state: RwLock<LoaderState>,
    projects: RwLock<Vec<Project>>,
    metrics: FetchMetrics,
    updates: watch::Sender<ReplayDataResult>,
}

impl Shared {
    fn result(&self) -> ReplayDataResult {
        let state = self.state.read();
        let projects = self.projects.read();
        ReplayDataResult::derive(&state, &self.replay_id, &projects)
    }

    fn publish(&self) {
        self.updates.send_replace(self.result());
    }

    /// Open a new cycle. `None` once torn down.
    fn begin_cycle(&self) -> Option<u64> {
        let generation = {
            let mut state = self.state.write();
            if state.torn_down {
                return None;
            }
            state.generation += 1;
            state.load.fetching_replay = true;
            state.generation
        };
        self.publish();
        Some(generation)
    }

    /// Apply `f` if `generation` is still current and the loader is live.
    /// Returns whether the write happened.
    fn update(&self, generation: u64, f: impl FnOnce(&mut LoaderState)) -> bool {
        {
            let mut state = self.state.write();
            if state.torn_down || state.generation != generation {
                return false;
            }
            f(&mut state);
        }
        self.publish();
        true
    }

    fn has_fetch_error(&self, generation: u64) -> bool {
        let state = self.state.read();
        state.generation == generation && state.load.fetch_error.is_some()
    }

    /// Resolve the record's project slug, or park the attachment lane until
    /// [`ReplayDataLoader::set_projects`] makes it resolvable. The check and the
    /// park happen under the state lock so a concurrent `set_projects` is not
    /// missed.
    fn project_slug_or_park(&self, generation: u64, record: &ReplayRecord) -> SlugLookup {
        let mut state = self.state.write();
        if state.torn_down || state.generation != generation {
            return SlugLookup::Stale;
        }
        match find_project_slug(&self.projects.read(), &record.project_id) {
            Some(slug) => SlugLookup::Found(slug),
            None => {
                state.attachments_parked = true;
                SlugLookup::Parked
            }
        }
    }

    /// Claim a parked attachment lane whose project has become resolvable.
    fn unpark_attachments(&self) -> Option<(u64, ReplayRecord, String)> {
        let mut state = self.state.write();
        if state.torn_down || !state.attachments_parked || state.load.fetch_error.is_some() {
            return None;
        }
        let record = state.record.clone()?;
        let slug = find_project_slug(&self.projects.read(), &record.project_id)?;
        state.attachments_parked = false;
        Some((state.generation, record, slug))
    }
}

enum SlugLookup {
    Found(String),
    Parked,
    Stale,
}

/// Loads one replay and exposes the merged result.
///
/// Dropping the loader tears it down; in-flight requests are left to finish
/// but their results are ignored.
pub struct ReplayDataLoader {
    transport: Arc<dyn Transport>,
    options: LoaderOptions,
    shared: Arc<Shared>,
}

impl ReplayDataLoader {
    pub fn new(
        transport: Arc<dyn Transport>,
        options: LoaderOptions,
        projects: Vec<Project>,
    ) -> Self {
        let replay_id = parse_replay_id(&options.replay_slug).to_string();
        let state = LoaderState::default();
        let initial = ReplayDataResult::derive(&state, &replay_id, &projects);

        Self {
            transport,
            options,
            shared: Arc::new(Shared {
                replay_id,
                state: RwLock::new(state),
                projects: RwLock::new(projects),
                metrics: FetchMetrics::default(),
                updates: watch::Sender::new(initial),
            }),
        }
    }

    /// Replay id parsed from the slug.
    pub fn replay_id(&self) -> &str {
        &self.shared.replay_id
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Run one load cycle. The returned future owns everything it needs, so
    /// it can be awaited directly or handed to `tokio::spawn`.
    pub fn load(&self) -> impl Future<Output = ()> + Send + 'static {
        let shared = Arc::clone(&self.shared);
        let transport = Arc::clone(&self.transport);
        let options = self.options.clone();
        async move { run_cycle(shared, transport, options).await }
    }

    /// Spawn [`load`](Self::load) on the current runtime.
    pub fn spawn_load(&self) -> JoinHandle<()> {
        tokio::spawn(self.load())
    }

    /// Start a fresh cycle. Results of any cycle still in flight are
    /// discarded from here on.
    pub fn on_retry(&self) -> impl Future<Output = ()> + Send + 'static {
        self.load()
    }

    pub fn result(&self) -> ReplayDataResult {
        self.shared.result()
    }

    pub fn load_state(&self) -> LoadState {
        self.shared.state.read().load.clone()
    }

    /// Receive every published result, starting with the current one.
    pub fn subscribe(&self) -> watch::Receiver<ReplayDataResult> {
        self.shared.updates.subscribe()
    }

    /// Replace the known projects and republish the derived `project_slug`.
    ///
    /// If the current cycle's attachment lane is parked waiting for the
    /// record's project and the new list resolves it, the lane is resumed on
    /// the current runtime and its handle returned.
    pub fn set_projects(&self, projects: Vec<Project>) -> Option<JoinHandle<()>> {
        if self.is_torn_down() {
            return None;
        }
        *self.shared.projects.write() = projects;
        self.shared.publish();

        let resumed = self.resume_attachments()?;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(resumed)),
            Err(_) => {
                warn!(
                    replay_id = %self.shared.replay_id,
                    "no tokio runtime; call resume_attachments to fetch recording segments"
                );
                None
            }
        }
    }

    /// Resume a parked attachment lane, if its project is now known and the
    /// cycle has no error. The lane is claimed when this returns `Some`.
    pub fn resume_attachments(&self) -> Option<impl Future<Output = ()> + Send + 'static> {
        let (generation, record, project_slug) = self.shared.unpark_attachments()?;
        let shared = Arc::clone(&self.shared);
        let transport = Arc::clone(&self.transport);
        let options = self.options.clone();

        debug!(replay_id = %record.id, project = %project_slug, "resuming recording segments");
        Some(async move {
            fetch_attachments(&shared, &transport, &options, &record, generation, &project_slug)
                .await
        })
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// Stop applying results. Idempotent.
    pub fn teardown(&self) {
        let mut state = self.shared.state.write();
        if !state.torn_down {
            state.torn_down = true;
            debug!(replay_id = %self.shared.replay_id, "replay loader torn down");
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.state.read().torn_down
    }
}

impl Drop for ReplayDataLoader {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn run_cycle(shared: Arc<Shared>, transport: Arc<dyn Transport>, options: LoaderOptions) {
    let Some(generation) = shared.begin_cycle() else {
        return;
    };
    let replay_id = shared.replay_id.clone();

    shared.metrics.record_record_request();
    let fetched = fetch_replay_record(transport.as_ref(), &options.org_slug, &replay_id).await;
    let record = match fetched {
        Ok(record) => record,
        Err(e) => {
            error!(replay_id = %replay_id, error = %e, "failed to fetch replay record");
            shared.update(generation, |state| state.fail_cycle(e));
            return;
        }
    };

    debug!(
        replay_id = %replay_id,
        generation,
        errors = record.error_ids.len(),
        segments = record.count_segments,
        "fetched replay record"
    );

    if !shared.update(generation, |state| state.start_record(record.clone())) {
        return;
    }

    futures::join!(
        run_errors_lane(&shared, &transport, &options, &record, generation),
        run_attachments_lane(&shared, &transport, &options, &record, generation),
    );
}

async fn run_errors_lane(
    shared: &Shared,
    transport: &Arc<dyn Transport>,
    options: &LoaderOptions,
    record: &ReplayRecord,
    generation: u64,
) {
    let pages = if shared.has_fetch_error(generation) {
        None
    } else {
        replay_error_pages(
            Arc::clone(transport),
            &options.org_slug,
            record,
            options.errors_per_page,
        )
    };
    let Some(mut pages) = pages else {
        shared.update(generation, |state| state.load.fetching_errors = false);
        return;
    };

    let outcome = loop {
        match pages.next_page().await {
            Ok(Some(page)) => {
                shared.metrics.record_error_page();
                if !shared.update(generation, |state| state.errors.extend(page)) {
                    return;
                }
            }
            Ok(None) => break Ok(()),
            Err(e) => {
                shared.metrics.record_error_page_failure();
                break Err(e);
            }
        }
    };

    match outcome {
        Ok(()) => {
            debug!(replay_id = %record.id, pages = pages.pages_fetched(), "error events loaded");
            shared.update(generation, |state| state.load.fetching_errors = false);
        }
        Err(e) => {
            error!(replay_id = %record.id, error = %e, "failed to fetch replay error events");
            shared.update(generation, |state| {
                state.load.fetch_error = Some(e);
                state.load.fetching_errors = false;
            });
        }
    }
}

async fn run_attachments_lane(
    shared: &Shared,
    transport: &Arc<dyn Transport>,
    options: &LoaderOptions,
    record: &ReplayRecord,
    generation: u64,
) {
    if shared.has_fetch_error(generation) || record.count_segments == 0 {
        shared.update(generation, |state| state.load.fetching_attachments = false);
        return;
    }

    match shared.project_slug_or_park(generation, record) {
        SlugLookup::Found(project_slug) => {
            fetch_attachments(shared, transport, options, record, generation, &project_slug).await
        }
        SlugLookup::Parked => {
            debug!(
                replay_id = %record.id,
                project_id = %record.project_id,
                "project not known yet; recording segments wait for set_projects"
            );
        }
        SlugLookup::Stale => {}
    }
}

async fn fetch_attachments(
    shared: &Shared,
    transport: &Arc<dyn Transport>,
    options: &LoaderOptions,
    record: &ReplayRecord,
    generation: u64,
    project_slug: &str,
) {
    fetch_recording_segments(
        transport.as_ref(),
        &options.org_slug,
        project_slug,
        record,
        options.segments_per_page,
        &shared.metrics,
        |attachments| {
            shared.update(generation, |state| state.attachments.extend(attachments));
        },
    )
    .await;

    shared.update(generation, |state| state.load.fetching_attachments = false);
}
