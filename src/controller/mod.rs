//! Profiling view controller.
//!
//! Coordinates query parameters, view-mode switching and lazy data
//! fetching for the three profile renderers (table, flame graph, topology).
//!
//! ```text
//!  set_params / set_time_range / reload
//!              │
//!              ▼
//!      Debouncer (16ms) ──▶ fetch {table, flamegraph} ──┐
//!                                                        │ tokio task
//!  on_mode_change(Topo) ──▶ fetch {callgraph} (once) ────┤
//!  on_sort_change       ──▶ fetch {table} + sort ────────┤
//!                                                        ▼
//!                               completions (mpsc) ──▶ poll() ──▶ ViewState
//! ```
//!
//! All state is owned by the controller and only mutated from `&mut self`
//! methods on the UI thread. Fetches run as tokio tasks and report back over
//! a channel; completions are applied in arrival order, so a slow response
//! can overwrite a newer one. Fetch errors never escape: they are logged and
//! shown as the empty state.

mod debounce;
mod state;

pub use debounce::Debouncer;
pub use state::{
    DownloadFormat, SortColumn, TableSort, TextDirection, ViewMode, ViewState,
};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::data::{DiagramType, FetchOutcome, FlameNode, TimeRange};
use crate::query::{ProfileQuery, QueryError, QueryParams, QueryRequest};

/// Default quiet period before a parameter change is fetched.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(16);

/// Debounced trigger keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Refetch table and flame graph data.
    Diagrams,
}

/// The inputs every request is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    pub params: QueryParams,
    pub time_range: TimeRange,
}

/// Controller tuning.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub debounce: Duration,
    pub initial_mode: ViewMode,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            initial_mode: ViewMode::default(),
        }
    }
}

/// Image export capability of the flame graph renderer.
pub trait FlameGraphExport {
    /// Write `root` as an image and return where it was written.
    fn export_image(&self, root: &FlameNode, unit: &str, keywords: &[String])
        -> anyhow::Result<PathBuf>;
}

#[derive(Debug)]
enum Completion {
    Diagrams(FetchOutcome),
    Sort(FetchOutcome),
    Topo { generation: u64, outcome: FetchOutcome },
}

/// Drives the profile view: owns the view state and all fetching.
#[derive(Debug)]
pub struct ProfilingViewController {
    client: Arc<dyn ProfileQuery>,
    context: QueryContext,
    state: ViewState,
    debouncer: Debouncer<Trigger>,

    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    requests_issued: u64,

    // Bumped whenever the context changes; topology answers for an older
    // generation are dropped.
    generation: u64,
    topo_in_flight: Option<u64>,

    last_failure: Option<QueryError>,
}

impl ProfilingViewController {
    /// Create a controller and schedule the initial fetch.
    pub fn new(
        client: Arc<dyn ProfileQuery>,
        context: QueryContext,
        options: ControllerOptions,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let state = ViewState {
            mode: options.initial_mode,
            ..ViewState::default()
        };

        let mut controller = Self {
            client,
            context,
            state,
            debouncer: Debouncer::new(options.debounce),
            completions_tx,
            completions_rx,
            in_flight: 0,
            requests_issued: 0,
            generation: 0,
            topo_in_flight: None,
            last_failure: None,
        };
        controller.on_parameters_or_time_range_changed();
        controller
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    /// Returns a description of the query backend.
    pub fn source_description(&self) -> &str {
        self.client.description()
    }

    /// Number of fetches started but not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Total number of requests issued since creation.
    pub fn requests_issued(&self) -> u64 {
        self.requests_issued
    }

    /// The most recent fetch failure, kept for diagnostics.
    pub fn last_failure(&self) -> Option<&QueryError> {
        self.last_failure.as_ref()
    }

    /// Whether a debounced refetch is waiting for its quiet period.
    pub fn refresh_pending(&self) -> bool {
        self.debouncer.is_pending(Trigger::Diagrams)
    }

    /// Replace the query parameters. Drops cached topology and refetches.
    pub fn set_params(&mut self, params: QueryParams) {
        self.context.params = params;
        self.invalidate_topology();
        self.on_parameters_or_time_range_changed();
    }

    /// Replace the time range. Drops cached topology and refetches.
    pub fn set_time_range(&mut self, time_range: TimeRange) {
        self.context.time_range = time_range;
        self.invalidate_topology();
        self.on_parameters_or_time_range_changed();
    }

    /// Schedule a table/flame refetch once changes settle.
    pub fn on_parameters_or_time_range_changed(&mut self) {
        self.debouncer.schedule(Trigger::Diagrams, Instant::now());
    }

    /// Switch the visible renderer(s), fetching topology on first use.
    pub fn on_mode_change(&mut self, mode: ViewMode) {
        if mode == self.state.mode {
            return;
        }
        self.state.highlight_id = None;
        self.state.mode = mode;

        if mode == ViewMode::Topo {
            self.request_topology();
        }
    }

    /// Re-request table rows sorted by `sort` (a backend sort directive).
    ///
    /// Rows are only replaced on success; a failed sort keeps what is shown.
    pub fn on_sort_change(&mut self, sort: &str) {
        let request = QueryRequest::new(
            &self.context.params,
            &self.context.time_range,
            &[DiagramType::Table],
        )
        .with_sort(sort);
        self.spawn_fetch(request, Completion::Sort);
    }

    /// Export the current flame graph.
    ///
    /// Returns the written path, or `None` when there is nothing to export
    /// or the format is not supported.
    pub fn on_download(
        &self,
        format: DownloadFormat,
        exporter: &dyn FlameGraphExport,
    ) -> anyhow::Result<Option<PathBuf>> {
        match format {
            DownloadFormat::Image => {
                let Some(ref root) = self.state.flame_data else {
                    return Ok(None);
                };
                let path =
                    exporter.export_image(root, &self.state.unit, &self.flame_filter_keywords())?;
                info!(path = %path.display(), "exported flame graph");
                Ok(Some(path))
            }
            // TODO: serialize the flame tree to pprof once the backend exposes sample types.
            DownloadFormat::Pprof => Ok(None),
        }
    }

    /// A renderer selected (or cleared) a row/node.
    pub fn on_highlight(&mut self, id: Option<u64>) {
        self.state.highlight_id = id;
    }

    pub fn set_filter_keyword(&mut self, keyword: impl Into<String>) {
        self.state.filter_keyword = keyword.into();
    }

    pub fn toggle_text_direction(&mut self) {
        self.state.text_direction = self.state.text_direction.toggle();
    }

    /// Filter keywords for the flame graph: the trimmed keyword, or nothing.
    pub fn flame_filter_keywords(&self) -> Vec<String> {
        let keyword = self.state.filter_keyword.trim();
        if keyword.is_empty() {
            Vec::new()
        } else {
            vec![keyword.to_string()]
        }
    }

    /// Fire due triggers and apply finished fetches without blocking.
    ///
    /// Returns true if anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;

        for trigger in self.debouncer.take_due(Instant::now()) {
            match trigger {
                Trigger::Diagrams => self.fetch_diagrams(),
            }
            changed = true;
        }

        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion);
            changed = true;
        }

        changed
    }

    /// Wait until no refetch is pending and every fetch has been applied.
    pub async fn settle(&mut self) {
        loop {
            self.poll();

            if self.in_flight > 0 {
                if let Some(completion) = self.completions_rx.recv().await {
                    self.apply(completion);
                }
                continue;
            }

            match self.debouncer.next_deadline() {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => break,
            }
        }
    }

    fn invalidate_topology(&mut self) {
        self.generation += 1;
        self.topo_in_flight = None;
        self.state.topo_src.clear();
    }

    fn fetch_diagrams(&mut self) {
        self.state.highlight_id = None;
        self.state.is_loading = true;

        let request = QueryRequest::new(
            &self.context.params,
            &self.context.time_range,
            &[DiagramType::Table, DiagramType::Flamegraph],
        );
        self.spawn_fetch(request, Completion::Diagrams);

        if self.state.mode == ViewMode::Topo {
            self.request_topology();
        }
    }

    fn request_topology(&mut self) {
        if !self.state.topo_src.is_empty() || self.topo_in_flight.is_some() {
            return;
        }

        self.state.is_loading = true;
        let generation = self.generation;
        self.topo_in_flight = Some(generation);

        let request = QueryRequest::new(
            &self.context.params,
            &self.context.time_range,
            &[DiagramType::Callgraph],
        );
        self.spawn_fetch(request, move |outcome| Completion::Topo {
            generation,
            outcome,
        });
    }

    fn spawn_fetch<F>(&mut self, request: QueryRequest, wrap: F)
    where
        F: FnOnce(FetchOutcome) -> Completion + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        let tx = self.completions_tx.clone();

        self.in_flight += 1;
        self.requests_issued += 1;
        debug!(
            diagram_types = ?request.diagram_types,
            sort = ?request.sort,
            "fetching profile diagrams"
        );

        tokio::spawn(async move {
            // Run the query in its own task so a panic still yields a completion.
            let query = tokio::spawn(async move { client.query(&request).await });
            let outcome = match query.await {
                Ok(result) => FetchOutcome::from(result),
                Err(err) => {
                    error!(error = %err, "profile query task failed");
                    FetchOutcome::Failed(QueryError::Task(err.to_string()))
                }
            };
            // The receiver lives as long as the controller.
            let _ = tx.send(wrap(outcome));
        });
    }

    fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match completion {
            Completion::Diagrams(outcome) => {
                self.state.empty = outcome.shows_empty();
                match outcome {
                    FetchOutcome::Data(diagrams) => {
                        self.state.unit = diagrams.unit;
                        self.state.table_data = diagrams.table_data;
                        self.state.flame_data = diagrams.flame_data;
                        self.last_failure = None;
                    }
                    FetchOutcome::Empty => {
                        debug!("profile query returned no diagrams");
                        self.last_failure = None;
                    }
                    FetchOutcome::Failed(err) => {
                        warn!(error = %err, "profile query failed");
                        self.last_failure = Some(err);
                    }
                }
                self.state.is_loading = false;
            }
            Completion::Sort(outcome) => match outcome {
                FetchOutcome::Data(diagrams) => {
                    self.state.table_data = diagrams.table_data;
                    self.state.highlight_id = None;
                }
                FetchOutcome::Empty => {
                    debug!("sorted table query returned no diagrams");
                }
                FetchOutcome::Failed(err) => {
                    warn!(error = %err, "sorted table query failed");
                    self.last_failure = Some(err);
                }
            },
            Completion::Topo {
                generation,
                outcome,
            } => {
                if self.topo_in_flight == Some(generation) {
                    self.topo_in_flight = None;
                }

                if generation != self.generation {
                    debug!(generation, current = self.generation, "dropping stale call graph");
                } else {
                    self.state.topo_src = match outcome {
                        FetchOutcome::Data(diagrams) => diagrams.topo_source(),
                        FetchOutcome::Empty => String::new(),
                        FetchOutcome::Failed(err) => {
                            warn!(error = %err, "call graph query failed");
                            self.last_failure = Some(err);
                            String::new()
                        }
                    };
                }
                self.state.is_loading = false;
            }
        }
    }
}
