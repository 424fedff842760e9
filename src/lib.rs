//! # profview
//!
//! A terminal viewer for APM profiling data.
//!
//! One query returns several diagram shapes for the same profile: a function
//! table, a flame graph tree and a call graph. The viewer fetches them for a
//! set of query parameters and a time range, and shows them side by side or
//! one at a time.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ┌─────────┐   events   ┌────────────┐  requests  ┌────────┐ │
//! │  │  app    │──────────▶│ controller │──────────▶│ query  │ │
//! │  │ (input) │            │  (state)   │◀──────────│(client)│ │
//! │  └─────────┘            └─────┬──────┘ completions└────────┘ │
//! │                               │ ViewState                    │
//! │                               ▼                              │
//! │                         ┌──────────┐                         │
//! │                         │    ui    │ table | flame | topo    │
//! │                         └──────────┘                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`controller`]**: Owns the view state. Debounces parameter changes,
//!   spawns fetches and applies their results.
//! - **[`query`]**: The [`ProfileQuery`] trait with HTTP and file clients
//! - **[`data`]**: Diagram payloads, time ranges, value formatting
//! - **[`app`]**: Terminal-side state: selection, filter input, downloads
//! - **[`ui`]**: ratatui renderers for each diagram
//! - **[`config`]**: Layered settings (file, environment)
//!
//! ## Usage
//!
//! ```bash
//! # Last 30 minutes of CPU samples for one service
//! profview --app shop --service checkout -p data_type=cpu --last 30m
//!
//! # Browse a saved response
//! profview --file response.json --mode flame
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use profview::controller::{ProfilingViewController, QueryContext};
//! use profview::data::TimeRange;
//! use profview::query::{HttpQuery, QueryParams};
//!
//! # tokio_test::block_on(async {
//! let client = HttpQuery::builder()
//!     .endpoint("http://apm.internal/apm/profiling/query_graph_profile/")
//!     .build()
//!     .unwrap();
//! let context = QueryContext {
//!     params: QueryParams::new().with("app_name", "shop"),
//!     time_range: TimeRange::last(Duration::from_secs(3600)),
//! };
//! let mut controller = ProfilingViewController::new(Arc::new(client), context, Default::default());
//! controller.settle().await;
//! println!("{} rows", controller.state().table_data.len());
//! # });
//! ```

pub mod app;
pub mod config;
pub mod controller;
pub mod data;
pub mod events;
pub mod query;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use controller::{ProfilingViewController, QueryContext, ViewMode, ViewState};
pub use data::{Diagrams, FetchOutcome, FlameNode, TableRow, TimeRange};
pub use query::{FileQuery, HttpQuery, ProfileQuery, QueryError, QueryParams};
