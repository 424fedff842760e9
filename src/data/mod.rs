//! Data model for profile views.
//!
//! ## Submodules
//!
//! - [`diagram`]: Backend payloads ([`Diagrams`], [`TableRow`], [`FlameNode`])
//! - [`duration`]: Parsing of look-back windows (e.g., "15m", "1h")
//! - [`format`]: Unit-aware value formatting for the renderers
//! - [`outcome`]: Typed fetch results ([`FetchOutcome`])
//! - [`time_range`]: Query windows and their microsecond bounds
//!
//! ## Data Flow
//!
//! ```text
//! QueryResponse (raw JSON)
//!        │
//!        ▼
//! FetchOutcome::from()
//!        │
//!        ├──▶ Data(Diagrams) ──▶ table rows, flame tree, unit, topology
//!        │
//!        └──▶ Empty | Failed ──▶ empty state (failure logged)
//! ```

pub mod diagram;
pub mod duration;
pub mod format;
pub mod outcome;
pub mod time_range;

pub use diagram::{DiagramType, Diagrams, FlameNode, TableRow, TopoSource};
pub use outcome::FetchOutcome;
pub use time_range::TimeRange;
