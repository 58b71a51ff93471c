//! # Formats Module
//!
//! Text formats at the edges of the engine:
//! - `table`: parameter-table ingest (CSV export of the sheet, or JSON)
//! - `report`: the per-scenario JSON latency report
//! - `dot`: Graphviz DOT text for the swimlane diagram
//!
//! Note: file I/O stays in the app layer (apps/teleop-latency).
//! This module only handles format conversion (pure transformations).

pub mod dot;
pub mod report;
pub mod table;

pub use dot::render_dot;
pub use report::{LatencyReport, StageEntry};
pub use table::{TableDocument, TableFormat, TableOptions, TableRow, parse_table};
