//! # Teleop Latency Core
//!
//! Deterministic latency-budget engine for a teleoperated robot pipeline
//! (operator input → command transport → actuation → video feedback).
//!
//! The engine resolves named timing parameters for a [`Scenario`], applies a
//! per-stage derivation rule, sums stages into lane totals and an overall
//! Command→Photon figure, and builds the swimlane topology used for
//! visualization.
//!
//! ```text
//! ParameterStore ──► StageResolver ──► LaneAggregator ──► TopologyBuilder
//!        ▲                 │                  │                  │
//!        │                 └──────────────────┴────► ScenarioRunner ──► ScenarioSink
//!   formats::table                                                    (JSON / DOT)
//! ```
//!
//! Everything in this crate is a pure function over an immutable
//! [`ParameterStore`]. File I/O and logging live in the app layer.

pub mod classifier;
pub mod error;
pub mod formats;
pub mod model;
pub mod parameters;
pub mod primitives;
pub mod runner;
pub mod stages;
pub mod topology;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use classifier::{Color, CostClassifier};
pub use error::{LatencyError, Result};
pub use model::{LaneAggregator, LaneStages, LatencyModel, Stage, round_to};
pub use parameters::{Cell, Parameter, ParameterSource, ParameterStore, ScenarioView};
pub use primitives::{CostCategory, Lane, Scenario};
pub use runner::{FailurePolicy, RunReport, ScenarioArtifacts, ScenarioRunner, ScenarioSink};
pub use stages::{Derivation, LaneSpec, PIPELINE, StageResolver, StageSpec};
pub use topology::{DiagramEdge, DiagramNode, DiagramSpec, EdgeKind, LaneCluster, TopologyBuilder};
