//! Per-scenario JSON latency report.
//!
//! ```json
//! {
//!   "lanes":   { "Leader": [ { "name": "...", "ms": 1.0, "color": "#F8CBAD" } ], ... },
//!   "totals":  { "Leader": 13.006, "Network": 5.75, ... },
//!   "overall": 173.184
//! }
//! ```
//!
//! Stage durations are written at full precision; totals and the overall
//! figure are rounded to [`REPORT_DECIMALS`] places. The overall figure is
//! rounded from the unrounded lane totals, so it need not equal the sum of
//! the rounded totals shown beside it.

use crate::error::Result;
use crate::model::{LatencyModel, round_to};
use crate::primitives::{Lane, Scenario};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const REPORT_DECIMALS: i32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEntry {
    pub name: String,
    pub ms: f64,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyReport {
    pub lanes: BTreeMap<Lane, Vec<StageEntry>>,
    pub totals: BTreeMap<Lane, f64>,
    pub overall: f64,
}

impl LatencyReport {
    #[must_use]
    pub fn from_model(model: &LatencyModel) -> Self {
        let lanes = model
            .lanes()
            .iter()
            .map(|lane| {
                let entries = lane
                    .stages
                    .iter()
                    .map(|stage| StageEntry {
                        name: stage.name.clone(),
                        ms: stage.duration_ms,
                        color: Some(stage.color.hex().to_string()),
                    })
                    .collect();
                (lane.lane, entries)
            })
            .collect();

        let totals = model
            .totals()
            .iter()
            .map(|(&lane, &total)| (lane, round_to(total, REPORT_DECIMALS)))
            .collect();

        Self {
            lanes,
            totals,
            overall: round_to(model.overall(), REPORT_DECIMALS),
        }
    }

    /// Output file name for a scenario's report.
    #[must_use]
    pub fn file_name(scenario: Scenario) -> String {
        format!("latency_{scenario}.json")
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::runner::ScenarioRunner;

    fn typical_report() -> LatencyReport {
        let store = fixtures::reference_store();
        let artifacts = ScenarioRunner::new(&store).resolve(Scenario::Typical).unwrap();
        LatencyReport::from_model(&artifacts.model)
    }

    #[test]
    fn totals_and_overall_are_rounded() {
        let report = typical_report();
        assert_eq!(report.totals[&Lane::Leader], 13.006);
        assert_eq!(report.totals[&Lane::Network], 5.75);
        assert_eq!(report.totals[&Lane::Follower], 41.012);
        assert_eq!(report.totals[&Lane::Video], 113.416);
        assert_eq!(report.overall, 173.184);
    }

    #[test]
    fn stage_ms_is_full_precision() {
        let report = typical_report();
        let frame_wait = &report.lanes[&Lane::Video][1];
        assert_eq!(frame_wait.name, "Frame period avg wait");
        assert!((frame_wait.ms - 1000.0 / 60.0 / 2.0).abs() < 1e-12);
        assert_ne!(frame_wait.ms, 8.333);
    }

    #[test]
    fn every_stage_has_a_color() {
        let report = typical_report();
        assert!(report.lanes.values().flatten().all(|s| s.color.is_some()));
        assert_eq!(
            report.lanes[&Lane::Network][0].color.as_deref(),
            Some("#F4CCCC")
        );
    }

    #[test]
    fn json_lanes_in_pipeline_order() {
        let json = typical_report().to_json_pretty().unwrap();
        let leader = json.find("\"Leader\"").unwrap();
        let network = json.find("\"Network\"").unwrap();
        let follower = json.find("\"Follower\"").unwrap();
        let video = json.find("\"Video\"").unwrap();
        assert!(leader < network && network < follower && follower < video);
        assert!(json.contains("\"overall\": 173.184"));
    }

    #[test]
    fn file_name_per_scenario() {
        assert_eq!(LatencyReport::file_name(Scenario::Worst), "latency_Worst.json");
    }
}
