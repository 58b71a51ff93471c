//! # Latency Model
//!
//! Resolved stages, lanes, and the per-scenario aggregate.
//!
//! Aggregation is a plain sum with no special-casing. Rounding happens only
//! at the reporting boundary (see [`round_to`]); every value held here is
//! full precision.

use crate::classifier::Color;
use crate::primitives::{Lane, Scenario};
use std::collections::BTreeMap;

// =============================================================================
// STAGE
// =============================================================================

/// A stage with its duration resolved for one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: String,
    pub lane: Lane,
    pub duration_ms: f64,
    pub color: Color,
}

// =============================================================================
// LANE STAGES
// =============================================================================

/// The ordered resolved stages of one lane.
///
/// Order is significant: it is both the summation order and the chain of
/// sequential edges in the diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneStages {
    pub lane: Lane,
    pub stages: Vec<Stage>,
}

impl LaneStages {
    #[must_use]
    pub fn new(lane: Lane, stages: Vec<Stage>) -> Self {
        Self { lane, stages }
    }

    /// Entry point of the lane.
    #[must_use]
    pub fn first(&self) -> Option<&Stage> {
        self.stages.first()
    }

    /// Exit point of the lane.
    #[must_use]
    pub fn last(&self) -> Option<&Stage> {
        self.stages.last()
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        LaneAggregator::total(self)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

// =============================================================================
// LATENCY MODEL
// =============================================================================

/// Everything derived for one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyModel {
    pub scenario: Scenario,
    lanes: Vec<LaneStages>,
    totals: BTreeMap<Lane, f64>,
    overall: f64,
}

impl LatencyModel {
    /// Lanes in catalog order.
    #[must_use]
    pub fn lanes(&self) -> &[LaneStages] {
        &self.lanes
    }

    #[must_use]
    pub fn lane(&self, lane: Lane) -> Option<&LaneStages> {
        self.lanes.iter().find(|l| l.lane == lane)
    }

    /// Unrounded total for a lane; zero for a lane with no stages.
    #[must_use]
    pub fn total(&self, lane: Lane) -> f64 {
        self.totals.get(&lane).copied().unwrap_or(0.0)
    }

    /// Unrounded lane totals, in pipeline order.
    #[must_use]
    pub fn totals(&self) -> &BTreeMap<Lane, f64> {
        &self.totals
    }

    /// Unrounded sum of all lane totals.
    #[must_use]
    pub fn overall(&self) -> f64 {
        self.overall
    }

    /// Every stage, lane by lane.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.lanes.iter().flat_map(|l| l.stages.iter())
    }

    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.lanes.iter().map(LaneStages::len).sum()
    }
}

// =============================================================================
// LANE AGGREGATOR
// =============================================================================

/// Sums stage durations into lane totals and the overall figure.
pub struct LaneAggregator;

impl LaneAggregator {
    /// Σ stage durations, in stage order.
    #[must_use]
    pub fn total(lane: &LaneStages) -> f64 {
        lane.stages.iter().map(|s| s.duration_ms).sum()
    }

    /// Σ lane totals, in pipeline order.
    #[must_use]
    pub fn overall(totals: &BTreeMap<Lane, f64>) -> f64 {
        totals.values().sum()
    }

    /// Build the model for a scenario from its resolved lanes.
    #[must_use]
    pub fn aggregate(scenario: Scenario, lanes: Vec<LaneStages>) -> LatencyModel {
        let mut totals = BTreeMap::new();
        for lane in &lanes {
            *totals.entry(lane.lane).or_insert(0.0) += Self::total(lane);
        }
        let overall = Self::overall(&totals);

        LatencyModel {
            scenario,
            lanes,
            totals,
            overall,
        }
    }
}

/// Round half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(lane: Lane, name: &str, ms: f64) -> Stage {
        Stage {
            name: name.to_string(),
            lane,
            duration_ms: ms,
            color: Color::LIGHT_GREEN,
        }
    }

    fn sample() -> LatencyModel {
        LaneAggregator::aggregate(
            Scenario::Typical,
            vec![
                LaneStages::new(
                    Lane::Leader,
                    vec![stage(Lane::Leader, "a", 1.5), stage(Lane::Leader, "b", 0.256)],
                ),
                LaneStages::new(Lane::Network, vec![stage(Lane::Network, "n", 5.75)]),
                LaneStages::new(Lane::Follower, vec![]),
                LaneStages::new(
                    Lane::Video,
                    vec![stage(Lane::Video, "v1", 16.6666), stage(Lane::Video, "v2", -0.5)],
                ),
            ],
        )
    }

    #[test]
    fn lane_totals_are_stage_sums() {
        let model = sample();
        assert!((model.total(Lane::Leader) - 1.756).abs() < 1e-9);
        assert!((model.total(Lane::Network) - 5.75).abs() < 1e-9);
        assert!((model.total(Lane::Video) - 16.1666).abs() < 1e-9);
    }

    #[test]
    fn empty_lane_totals_zero() {
        let model = sample();
        assert_eq!(model.total(Lane::Follower), 0.0);
        assert!(model.lane(Lane::Follower).is_some_and(LaneStages::is_empty));
    }

    #[test]
    fn overall_is_sum_of_lane_totals() {
        let model = sample();
        let sum: f64 = Lane::ALL.iter().map(|l| model.total(*l)).sum();
        assert!((model.overall() - sum).abs() < 1e-9);
    }

    #[test]
    fn totals_iterate_in_pipeline_order() {
        let model = sample();
        let lanes: Vec<Lane> = model.totals().keys().copied().collect();
        assert_eq!(lanes, Lane::ALL.to_vec());
    }

    #[test]
    fn first_and_last_stage() {
        let model = sample();
        let leader = model.lane(Lane::Leader);
        assert_eq!(leader.and_then(LaneStages::first).map(|s| s.name.as_str()), Some("a"));
        assert_eq!(leader.and_then(LaneStages::last).map(|s| s.name.as_str()), Some("b"));
        assert_eq!(model.stage_count(), 5);
    }

    #[test]
    fn rounding_only_at_boundary() {
        assert_eq!(round_to(173.184_333_3, 3), 173.184);
        assert_eq!(round_to(0.2565, 1), 0.3);
        assert_eq!(round_to(8.333_333, 1), 8.3);
        assert_eq!(round_to(-1.23456, 2), -1.23);
    }
}
