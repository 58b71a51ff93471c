//! # Stage Resolver
//!
//! The per-lane stage catalog and the derivation rules that turn table
//! parameters into stage durations.
//!
//! There is exactly one catalog ([`PIPELINE`]); the JSON report and the
//! swimlane diagram are both produced from what this module resolves, so the
//! two artifacts cannot drift apart.
//!
//! All durations are milliseconds.

use crate::classifier::{Color, CostClassifier};
use crate::error::Result;
use crate::model::{LaneStages, Stage};
use crate::parameters::{ParameterSource, ScenarioView};
use crate::primitives::{CostCategory, Lane, Scenario};

// =============================================================================
// PARAMETER NAMES (shared by more than one stage)
// =============================================================================

pub const CONTROL_LOOP_RATE: &str = "Control loop rate (Hz)";
pub const OS_SCHEDULING_JITTER: &str = "OS scheduling jitter (ms)";
pub const DISTANCE_KM: &str = "Straight-line distance (km)";
pub const ROUTING_FACTOR: &str = "Distance routing factor";
pub const FIBER_SPEED_KM_PER_MS: &str = "Fiber speed (km/ms)";
pub const COMMAND_NETWORK_EXTRA: &str = "Command network extra (ms)";
pub const EXTRA_NETWORK_OVERHEAD: &str = "Extra network overhead (ms)";
pub const TURN_SFU_EXTRA_HOPS: &str = "TURN/SFU extra hops (ms)";

// =============================================================================
// FORMULAS
// =============================================================================

/// Expected wait for a periodic process with uniformly distributed arrival
/// phase: half the period.
#[must_use]
pub fn average_wait_ms(rate_hz: f64) -> f64 {
    (1000.0 / rate_hz) / 2.0
}

/// Time to clock `payload_bytes` over a serial link at `baud_bps`.
#[must_use]
pub fn serialization_ms(payload_bytes: f64, baud_bps: f64) -> f64 {
    (payload_bytes * 8.0 / baud_bps) * 1000.0
}

/// One-way fiber propagation over the routed distance.
#[must_use]
pub fn propagation_ms(distance_km: f64, routing_factor: f64, fiber_speed_km_per_ms: f64) -> f64 {
    distance_km * routing_factor / fiber_speed_km_per_ms
}

// =============================================================================
// DERIVATION RULES
// =============================================================================

/// How a stage's duration is computed from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// The parameter's value, verbatim.
    Direct(&'static str),
    /// [`average_wait_ms`] of a rate in Hz.
    AverageWait { rate_hz: &'static str },
    /// [`serialization_ms`] of a payload size and baud rate.
    Serialization {
        payload_bytes: &'static str,
        baud_bps: &'static str,
    },
    /// [`propagation_ms`] over the shared distance/routing/fiber parameters,
    /// plus the listed per-path overheads.
    Propagation { extras: &'static [&'static str] },
}

impl Derivation {
    /// Every parameter this rule reads, in evaluation order.
    #[must_use]
    pub fn parameters(&self) -> Vec<&'static str> {
        match *self {
            Derivation::Direct(name) => vec![name],
            Derivation::AverageWait { rate_hz } => vec![rate_hz],
            Derivation::Serialization {
                payload_bytes,
                baud_bps,
            } => vec![payload_bytes, baud_bps],
            Derivation::Propagation { extras } => {
                let mut names = vec![DISTANCE_KM, ROUTING_FACTOR, FIBER_SPEED_KM_PER_MS];
                names.extend_from_slice(extras);
                names
            }
        }
    }

    /// The parameter whose cost category colors the stage.
    #[must_use]
    pub fn primary_parameter(&self) -> &'static str {
        match *self {
            Derivation::Direct(name) => name,
            Derivation::AverageWait { rate_hz } => rate_hz,
            Derivation::Serialization { payload_bytes, .. } => payload_bytes,
            Derivation::Propagation { .. } => DISTANCE_KM,
        }
    }

    /// Evaluate the rule. Parameters are read in [`Self::parameters`] order,
    /// so the first missing one is the one reported.
    pub fn evaluate<S: ParameterSource + ?Sized>(&self, view: &ScenarioView<'_, S>) -> Result<f64> {
        match *self {
            Derivation::Direct(name) => view.get(name),
            Derivation::AverageWait { rate_hz } => Ok(average_wait_ms(view.get(rate_hz)?)),
            Derivation::Serialization {
                payload_bytes,
                baud_bps,
            } => {
                let bytes = view.get(payload_bytes)?;
                let baud = view.get(baud_bps)?;
                Ok(serialization_ms(bytes, baud))
            }
            Derivation::Propagation { extras } => {
                let distance = view.get(DISTANCE_KM)?;
                let routing = view.get(ROUTING_FACTOR)?;
                let speed = view.get(FIBER_SPEED_KM_PER_MS)?;
                let mut total = propagation_ms(distance, routing, speed);
                for extra in extras {
                    total += view.get(extra)?;
                }
                Ok(total)
            }
        }
    }
}

// =============================================================================
// STAGE & LANE SPECS
// =============================================================================

/// Where a stage's color comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRule {
    /// The cost category of the derivation's primary parameter.
    FromParameter,
    /// A fixed category, regardless of what the table declares.
    Fixed(CostCategory),
}

/// A named stage and its derivation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec {
    pub name: &'static str,
    pub derivation: Derivation,
    pub color: ColorRule,
}

impl StageSpec {
    pub const fn direct(name: &'static str, parameter: &'static str) -> Self {
        Self {
            name,
            derivation: Derivation::Direct(parameter),
            color: ColorRule::FromParameter,
        }
    }

    pub const fn average_wait(name: &'static str, rate_hz: &'static str) -> Self {
        Self {
            name,
            derivation: Derivation::AverageWait { rate_hz },
            color: ColorRule::FromParameter,
        }
    }

    pub const fn serialization(
        name: &'static str,
        payload_bytes: &'static str,
        baud_bps: &'static str,
    ) -> Self {
        Self {
            name,
            derivation: Derivation::Serialization {
                payload_bytes,
                baud_bps,
            },
            color: ColorRule::FromParameter,
        }
    }

    /// Network propagation stages are a composite of physical and network
    /// terms, so they always take the `Infra` color.
    pub const fn propagation(name: &'static str, extras: &'static [&'static str]) -> Self {
        Self {
            name,
            derivation: Derivation::Propagation { extras },
            color: ColorRule::Fixed(CostCategory::Infra),
        }
    }

    fn resolve_color<S: ParameterSource + ?Sized>(&self, view: &ScenarioView<'_, S>) -> Color {
        let category = match self.color {
            ColorRule::FromParameter => view.cost_of(self.derivation.primary_parameter()),
            ColorRule::Fixed(category) => category,
        };
        CostClassifier::color_of(category)
    }
}

/// One lane and its ordered stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneSpec {
    pub lane: Lane,
    pub stages: &'static [StageSpec],
}

const LEADER_STAGES: &[StageSpec] = &[
    StageSpec::direct("Leader sensor sampling", "Leader sensor sampling (ms)"),
    StageSpec::average_wait("Control loop sched avg", CONTROL_LOOP_RATE),
    StageSpec::direct("OS scheduling jitter", OS_SCHEDULING_JITTER),
    StageSpec::serialization(
        "Leader USB serialization",
        "Leader USB payload size (bytes)",
        "Leader USB serial baud rate (bps)",
    ),
    StageSpec::direct("Leader USB overhead", "Leader USB overhead (ms)"),
    StageSpec::direct("Command packetization", "Command packetization (ms)"),
];

const NETWORK_STAGES: &[StageSpec] = &[StageSpec::propagation(
    "Command network one-way",
    &[COMMAND_NETWORK_EXTRA],
)];

const FOLLOWER_STAGES: &[StageSpec] = &[
    StageSpec::serialization(
        "Follower USB serialization",
        "Follower USB payload size (bytes)",
        "Follower USB serial baud rate (bps)",
    ),
    StageSpec::direct("Follower USB overhead", "Follower USB overhead (ms)"),
    StageSpec::average_wait("Control loop sched avg", CONTROL_LOOP_RATE),
    StageSpec::direct("OS scheduling jitter", OS_SCHEDULING_JITTER),
    StageSpec::direct("Motor driver processing", "Motor driver processing (ms)"),
    StageSpec::direct("Servo command deadband", "Servo command deadband (ms)"),
    StageSpec::direct("Mechanical backlash/slop", "Mechanical backlash/slop (ms)"),
    StageSpec::direct(
        "Motor accel to visible motion",
        "Motor accel to visible motion (ms)",
    ),
];

const VIDEO_STAGES: &[StageSpec] = &[
    StageSpec::direct("Sensor exposure", "Exposure/rolling-shutter share (ms)"),
    StageSpec::average_wait("Frame period avg wait", "Camera FPS (Hz)"),
    StageSpec::direct("Sensor to memory/ISP", "Sensor → memory/ISP (ms)"),
    StageSpec::direct("Capture buffer", "Capture buffer (ms)"),
    StageSpec::direct("Encode latency", "Encode latency (ms)"),
    StageSpec::direct("Packetization", "Packetization (ms)"),
    StageSpec::direct("FEC/RED overhead", "FEC/RED overhead (ms)"),
    StageSpec::propagation(
        "Network one-way (video)",
        &[EXTRA_NETWORK_OVERHEAD, TURN_SFU_EXTRA_HOPS],
    ),
    StageSpec::direct("Jitter buffer target", "Jitter buffer target (ms)"),
    StageSpec::direct("Decode latency", "Decode latency (ms)"),
    StageSpec::direct("Renderer/compositor", "Renderer/compositor (ms)"),
    StageSpec::direct("Vsync avg wait", "Vsync avg wait (ms)"),
];

/// The teleop pipeline, lane by lane, in order.
pub const PIPELINE: [LaneSpec; 4] = [
    LaneSpec {
        lane: Lane::Leader,
        stages: LEADER_STAGES,
    },
    LaneSpec {
        lane: Lane::Network,
        stages: NETWORK_STAGES,
    },
    LaneSpec {
        lane: Lane::Follower,
        stages: FOLLOWER_STAGES,
    },
    LaneSpec {
        lane: Lane::Video,
        stages: VIDEO_STAGES,
    },
];

/// Every distinct parameter name the catalog reads, sorted.
#[must_use]
pub fn required_parameters(lanes: &[LaneSpec]) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = lanes
        .iter()
        .flat_map(|lane| lane.stages.iter())
        .flat_map(|stage| stage.derivation.parameters())
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}

// =============================================================================
// STAGE RESOLVER
// =============================================================================

/// Resolves a lane catalog against a parameter source.
pub struct StageResolver<'a, S: ParameterSource + ?Sized> {
    source: &'a S,
    lanes: &'a [LaneSpec],
}

impl<'a, S: ParameterSource + ?Sized> StageResolver<'a, S> {
    /// Resolver over the standard [`PIPELINE`].
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            lanes: &PIPELINE,
        }
    }

    /// Resolver over a custom catalog.
    pub fn with_lanes(source: &'a S, lanes: &'a [LaneSpec]) -> Self {
        Self { source, lanes }
    }

    /// Resolve a single stage.
    pub fn resolve_stage(&self, lane: Lane, spec: &StageSpec, scenario: Scenario) -> Result<Stage> {
        let view = ScenarioView::new(self.source, scenario);
        let duration_ms = spec.derivation.evaluate(&view)?;
        Ok(Stage {
            name: spec.name.to_string(),
            lane,
            duration_ms,
            color: spec.resolve_color(&view),
        })
    }

    /// Resolve every lane for `scenario`.
    ///
    /// All-or-nothing: the first failing stage aborts the whole scenario and
    /// no partial lane list is returned.
    pub fn resolve(&self, scenario: Scenario) -> Result<Vec<LaneStages>> {
        self.lanes
            .iter()
            .map(|spec| {
                let stages = spec
                    .stages
                    .iter()
                    .map(|stage| self.resolve_stage(spec.lane, stage, scenario))
                    .collect::<Result<Vec<_>>>()?;
                Ok(LaneStages::new(spec.lane, stages))
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::LatencyError;
    use crate::fixtures;
    use crate::parameters::{Parameter, ParameterStore};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn serialization_formula() {
        assert!(close(serialization_ms(32.0, 1_000_000.0), 0.256));
    }

    #[test]
    fn average_wait_formula() {
        assert!(close(average_wait_ms(50.0), 10.0));
    }

    #[test]
    fn propagation_formula() {
        assert!(close(propagation_ms(100.0, 1.5, 200.0) + 5.0, 5.75));
    }

    #[test]
    fn catalog_stage_counts() {
        let counts: Vec<usize> = PIPELINE.iter().map(|l| l.stages.len()).collect();
        assert_eq!(counts, vec![6, 1, 8, 12]);
        let lanes: Vec<Lane> = PIPELINE.iter().map(|l| l.lane).collect();
        assert_eq!(lanes, Lane::ALL.to_vec());
    }

    #[test]
    fn required_parameters_are_distinct() {
        let names = required_parameters(&PIPELINE);
        assert!(names.contains(&CONTROL_LOOP_RATE));
        assert!(names.contains(&TURN_SFU_EXTRA_HOPS));
        // 27 stages; shared and multi-parameter rules give 31 distinct names.
        assert_eq!(names.len(), 31);
    }

    #[test]
    fn resolves_reference_table() {
        let store = fixtures::reference_store();
        let lanes = StageResolver::new(&store).resolve(Scenario::Typical).unwrap();

        let leader = &lanes[0];
        assert_eq!(leader.lane, Lane::Leader);
        assert_eq!(leader.stages.len(), 6);
        assert!(close(leader.stages[1].duration_ms, 10.0));
        assert!(close(leader.stages[3].duration_ms, 0.256));

        let network = &lanes[1];
        assert!(close(network.stages[0].duration_ms, 5.75));

        let video = &lanes[3];
        assert_eq!(video.stages[7].name, "Network one-way (video)");
        assert!(close(video.stages[7].duration_ms, 0.75 + 10.0 + 5.0));
    }

    /// Reference store with the distance row's cost category replaced.
    fn store_with_distance_cost(cost: Option<CostCategory>) -> ParameterStore {
        let parameters = fixtures::reference_parameters().into_iter().map(|mut p| {
            if p.name == DISTANCE_KM {
                p.cost = cost;
            }
            p
        });
        ParameterStore::from_parameters(parameters).unwrap()
    }

    #[test]
    fn network_stages_are_always_infra() {
        for cost in [Some(CostCategory::Hardware), Some(CostCategory::Software), None] {
            let store = store_with_distance_cost(cost);
            let lanes = StageResolver::new(&store).resolve(Scenario::Typical).unwrap();
            assert_eq!(lanes[1].stages[0].color, Color::LIGHT_RED, "{cost:?}");
            assert_eq!(lanes[1].stages[0].color.hex(), "#F4CCCC");
            assert_eq!(lanes[3].stages[7].color, Color::LIGHT_RED, "{cost:?}");
        }
    }

    #[test]
    fn formula_stages_take_primary_parameter_color() {
        let store = fixtures::reference_store();
        let lanes = StageResolver::new(&store).resolve(Scenario::Typical).unwrap();
        // Leader USB payload is Config; the baud rate's category is ignored.
        assert_eq!(lanes[0].stages[3].color, Color::LIGHT_GREEN);
        // Leader sensor sampling is Hardware.
        assert_eq!(lanes[0].stages[0].color, Color::LIGHT_ORANGE);
    }

    #[test]
    fn missing_parameter_aborts_scenario() {
        let store = fixtures::reference_store_without("Vsync avg wait (ms)");
        let result = StageResolver::new(&store).resolve(Scenario::Typical);
        assert_eq!(
            result,
            Err(LatencyError::ParameterNotFound {
                name: "Vsync avg wait (ms)".to_string()
            })
        );
    }

    #[test]
    fn missing_scenario_value_names_parameter_and_scenario() {
        let store = fixtures::reference_store();
        let result = StageResolver::new(&store).resolve(Scenario::Selected);
        // First stage, first parameter.
        assert_eq!(
            result,
            Err(LatencyError::ParameterValueMissing {
                name: "Leader sensor sampling (ms)".to_string(),
                scenario: Scenario::Selected,
            })
        );
    }

    #[test]
    fn propagation_reports_first_missing_term() {
        let store = ParameterStore::from_parameters(vec![
            Parameter::new(DISTANCE_KM).with_value(Scenario::Typical, 100.0),
            Parameter::new(ROUTING_FACTOR).with_value(Scenario::Typical, 1.5),
        ])
        .unwrap();
        let view = ScenarioView::new(&store, Scenario::Typical);
        let rule = Derivation::Propagation {
            extras: &[COMMAND_NETWORK_EXTRA],
        };
        assert_eq!(
            rule.evaluate(&view),
            Err(LatencyError::ParameterNotFound {
                name: FIBER_SPEED_KM_PER_MS.to_string()
            })
        );
    }

    #[test]
    fn custom_catalog_is_resolved_in_order() {
        const STAGES: &[StageSpec] = &[StageSpec::direct("Only", "Capture buffer (ms)")];
        let catalog = [LaneSpec {
            lane: Lane::Video,
            stages: STAGES,
        }];
        let store = fixtures::reference_store();
        let lanes = StageResolver::with_lanes(&store, &catalog)
            .resolve(Scenario::Typical)
            .unwrap();
        assert_eq!(lanes.len(), 1);
        assert!(close(lanes[0].stages[0].duration_ms, 5.0));
    }
}
