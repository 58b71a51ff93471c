//! # Scenario Runner
//!
//! Drives the pipeline for one or more scenarios:
//!
//! ```text
//! ParameterSource ──► StageResolver ──► LaneAggregator ──► LatencyModel
//!                                                              │
//!                                             (optional) TopologyBuilder
//!                                                              │
//!                                                    ScenarioSink::accept
//! ```
//!
//! Scenarios run one after another, each independent of the others. A
//! batch is not atomic: artifacts already handed to the sink stay there when
//! a later scenario fails.

use crate::error::{LatencyError, Result};
use crate::model::{LaneAggregator, LatencyModel};
use crate::parameters::ParameterSource;
use crate::primitives::Scenario;
use crate::stages::{LaneSpec, PIPELINE, StageResolver};
use crate::topology::{DiagramSpec, TopologyBuilder};
use std::convert::Infallible;

/// What one scenario produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioArtifacts {
    pub model: LatencyModel,
    /// Present when the runner was asked for topology.
    pub diagram: Option<DiagramSpec>,
}

impl ScenarioArtifacts {
    #[must_use]
    pub fn scenario(&self) -> Scenario {
        self.model.scenario
    }
}

/// Receives artifacts as each scenario completes.
pub trait ScenarioSink {
    type Error;

    fn accept(&mut self, artifacts: &ScenarioArtifacts) -> std::result::Result<(), Self::Error>;
}

/// Collects artifacts in memory.
impl ScenarioSink for Vec<ScenarioArtifacts> {
    type Error = Infallible;

    fn accept(&mut self, artifacts: &ScenarioArtifacts) -> std::result::Result<(), Infallible> {
        self.push(artifacts.clone());
        Ok(())
    }
}

/// What to do when a scenario fails to resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failing scenario.
    #[default]
    Abort,
    /// Record the failure and move on.
    Continue,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub completed: Vec<Scenario>,
    pub failures: Vec<(Scenario, LatencyError)>,
}

impl RunReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn first_failure(&self) -> Option<&(Scenario, LatencyError)> {
        self.failures.first()
    }
}

pub struct ScenarioRunner<'a, S: ParameterSource + ?Sized> {
    source: &'a S,
    lanes: &'a [LaneSpec],
    topology: bool,
    policy: FailurePolicy,
}

impl<'a, S: ParameterSource + ?Sized> ScenarioRunner<'a, S> {
    /// Runner over the standard pipeline, models only, aborting on failure.
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            lanes: &PIPELINE,
            topology: false,
            policy: FailurePolicy::Abort,
        }
    }

    #[must_use]
    pub fn with_lanes(mut self, lanes: &'a [LaneSpec]) -> Self {
        self.lanes = lanes;
        self
    }

    #[must_use]
    pub fn with_topology(mut self, topology: bool) -> Self {
        self.topology = topology;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve and aggregate one scenario.
    pub fn model(&self, scenario: Scenario) -> Result<LatencyModel> {
        let lanes = StageResolver::with_lanes(self.source, self.lanes).resolve(scenario)?;
        Ok(LaneAggregator::aggregate(scenario, lanes))
    }

    /// Resolve one scenario, building its diagram if topology is enabled.
    pub fn resolve(&self, scenario: Scenario) -> Result<ScenarioArtifacts> {
        let model = self.model(scenario)?;
        let diagram = self.topology.then(|| TopologyBuilder::build(&model));
        Ok(ScenarioArtifacts { model, diagram })
    }

    /// Run each scenario in order, handing results to `sink`.
    ///
    /// Resolution failures are recorded in the report (and stop the batch
    /// under [`FailurePolicy::Abort`]). A sink error aborts immediately.
    pub fn run<K: ScenarioSink>(
        &self,
        scenarios: &[Scenario],
        sink: &mut K,
    ) -> std::result::Result<RunReport, K::Error> {
        let mut report = RunReport::default();

        for &scenario in scenarios {
            match self.resolve(scenario) {
                Ok(artifacts) => {
                    sink.accept(&artifacts)?;
                    report.completed.push(scenario);
                }
                Err(err) => {
                    report.failures.push((scenario, err));
                    if self.policy == FailurePolicy::Abort {
                        break;
                    }
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures;

    struct FailingSink;

    impl ScenarioSink for FailingSink {
        type Error = String;

        fn accept(&mut self, artifacts: &ScenarioArtifacts) -> std::result::Result<(), String> {
            Err(format!("disk full writing {}", artifacts.scenario()))
        }
    }

    #[test]
    fn resolve_without_topology() {
        let store = fixtures::reference_store();
        let artifacts = ScenarioRunner::new(&store).resolve(Scenario::Typical).unwrap();
        assert!(artifacts.diagram.is_none());
        assert_eq!(artifacts.scenario(), Scenario::Typical);
        assert!((artifacts.model.overall() - 173.184_333_333).abs() < 1e-6);
    }

    #[test]
    fn diagram_agrees_with_model() {
        let store = fixtures::reference_store();
        let artifacts = ScenarioRunner::new(&store)
            .with_topology(true)
            .resolve(Scenario::Worst)
            .unwrap();
        let diagram = artifacts.diagram.unwrap();
        assert_eq!(diagram.overall_ms, artifacts.model.overall());
        assert_eq!(diagram.stage_nodes().count(), artifacts.model.stage_count());
    }

    #[test]
    fn run_exported_scenarios() {
        let store = fixtures::reference_store();
        let mut sink: Vec<ScenarioArtifacts> = Vec::new();
        let report = ScenarioRunner::new(&store)
            .run(&Scenario::EXPORTED, &mut sink)
            .unwrap();
        assert!(report.is_success());
        assert_eq!(report.completed, Scenario::EXPORTED.to_vec());
        let order: Vec<Scenario> = sink.iter().map(ScenarioArtifacts::scenario).collect();
        assert_eq!(order, Scenario::EXPORTED.to_vec());
    }

    #[test]
    fn best_is_faster_than_worst() {
        let store = fixtures::reference_store();
        let runner = ScenarioRunner::new(&store);
        let best = runner.model(Scenario::Best).unwrap().overall();
        let typical = runner.model(Scenario::Typical).unwrap().overall();
        let worst = runner.model(Scenario::Worst).unwrap().overall();
        assert!(best < typical && typical < worst);
    }

    #[test]
    fn abort_stops_at_first_failure() {
        let store = fixtures::reference_store();
        let mut sink: Vec<ScenarioArtifacts> = Vec::new();
        let scenarios = [Scenario::Best, Scenario::Selected, Scenario::Worst];
        let report = ScenarioRunner::new(&store).run(&scenarios, &mut sink).unwrap();

        assert_eq!(report.completed, vec![Scenario::Best]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.first_failure().map(|f| f.0), Some(Scenario::Selected));
        // Best was already delivered.
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn continue_records_and_moves_on() {
        let store = fixtures::reference_store();
        let mut sink: Vec<ScenarioArtifacts> = Vec::new();
        let scenarios = [Scenario::Best, Scenario::Selected, Scenario::Worst];
        let report = ScenarioRunner::new(&store)
            .with_policy(FailurePolicy::Continue)
            .run(&scenarios, &mut sink)
            .unwrap();

        assert_eq!(report.completed, vec![Scenario::Best, Scenario::Worst]);
        assert!(!report.is_success());
        assert!(report.failures[0].1.is_resolution_error());
    }

    #[test]
    fn missing_parameter_fails_every_scenario() {
        let store = fixtures::reference_store_without("Decode latency (ms)");
        let mut sink: Vec<ScenarioArtifacts> = Vec::new();
        let report = ScenarioRunner::new(&store)
            .with_policy(FailurePolicy::Continue)
            .run(&Scenario::EXPORTED, &mut sink)
            .unwrap();
        assert!(sink.is_empty());
        assert_eq!(report.failures.len(), 3);
        assert!(report.failures.iter().all(|(_, e)| e.parameter() == Some("Decode latency (ms)")));
    }

    #[test]
    fn sink_error_aborts_run() {
        let store = fixtures::reference_store();
        let result = ScenarioRunner::new(&store)
            .with_policy(FailurePolicy::Continue)
            .run(&Scenario::EXPORTED, &mut FailingSink);
        assert_eq!(result, Err("disk full writing Best".to_string()));
    }
}
