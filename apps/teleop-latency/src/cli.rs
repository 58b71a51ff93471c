//! # CLI Commands
//!
//! File-facing implementations behind the `teleop-latency` subcommands.
//! Each `cmd_*` function loads the parameter table, drives the engine, and
//! writes or returns its output. `main.rs` only parses arguments.

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use teleop_latency_core::formats::{
    LatencyReport, TableDocument, TableFormat, TableOptions, parse_table, render_dot,
};
use teleop_latency_core::{
    FailurePolicy, LatencyError, LatencyModel, ParameterStore, RunReport, Scenario,
    ScenarioArtifacts, ScenarioRunner, ScenarioSink, TopologyBuilder, round_to,
};
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Default directory for the JSON reports.
pub const DEFAULT_OUTPUT_DIR: &str = "site/data";

/// Default path for the swimlane diagram.
pub const DEFAULT_DIAGRAM_PATH: &str = "teleop_latency_swimlane.dot";

/// Environment variable naming the parameter table.
pub const TABLE_ENV: &str = "TELEOP_LATENCY_TABLE";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum CliError {
    /// Reading the table failed.
    #[error(transparent)]
    Table(#[from] LatencyError),

    /// A scenario failed to resolve.
    #[error("scenario {scenario}: {source}")]
    Scenario {
        scenario: Scenario,
        source: LatencyError,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// More than one scenario failed.
    #[error("{} of {total} scenarios failed: {}", failures.len(), list_failures(failures))]
    Incomplete {
        failures: Vec<(Scenario, LatencyError)>,
        total: usize,
    },
}

fn list_failures(failures: &[(Scenario, LatencyError)]) -> String {
    failures
        .iter()
        .map(|(scenario, err)| format!("scenario {scenario}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl CliError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> CliError + '_ {
        move |source| CliError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn from_report(report: &RunReport, total: usize) -> Option<CliError> {
        match report.failures.as_slice() {
            [] => None,
            [(scenario, source)] => Some(CliError::Scenario {
                scenario: *scenario,
                source: source.clone(),
            }),
            many => Some(CliError::Incomplete {
                failures: many.to_vec(),
                total,
            }),
        }
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Where the parameter table comes from and how to read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInput {
    pub path: PathBuf,
    /// `None` picks the format from the file extension.
    pub format: Option<TableFormat>,
    /// Zero-based CSV header row; `None` scans for it.
    pub header_row: Option<usize>,
}

impl TableInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
            header_row: None,
        }
    }
}

/// Settings for the JSON report export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    /// Continue past a failing scenario instead of stopping.
    pub keep_going: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            keep_going: false,
        }
    }
}

/// Settings for the diagram export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramConfig {
    pub output: PathBuf,
    pub scenario: Scenario,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_DIAGRAM_PATH),
            scenario: Scenario::Typical,
        }
    }
}

// =============================================================================
// LOGGING
// =============================================================================

/// Initialize logging.
///
/// `RUST_LOG` overrides the default filter. The default is `info` for this
/// crate, or `debug` with `verbose`.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "teleop_latency=debug"
        } else {
            "teleop_latency=info"
        })
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// TABLE LOADING
// =============================================================================

pub fn load_store(input: &TableInput) -> Result<ParameterStore, CliError> {
    let format = match input.format {
        Some(format) => format,
        None => TableFormat::from_path(&input.path)?,
    };
    let text = fs::read_to_string(&input.path).map_err(CliError::io(&input.path))?;
    let options = TableOptions {
        header_row: input.header_row,
    };
    let store = parse_table(&text, format, &options)?;

    info!(
        path = %input.path.display(),
        format = ?format,
        parameters = store.len(),
        "Loaded parameter table"
    );
    Ok(store)
}

fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(CliError::io(parent))?;
    }
    fs::write(path, contents).map_err(CliError::io(path))
}

// =============================================================================
// SINKS
// =============================================================================

/// Writes one `latency_<Scenario>.json` per scenario into a directory.
pub struct JsonDirSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl JsonDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn into_written(self) -> Vec<PathBuf> {
        self.written
    }
}

impl ScenarioSink for JsonDirSink {
    type Error = CliError;

    fn accept(&mut self, artifacts: &ScenarioArtifacts) -> Result<(), CliError> {
        let scenario = artifacts.scenario();
        let path = self.dir.join(LatencyReport::file_name(scenario));
        let json = LatencyReport::from_model(&artifacts.model).to_json_pretty()?;
        write_file(&path, &json)?;

        info!(%scenario, path = %path.display(), "Wrote latency report");
        self.written.push(path);
        Ok(())
    }
}

/// Writes the DOT diagram of a scenario to a fixed path.
pub struct DotFileSink {
    path: PathBuf,
}

impl DotFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScenarioSink for DotFileSink {
    type Error = CliError;

    fn accept(&mut self, artifacts: &ScenarioArtifacts) -> Result<(), CliError> {
        let dot = match &artifacts.diagram {
            Some(diagram) => render_dot(diagram),
            None => render_dot(&TopologyBuilder::build(&artifacts.model)),
        };
        write_file(&self.path, &dot)?;

        info!(
            scenario = %artifacts.scenario(),
            path = %self.path.display(),
            "Wrote swimlane diagram"
        );
        Ok(())
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Export the Best, Typical and Worst JSON reports.
///
/// Returns the paths written. With `keep_going`, reports for the scenarios
/// that resolve are still written when another fails, but the call fails.
pub fn cmd_json(input: &TableInput, config: &ExportConfig) -> Result<Vec<PathBuf>, CliError> {
    let store = load_store(input)?;
    let policy = if config.keep_going {
        FailurePolicy::Continue
    } else {
        FailurePolicy::Abort
    };

    let mut sink = JsonDirSink::new(&config.output_dir);
    let report = ScenarioRunner::new(&store)
        .with_policy(policy)
        .run(&Scenario::EXPORTED, &mut sink)?;

    for (scenario, err) in &report.failures {
        warn!(%scenario, error = %err, "Scenario failed; no report written");
    }
    if let Some(err) = CliError::from_report(&report, Scenario::EXPORTED.len()) {
        return Err(err);
    }

    debug!(completed = report.completed.len(), "JSON export complete");
    Ok(sink.into_written())
}

/// Export the swimlane diagram for one scenario as DOT.
pub fn cmd_diagram(input: &TableInput, config: &DiagramConfig) -> Result<PathBuf, CliError> {
    let store = load_store(input)?;
    let mut sink = DotFileSink::new(&config.output);

    let report = ScenarioRunner::new(&store)
        .with_topology(true)
        .run(&[config.scenario], &mut sink)?;
    if let Some(err) = CliError::from_report(&report, 1) {
        return Err(err);
    }

    Ok(config.output.clone())
}

/// Per-lane totals for one scenario, as text or JSON.
pub fn cmd_summary(input: &TableInput, scenario: Scenario, as_json: bool) -> Result<String, CliError> {
    let store = load_store(input)?;
    let model = ScenarioRunner::new(&store)
        .model(scenario)
        .map_err(|source| CliError::Scenario { scenario, source })?;
    debug!(%scenario, stages = model.stage_count(), "Resolved scenario");

    if as_json {
        let report = LatencyReport::from_model(&model);
        let value = json!({
            "scenario": scenario.as_str(),
            "totals": report.totals,
            "overall": report.overall,
        });
        Ok(serde_json::to_string_pretty(&value).map_err(LatencyError::from)?)
    } else {
        Ok(format_summary(&model))
    }
}

/// Plain-text table of lane totals.
pub fn format_summary(model: &LatencyModel) -> String {
    let mut out = format!("Scenario: {}\n", model.scenario);
    for lane in model.lanes() {
        out.push_str(&format!(
            "  {:<10}{:>10.3} ms  ({} stages)\n",
            lane.lane.as_str(),
            round_to(lane.total(), 3),
            lane.len()
        ));
    }
    out.push_str(&format!("  {:<10}{:>10.3} ms\n", "Overall", round_to(model.overall(), 3)));
    out
}

/// Outcome of resolving every scenario against a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    /// Overall milliseconds per scenario, or the reason it failed.
    pub results: Vec<(Scenario, Result<f64, LatencyError>)>,
}

impl Validation {
    /// Whether every exported scenario resolves. `Selected` is optional.
    pub fn passed(&self) -> bool {
        self.results
            .iter()
            .filter(|(scenario, _)| Scenario::EXPORTED.contains(scenario))
            .all(|(_, result)| result.is_ok())
    }

    /// The error to exit with when an exported scenario fails.
    pub fn failure(&self) -> Option<CliError> {
        let failures: Vec<(Scenario, LatencyError)> = self
            .results
            .iter()
            .filter(|(scenario, _)| Scenario::EXPORTED.contains(scenario))
            .filter_map(|(scenario, result)| result.as_ref().err().map(|e| (*scenario, e.clone())))
            .collect();
        if failures.is_empty() {
            return None;
        }
        Some(CliError::Incomplete {
            failures,
            total: Scenario::EXPORTED.len(),
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (scenario, result) in &self.results {
            let name = scenario.as_str();
            match result {
                Ok(overall) => out.push_str(&format!("ok    {name:<9} {overall:.3} ms\n")),
                Err(err) => out.push_str(&format!("FAIL  {name:<9} {err}\n")),
            }
        }
        out
    }
}

/// Resolve all four scenarios and report which succeed.
pub fn cmd_validate(input: &TableInput) -> Result<Validation, CliError> {
    let store = load_store(input)?;
    let runner = ScenarioRunner::new(&store);

    let results = Scenario::ALL
        .into_iter()
        .map(|scenario| {
            let result = runner.model(scenario).map(|model| model.overall());
            match &result {
                Ok(_) => debug!(%scenario, "Scenario resolves"),
                Err(err) if scenario == Scenario::Selected => {
                    debug!(%scenario, error = %err, "Optional scenario does not resolve");
                }
                Err(err) => warn!(%scenario, error = %err, "Scenario does not resolve"),
            }
            (scenario, result)
        })
        .collect();

    Ok(Validation { results })
}

/// Write the table as a JSON [`TableDocument`].
pub fn cmd_convert(input: &TableInput, output: &Path) -> Result<(), CliError> {
    let store = load_store(input)?;
    let json = TableDocument::from_store(&store).to_json_pretty()?;
    write_file(output, &json)?;

    info!(path = %output.display(), parameters = store.len(), "Wrote JSON table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let export = ExportConfig::default();
        assert_eq!(export.output_dir, PathBuf::from("site/data"));
        assert!(!export.keep_going);

        let diagram = DiagramConfig::default();
        assert_eq!(diagram.output, PathBuf::from("teleop_latency_swimlane.dot"));
        assert_eq!(diagram.scenario, Scenario::Typical);
    }

    #[test]
    fn single_failure_names_scenario() {
        let report = RunReport {
            completed: vec![Scenario::Best],
            failures: vec![(
                Scenario::Worst,
                LatencyError::ParameterNotFound {
                    name: "Decode latency (ms)".to_string(),
                },
            )],
        };
        let err = CliError::from_report(&report, 3).map(|e| e.to_string());
        assert_eq!(
            err.as_deref(),
            Some("scenario Worst: parameter not found: 'Decode latency (ms)'")
        );
    }

    #[test]
    fn several_failures_are_all_listed() {
        let missing = |scenario| LatencyError::ParameterValueMissing {
            name: "Camera FPS (Hz)".to_string(),
            scenario,
        };
        let report = RunReport {
            completed: vec![Scenario::Typical],
            failures: vec![
                (Scenario::Best, missing(Scenario::Best)),
                (Scenario::Worst, missing(Scenario::Worst)),
            ],
        };
        let message = CliError::from_report(&report, 3).map(|e| e.to_string());
        assert_eq!(
            message.as_deref(),
            Some(
                "2 of 3 scenarios failed: \
                 scenario Best: parameter 'Camera FPS (Hz)' has no value for scenario Best; \
                 scenario Worst: parameter 'Camera FPS (Hz)' has no value for scenario Worst"
            )
        );
    }

    #[test]
    fn clean_report_is_not_an_error() {
        assert!(CliError::from_report(&RunReport::default(), 3).is_none());
    }
}
