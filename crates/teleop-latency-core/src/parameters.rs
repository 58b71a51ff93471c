//! # Parameter Store
//!
//! Typed access to the named timing parameters of one table snapshot.
//!
//! A [`ParameterStore`] is built once from the ingested table and is
//! read-only afterward. Lookups return a tagged [`Result`] instead of
//! raising at arbitrary call sites, so a missing or malformed cell is
//! reported with the exact parameter name and scenario.

use crate::error::{LatencyError, Result};
use crate::primitives::{CostCategory, Scenario};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

// =============================================================================
// CELL
// =============================================================================

/// A raw value cell from the table.
///
/// Text is kept verbatim so that a non-numeric entry surfaces as
/// [`LatencyError::InvalidParameterValue`] only when a stage actually reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

/// Outcome of reading a cell as a number.
#[derive(Debug, Clone, PartialEq)]
enum Reading {
    Value(f64),
    Empty,
    Invalid(String),
}

impl Cell {
    fn read(&self) -> Reading {
        match self {
            Cell::Number(v) if v.is_nan() => Reading::Empty,
            Cell::Number(v) if v.is_finite() => Reading::Value(*v),
            Cell::Number(v) => Reading::Invalid(v.to_string()),
            Cell::Text(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
                    return Reading::Empty;
                }
                match trimmed.parse::<f64>() {
                    Ok(v) if v.is_finite() => Reading::Value(v),
                    _ => Reading::Invalid(raw.clone()),
                }
            }
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

// =============================================================================
// PARAMETER
// =============================================================================

/// One row of the parameter table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub description: String,
    pub notes: String,
    /// Declared cost category; `None` when the cell was blank.
    pub cost: Option<CostCategory>,
    values: BTreeMap<Scenario, Cell>,
}

impl Parameter {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    #[must_use]
    pub fn with_cost(mut self, cost: CostCategory) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Set a numeric value for one scenario column.
    #[must_use]
    pub fn with_value(self, scenario: Scenario, value: f64) -> Self {
        self.with_cell(scenario, Cell::Number(value))
    }

    /// Set a raw text cell for one scenario column.
    #[must_use]
    pub fn with_text(self, scenario: Scenario, raw: impl Into<String>) -> Self {
        self.with_cell(scenario, Cell::Text(raw.into()))
    }

    #[must_use]
    pub fn with_cell(mut self, scenario: Scenario, cell: Cell) -> Self {
        self.values.insert(scenario, cell);
        self
    }

    /// The raw cell for a scenario, if one was provided.
    #[must_use]
    pub fn cell(&self, scenario: Scenario) -> Option<&Cell> {
        self.values.get(&scenario)
    }

    /// The numeric value for a scenario.
    pub fn value(&self, scenario: Scenario) -> Result<f64> {
        let reading = self
            .values
            .get(&scenario)
            .map(Cell::read)
            .unwrap_or(Reading::Empty);

        match reading {
            Reading::Value(v) => Ok(v),
            Reading::Empty => Err(LatencyError::ParameterValueMissing {
                name: self.name.clone(),
                scenario,
            }),
            Reading::Invalid(raw) => Err(LatencyError::InvalidParameterValue {
                name: self.name.clone(),
                scenario,
                raw,
            }),
        }
    }
}

// =============================================================================
// PARAMETER SOURCE TRAIT
// =============================================================================

/// Read access to named parameters.
///
/// The stage resolver only sees this trait, which keeps derivation testable
/// apart from table-parsing mechanics.
pub trait ParameterSource {
    /// Resolve `name` for `scenario` to a number.
    fn get(&self, name: &str, scenario: Scenario) -> Result<f64>;

    /// The declared cost category of `name`, or `Software`. Never fails.
    fn cost_of(&self, name: &str) -> CostCategory;
}

/// A source pinned to one scenario, as seen by a stage formula.
#[derive(Debug)]
pub struct ScenarioView<'a, S: ParameterSource + ?Sized> {
    source: &'a S,
    scenario: Scenario,
}

impl<'a, S: ParameterSource + ?Sized> ScenarioView<'a, S> {
    pub fn new(source: &'a S, scenario: Scenario) -> Self {
        Self { source, scenario }
    }

    pub fn get(&self, name: &str) -> Result<f64> {
        self.source.get(name, self.scenario)
    }

    pub fn cost_of(&self, name: &str) -> CostCategory {
        self.source.cost_of(name)
    }

    #[must_use]
    pub fn scenario(&self) -> Scenario {
        self.scenario
    }
}

// =============================================================================
// PARAMETER STORE
// =============================================================================

/// Immutable name → [`Parameter`] mapping for one run.
///
/// Uses `BTreeMap` so iteration (and therefore any derived output) is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterStore {
    parameters: BTreeMap<String, Parameter>,
}

impl ParameterStore {
    /// Build a store, rejecting duplicate names.
    pub fn from_parameters<I>(parameters: I) -> Result<Self>
    where
        I: IntoIterator<Item = Parameter>,
    {
        let mut map = BTreeMap::new();
        for parameter in parameters {
            match map.entry(parameter.name.clone()) {
                Entry::Occupied(_) => {
                    return Err(LatencyError::DuplicateParameter {
                        name: parameter.name,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(parameter);
                }
            }
        }
        Ok(Self { parameters: map })
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    /// All parameters in name order.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl ParameterSource for ParameterStore {
    fn get(&self, name: &str, scenario: Scenario) -> Result<f64> {
        self.parameters
            .get(name)
            .ok_or_else(|| LatencyError::ParameterNotFound {
                name: name.to_string(),
            })?
            .value(scenario)
    }

    fn cost_of(&self, name: &str) -> CostCategory {
        self.parameters
            .get(name)
            .and_then(|p| p.cost)
            .unwrap_or_default()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> ParameterStore {
        ParameterStore::from_parameters(vec![
            Parameter::new("Camera FPS (Hz)")
                .with_value(Scenario::Best, 120.0)
                .with_value(Scenario::Typical, 60.0)
                .with_cost(CostCategory::Config),
            Parameter::new("Encode latency (ms)")
                .with_text(Scenario::Typical, " 12.5 ")
                .with_text(Scenario::Worst, "slow")
                .with_text(Scenario::Best, ""),
            Parameter::new("Decode latency (ms)")
                .with_value(Scenario::Typical, f64::NAN)
                .with_value(Scenario::Worst, f64::INFINITY),
        ])
        .unwrap()
    }

    #[test]
    fn get_returns_numeric_values() {
        let store = store();
        assert_eq!(store.get("Camera FPS (Hz)", Scenario::Typical), Ok(60.0));
        assert_eq!(store.get("Camera FPS (Hz)", Scenario::Best), Ok(120.0));
    }

    #[test]
    fn get_coerces_numeric_text() {
        assert_eq!(store().get("Encode latency (ms)", Scenario::Typical), Ok(12.5));
    }

    #[test]
    fn get_missing_name_is_not_found() {
        let err = store().get("Vsync avg wait (ms)", Scenario::Typical);
        assert_eq!(
            err,
            Err(LatencyError::ParameterNotFound {
                name: "Vsync avg wait (ms)".to_string()
            })
        );
    }

    #[test]
    fn get_absent_column_is_value_missing() {
        let err = store().get("Camera FPS (Hz)", Scenario::Selected);
        assert_eq!(
            err,
            Err(LatencyError::ParameterValueMissing {
                name: "Camera FPS (Hz)".to_string(),
                scenario: Scenario::Selected,
            })
        );
    }

    #[test]
    fn blank_text_and_nan_are_value_missing() {
        let store = store();
        assert!(matches!(
            store.get("Encode latency (ms)", Scenario::Best),
            Err(LatencyError::ParameterValueMissing { .. })
        ));
        assert!(matches!(
            store.get("Decode latency (ms)", Scenario::Typical),
            Err(LatencyError::ParameterValueMissing { .. })
        ));
    }

    #[test]
    fn non_numeric_text_is_invalid_value() {
        let err = store().get("Encode latency (ms)", Scenario::Worst);
        assert_eq!(
            err,
            Err(LatencyError::InvalidParameterValue {
                name: "Encode latency (ms)".to_string(),
                scenario: Scenario::Worst,
                raw: "slow".to_string(),
            })
        );
    }

    #[test]
    fn infinite_number_is_invalid_value() {
        assert!(matches!(
            store().get("Decode latency (ms)", Scenario::Worst),
            Err(LatencyError::InvalidParameterValue { .. })
        ));
    }

    #[test]
    fn cost_of_is_total() {
        let store = store();
        assert_eq!(store.cost_of("Camera FPS (Hz)"), CostCategory::Config);
        assert_eq!(store.cost_of("Encode latency (ms)"), CostCategory::Software);
        assert_eq!(store.cost_of("not in table"), CostCategory::Software);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = ParameterStore::from_parameters(vec![
            Parameter::new("Capture buffer (ms)"),
            Parameter::new("Capture buffer (ms)"),
        ]);
        assert_eq!(
            result,
            Err(LatencyError::DuplicateParameter {
                name: "Capture buffer (ms)".to_string()
            })
        );
    }

    #[test]
    fn scenario_view_reads_its_column() {
        let store = store();
        let view = ScenarioView::new(&store, Scenario::Best);
        assert_eq!(view.get("Camera FPS (Hz)"), Ok(120.0));
        assert_eq!(view.scenario(), Scenario::Best);
    }
}
