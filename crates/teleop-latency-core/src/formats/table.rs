//! Parameter-table ingest.
//!
//! The source of truth is a spreadsheet sheet with a few title rows, then a
//! header row:
//!
//! ```text
//! Parameter | Description | Best | Typical | Worst | Selected | Notes | Cost Type
//! ```
//!
//! Two encodings are accepted. CSV is the sheet exported as-is; the header
//! row is found by its first cell (`Parameter`) unless pinned with
//! [`TableOptions::header_row`], and columns are located by header name.
//! JSON is a [`TableDocument`], convenient for version-controlled snapshots.
//!
//! Value cells are kept raw. A blank cell is a missing value; a cell that
//! does not parse as a number only fails when a stage reads it.

use crate::error::{LatencyError, Result};
use crate::parameters::{Cell, Parameter, ParameterStore};
use crate::primitives::{CostCategory, Scenario};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

pub const HEADER_PARAMETER: &str = "Parameter";
pub const HEADER_DESCRIPTION: &str = "Description";
pub const HEADER_NOTES: &str = "Notes";
pub const HEADER_COST: &str = "Cost Type";

// =============================================================================
// FORMAT SELECTION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Json,
}

impl TableFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }
}

impl FromStr for TableFormat {
    type Err = LatencyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(TableFormat::Csv),
            "json" => Ok(TableFormat::Json),
            other => Err(LatencyError::UnknownTableFormat(other.to_string())),
        }
    }
}

/// Ingest options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableOptions {
    /// Zero-based index of the CSV header row. `None` scans for it.
    pub header_row: Option<usize>,
}

/// Parse table text into a [`ParameterStore`].
pub fn parse_table(text: &str, format: TableFormat, options: &TableOptions) -> Result<ParameterStore> {
    match format {
        TableFormat::Csv => parse_csv(text, options),
        TableFormat::Json => parse_json(text),
    }
}

// =============================================================================
// CSV
// =============================================================================

/// Column positions resolved from the header row.
struct Columns {
    name: usize,
    description: Option<usize>,
    values: Vec<(Scenario, usize)>,
    notes: Option<usize>,
    cost: Option<usize>,
}

impl Columns {
    fn locate(header: &csv::StringRecord) -> Result<Self> {
        let find = |title: &str| header.iter().position(|cell| cell.eq_ignore_ascii_case(title));

        let name = find(HEADER_PARAMETER)
            .ok_or_else(|| LatencyError::MissingColumn(HEADER_PARAMETER.to_string()))?;
        let values = Scenario::ALL
            .into_iter()
            .filter_map(|scenario| find(scenario.as_str()).map(|idx| (scenario, idx)))
            .collect();

        Ok(Self {
            name,
            description: find(HEADER_DESCRIPTION),
            values,
            notes: find(HEADER_NOTES),
            cost: find(HEADER_COST),
        })
    }

    fn parameter(&self, record: &csv::StringRecord) -> Option<Parameter> {
        let text = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or_default();

        let name = text(Some(self.name));
        if name.is_empty() {
            return None;
        }

        let mut parameter = Parameter::new(name)
            .with_description(text(self.description))
            .with_notes(text(self.notes));

        for &(scenario, idx) in &self.values {
            let raw = text(Some(idx));
            if !raw.is_empty() {
                parameter = parameter.with_cell(scenario, Cell::Text(raw.to_string()));
            }
        }

        let cost = text(self.cost);
        if !cost.is_empty() {
            parameter = parameter.with_cost(CostCategory::parse_lenient(cost));
        }

        Some(parameter)
    }
}

/// Parse the CSV export of the parameter sheet.
pub fn parse_csv(text: &str, options: &TableOptions) -> Result<ParameterStore> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

    let header_index = match options.header_row {
        Some(index) if index < records.len() => index,
        Some(_) => return Err(LatencyError::MissingHeader),
        None => records
            .iter()
            .position(|r| r.get(0).is_some_and(|c| c.eq_ignore_ascii_case(HEADER_PARAMETER)))
            .ok_or(LatencyError::MissingHeader)?,
    };

    let columns = Columns::locate(&records[header_index])?;
    let parameters = records[header_index + 1..]
        .iter()
        .filter_map(|record| columns.parameter(record));

    ParameterStore::from_parameters(parameters)
}

// =============================================================================
// JSON
// =============================================================================

/// JSON form of the parameter table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDocument {
    pub parameters: Vec<TableRow>,
}

/// One parameter row in JSON form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best: Option<Cell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical: Option<Cell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worst: Option<Cell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<Cell>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
}

impl TableRow {
    fn slots(&self) -> [(Scenario, &Option<Cell>); 4] {
        [
            (Scenario::Best, &self.best),
            (Scenario::Typical, &self.typical),
            (Scenario::Worst, &self.worst),
            (Scenario::Selected, &self.selected),
        ]
    }
}

impl From<TableRow> for Parameter {
    fn from(row: TableRow) -> Self {
        let mut parameter = Parameter::new(row.name.trim())
            .with_description(row.description.as_str())
            .with_notes(row.notes.as_str());
        for (scenario, cell) in row.slots() {
            if let Some(cell) = cell {
                parameter = parameter.with_cell(scenario, cell.clone());
            }
        }
        if let Some(cost) = row.cost.as_deref().filter(|c| !c.trim().is_empty()) {
            parameter = parameter.with_cost(CostCategory::parse_lenient(cost));
        }
        parameter
    }
}

impl From<&Parameter> for TableRow {
    fn from(parameter: &Parameter) -> Self {
        Self {
            name: parameter.name.clone(),
            description: parameter.description.clone(),
            best: parameter.cell(Scenario::Best).cloned(),
            typical: parameter.cell(Scenario::Typical).cloned(),
            worst: parameter.cell(Scenario::Worst).cloned(),
            selected: parameter.cell(Scenario::Selected).cloned(),
            notes: parameter.notes.clone(),
            cost: parameter.cost.map(|c| c.as_str().to_string()),
        }
    }
}

impl TableDocument {
    /// Snapshot a store in name order.
    #[must_use]
    pub fn from_store(store: &ParameterStore) -> Self {
        Self {
            parameters: store.parameters().map(TableRow::from).collect(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn into_store(self) -> Result<ParameterStore> {
        ParameterStore::from_parameters(
            self.parameters
                .into_iter()
                .filter(|row| !row.name.trim().is_empty())
                .map(Parameter::from),
        )
    }
}

/// Parse a JSON [`TableDocument`].
pub fn parse_json(text: &str) -> Result<ParameterStore> {
    let document: TableDocument = serde_json::from_str(text)?;
    document.into_store()
}

// =============================================================================
// TESTS
// =============================================================================
