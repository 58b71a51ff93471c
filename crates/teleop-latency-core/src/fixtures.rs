//! Reference parameter table used by unit tests, property tests, and the
//! app's integration tests (enabled there through the `fixtures` feature).
//!
//! Typical-column results, by hand:
//!
//! ```text
//! Leader    1.0 + 10.0 + 0.5 + 0.256 + 1.0 + 0.25                 = 13.006
//! Network   100 * 1.5 / 200 + 5                                   =  5.75
//! Follower  0.512 + 1.0 + 10.0 + 0.5 + 2.0 + 3.0 + 4.0 + 20.0     = 41.012
//! Video     8 + 8.3333.. + 2 + 5 + 10 + 1 + 2 + 15.75
//!           + 40 + 5 + 8 + 8.333                                  = 113.41633..
//! Overall                                                         = 173.18433..
//! ```
//!
//! The `Selected` column is left blank everywhere.

#![allow(clippy::expect_used)]

use crate::formats::table::{HEADER_COST, HEADER_DESCRIPTION, HEADER_NOTES, HEADER_PARAMETER};
use crate::parameters::{Cell, Parameter, ParameterStore};
use crate::primitives::{CostCategory, Scenario};

use CostCategory::{Config, Hardware, Infra, Software};

/// (name, description, best, typical, worst, cost)
type Row = (&'static str, &'static str, f64, f64, f64, Option<CostCategory>);

const ROWS: &[Row] = &[
    // Leader arm
    ("Leader sensor sampling (ms)", "Encoder read period share", 0.5, 1.0, 2.0, Some(Hardware)),
    ("Control loop rate (Hz)", "Host control loop frequency", 100.0, 50.0, 30.0, Some(Software)),
    ("OS scheduling jitter (ms)", "", 0.1, 0.5, 2.0, Some(Software)),
    ("Leader USB payload size (bytes)", "", 32.0, 32.0, 64.0, Some(Config)),
    ("Leader USB serial baud rate (bps)", "", 1_000_000.0, 1_000_000.0, 1_000_000.0, Some(Hardware)),
    ("Leader USB overhead (ms)", "USB frame scheduling", 0.5, 1.0, 2.0, Some(Hardware)),
    ("Command packetization (ms)", "", 0.1, 0.25, 0.5, Some(Software)),
    // Network
    ("Straight-line distance (km)", "Operator to robot", 100.0, 100.0, 100.0, Some(Infra)),
    ("Distance routing factor", "Fiber path vs great circle", 1.2, 1.5, 2.0, Some(Infra)),
    ("Fiber speed (km/ms)", "", 200.0, 200.0, 200.0, Some(Infra)),
    ("Command network extra (ms)", "Switching and queuing", 2.0, 5.0, 20.0, Some(Hardware)),
    // Follower arm
    ("Follower USB payload size (bytes)", "", 64.0, 64.0, 128.0, Some(Config)),
    ("Follower USB serial baud rate (bps)", "", 1_000_000.0, 1_000_000.0, 1_000_000.0, Some(Hardware)),
    ("Follower USB overhead (ms)", "", 0.5, 1.0, 2.0, Some(Hardware)),
    ("Motor driver processing (ms)", "", 1.0, 2.0, 4.0, Some(Hardware)),
    ("Servo command deadband (ms)", "", 1.0, 3.0, 6.0, Some(Config)),
    ("Mechanical backlash/slop (ms)", "", 2.0, 4.0, 8.0, Some(Hardware)),
    ("Motor accel to visible motion (ms)", "", 10.0, 20.0, 40.0, Some(Hardware)),
    // Video
    ("Exposure/rolling-shutter share (ms)", "", 4.0, 8.0, 16.0, Some(Hardware)),
    ("Camera FPS (Hz)", "Sensor frame rate", 120.0, 60.0, 30.0, Some(Config)),
    ("Sensor → memory/ISP (ms)", "", 1.0, 2.0, 4.0, Some(Hardware)),
    ("Capture buffer (ms)", "", 2.0, 5.0, 10.0, Some(Software)),
    ("Encode latency (ms)", "Hardware encoder", 5.0, 10.0, 20.0, Some(Hardware)),
    ("Packetization (ms)", "", 0.5, 1.0, 2.0, Some(Software)),
    ("FEC/RED overhead (ms)", "", 1.0, 2.0, 5.0, Some(Config)),
    ("Extra network overhead (ms)", "WebRTC stack", 5.0, 10.0, 30.0, None),
    ("TURN/SFU extra hops (ms)", "", 0.0, 5.0, 20.0, None),
    ("Jitter buffer target (ms)", "", 20.0, 40.0, 80.0, Some(Config)),
    ("Decode latency (ms)", "", 2.0, 5.0, 10.0, Some(Hardware)),
    ("Renderer/compositor (ms)", "", 4.0, 8.0, 16.0, Some(Software)),
    ("Vsync avg wait (ms)", "Half a 60 Hz refresh", 4.167, 8.333, 8.333, Some(Hardware)),
];

fn parameter(row: &Row, cell: impl Fn(f64) -> Cell) -> Parameter {
    let &(name, description, best, typical, worst, cost) = row;
    let parameter = Parameter::new(name)
        .with_description(description)
        .with_cell(Scenario::Best, cell(best))
        .with_cell(Scenario::Typical, cell(typical))
        .with_cell(Scenario::Worst, cell(worst));
    match cost {
        Some(cost) => parameter.with_cost(cost),
        None => parameter,
    }
}

/// The reference rows, with numeric cells.
#[must_use]
pub fn reference_parameters() -> Vec<Parameter> {
    ROWS.iter().map(|row| parameter(row, Cell::Number)).collect()
}

#[must_use]
pub fn reference_store() -> ParameterStore {
    ParameterStore::from_parameters(reference_parameters()).expect("reference names are unique")
}

/// The reference store with one row removed.
#[must_use]
pub fn reference_store_without(name: &str) -> ParameterStore {
    ParameterStore::from_parameters(reference_parameters().into_iter().filter(|p| p.name != name))
        .expect("reference names are unique")
}

/// The reference store as CSV ingest sees it: every value cell is text.
#[must_use]
pub fn reference_store_as_text() -> ParameterStore {
    ParameterStore::from_parameters(
        ROWS.iter()
            .map(|row| parameter(row, |v| Cell::Text(v.to_string()))),
    )
    .expect("reference names are unique")
}

/// The reference table as a spreadsheet CSV export, title rows included.
#[must_use]
pub fn reference_csv() -> String {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());

    for title in [
        vec!["Teleop Latency Budget"],
        vec!["Command → photon, one way"],
        vec![""],
        vec!["Edit the Typical column; Selected is for what-if runs"],
        vec![""],
    ] {
        writer.write_record(&title).expect("in-memory write");
    }

    writer
        .write_record([
            HEADER_PARAMETER,
            HEADER_DESCRIPTION,
            "Best",
            "Typical",
            "Worst",
            "Selected",
            HEADER_NOTES,
            HEADER_COST,
        ])
        .expect("in-memory write");

    for &(name, description, best, typical, worst, cost) in ROWS {
        let cost = cost.map(CostCategory::as_str).unwrap_or_default();
        let [best, typical, worst] = [best, typical, worst].map(|v| v.to_string());
        writer
            .write_record([
                name,
                description,
                best.as_str(),
                typical.as_str(),
                worst.as_str(),
                "",
                "",
                cost,
            ])
            .expect("in-memory write");
    }

    let bytes = writer.into_inner().expect("in-memory flush");
    String::from_utf8(bytes).expect("utf-8 input")
}
