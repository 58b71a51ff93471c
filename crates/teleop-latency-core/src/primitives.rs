//! # Primitives
//!
//! The small closed vocabularies the engine is built on: which value column
//! to read ([`Scenario`]), which pipeline lane a stage belongs to ([`Lane`]),
//! and how a parameter is costed for display ([`CostCategory`]).

use crate::error::LatencyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// SCENARIO
// =============================================================================

/// Which optimism level of parameter values to resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Scenario {
    Best,
    #[default]
    Typical,
    Worst,
    /// Pre-computed values chosen in the source table. Often absent.
    Selected,
}

impl Scenario {
    /// Every scenario, in column order.
    pub const ALL: [Scenario; 4] = [
        Scenario::Best,
        Scenario::Typical,
        Scenario::Worst,
        Scenario::Selected,
    ];

    /// The scenarios the JSON export always produces.
    pub const EXPORTED: [Scenario; 3] = [Scenario::Best, Scenario::Typical, Scenario::Worst];

    /// Column header / display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Scenario::Best => "Best",
            Scenario::Typical => "Typical",
            Scenario::Worst => "Worst",
            Scenario::Selected => "Selected",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = LatencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LatencyError::UnknownScenario(trimmed.to_string()))
    }
}

// =============================================================================
// LANE
// =============================================================================

/// One segment of the end-to-end pipeline.
///
/// Declaration order is pipeline order; `Ord` follows it so a
/// `BTreeMap<Lane, _>` iterates Leader → Network → Follower → Video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lane {
    Leader,
    Network,
    Follower,
    Video,
}

impl Lane {
    /// Every lane, in pipeline order.
    pub const ALL: [Lane; 4] = [Lane::Leader, Lane::Network, Lane::Follower, Lane::Video];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Lane::Leader => "Leader",
            Lane::Network => "Network",
            Lane::Follower => "Follower",
            Lane::Video => "Video",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// COST CATEGORY
// =============================================================================

/// Display-only classification of a parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CostCategory {
    #[default]
    Software,
    Config,
    Hardware,
    Infra,
}

impl CostCategory {
    pub const ALL: [CostCategory; 4] = [
        CostCategory::Software,
        CostCategory::Config,
        CostCategory::Hardware,
        CostCategory::Infra,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CostCategory::Software => "Software",
            CostCategory::Config => "Config",
            CostCategory::Hardware => "Hardware",
            CostCategory::Infra => "Infra",
        }
    }

    /// Parse a table cell. Blank or unrecognized text yields `Software`.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        let trimmed = raw.trim();
        CostCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .unwrap_or_default()
    }
}

impl fmt::Display for CostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TESTS
// =============================================================================
