//! # Cost Classifier
//!
//! Maps a [`CostCategory`] to the fill color used for a stage.

use crate::primitives::CostCategory;
use serde::{Serialize, Serializer};
use std::fmt;

/// A display color, as a `#RRGGBB` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Color(&'static str);

impl Color {
    pub const LIGHT_GREEN: Color = Color("#E2EFDA");
    pub const LIGHT_ORANGE: Color = Color("#F8CBAD");
    pub const LIGHT_RED: Color = Color("#F4CCCC");

    #[must_use]
    pub const fn hex(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

/// Fixed category → color table.
pub struct CostClassifier;

impl CostClassifier {
    /// Software and Config share light green; Hardware is light orange;
    /// Infra is light red.
    #[must_use]
    pub const fn color_of(category: CostCategory) -> Color {
        match category {
            CostCategory::Software | CostCategory::Config => Color::LIGHT_GREEN,
            CostCategory::Hardware => Color::LIGHT_ORANGE,
            CostCategory::Infra => Color::LIGHT_RED,
        }
    }
}
