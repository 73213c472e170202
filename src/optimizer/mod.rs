//! Candidate search: panel-count sweep, KPI normalization, weighted
//! scoring, and the selection of two distinct installation sizes.

pub mod score;
pub mod search;

use serde::{Deserialize, Serialize};

pub use search::{Candidate, SearchError, SearchOutcome, outranks, search};

/// Battery variant of a candidate or scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// No storage installed.
    WithoutBattery,
    /// At least one battery unit installed.
    WithBattery,
}

impl Variant {
    /// Wire-format name of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::WithoutBattery => "without_battery",
            Variant::WithBattery => "with_battery",
        }
    }
}
