//! Small shared enums used by both the configuration schema and the graph crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Time bucket size used when resampling a date-indexed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// One bucket per calendar day (no-op on daily data).
    Daily,
    /// Calendar weeks ending on Sunday, labelled by that Sunday.
    Weekly,
    /// Calendar months, labelled by the last day of the month.
    Monthly,
}

impl Frequency {
    /// Returns the string representation of the frequency.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation applied to the values falling in one resample bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Sum,
    Mean,
}

impl Aggregation {
    /// Applies the aggregation to the present values; `None` when there are none.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        match self {
            Self::Sum => Some(sum),
            Self::Mean => Some(sum / values.len() as f64),
        }
    }
}

/// How the value axis of a chart is labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisFormat {
    /// Counts with compact `K`/`M` suffixes.
    #[default]
    Count,
    /// Percentages with a `%` suffix.
    Percent,
}

/// Drawing style of one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    #[default]
    Line,
    Bar,
}
