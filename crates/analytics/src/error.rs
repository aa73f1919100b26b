use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error("Cut {index} is out of range for region '{region}' ({len} cuts)")]
    CutOutOfRange {
        region: String,
        index: usize,
        len: usize,
    },
}

/// The ratio a warning refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioKind {
    /// Fraction of the initial weight surviving (or rejected by) a cut.
    CutFraction,
    Efficiency,
    CumulativeEfficiency,
}

impl fmt::Display for RatioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            RatioKind::CutFraction => "cut fraction",
            RatioKind::Efficiency => "efficiency",
            RatioKind::CumulativeEfficiency => "cumulative efficiency",
        };
        f.write_str(word)
    }
}

/// A non-fatal condition met while aggregating. The affected value falls back
/// to 0 and the computation goes on.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationWarning {
    #[error("{ratio}: the denominator is zero, the value is set to 0")]
    ZeroDenominator { ratio: RatioKind },

    #[error("{ratio}: the denominator ({denominator}) is negative, the value is set to 0")]
    NegativeDenominator { ratio: RatioKind, denominator: f64 },

    #[error("{ratio} = {value} lies outside [0,1] because of negative event weights")]
    EfficiencyOutOfRange { ratio: RatioKind, value: f64 },

    #[error("event weight ratio is {ratio}: please generate more events (weight larger than 1)")]
    InsufficientStatistics { ratio: f64 },

    #[error("cut flow of dataset '{dataset}' in region '{region}' has {found} cuts, expected {expected}")]
    MismatchedCutFlow {
        dataset: String,
        region: String,
        expected: usize,
        found: usize,
    },
}
