use crate::error::AggregationWarning;
use core_types::{MeasuredSample, Measurement};
use serde::{Deserialize, Serialize};

/// Luminosity normalization of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetYield {
    pub name: String,
    pub background: bool,
    /// Measurement across all files of the dataset.
    pub global: MeasuredSample,
    /// Cross section in pb, already multiplied by the dataset weight unless
    /// imposed by the user.
    pub cross_section: Measurement,
    /// Expected number of events at the configured luminosity.
    pub normalized: Measurement,
    /// `normalized / generated * weight`. Above 1 the sample is too small.
    pub event_weight_ratio: f64,
    pub warnings: Vec<AggregationWarning>,
}

impl DatasetYield {
    pub fn has_insufficient_statistics(&self) -> bool {
        self.event_weight_ratio > 1.0
    }
}

/// Derived quantities of one cut, for one dataset or one aggregate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CutFlowEntry {
    pub selected: Measurement,
    pub rejected: Measurement,
    /// `selected / (selected + rejected)`.
    pub efficiency: Measurement,
    /// `selected / initial`.
    pub cumulative_efficiency: Measurement,
    /// Raw entries entering the cut.
    pub nentries: u64,
    pub warnings: Vec<AggregationWarning>,
}

/// Normalized cut flow of one region.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionFlow {
    pub region: String,
    pub initial: Measurement,
    /// Raw entries before any cut.
    pub initial_entries: u64,
    /// Parallel to the region's cut sequence.
    pub entries: Vec<CutFlowEntry>,
    /// Problems with the input counts themselves.
    pub warnings: Vec<AggregationWarning>,
}

impl RegionFlow {
    /// All warnings of the region, its own first.
    pub fn all_warnings(&self) -> impl Iterator<Item = &AggregationWarning> {
        self.warnings
            .iter()
            .chain(self.entries.iter().flat_map(|e| e.warnings.iter()))
    }
}
