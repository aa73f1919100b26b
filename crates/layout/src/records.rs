//! Flat, fully formatted records handed to table and report renderers.

use serde::Serialize;

/// Header information of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    /// `"signal"` or `"background"`.
    pub sample_type: String,
    pub generated_events: String,
    /// Cross section imposed by the user, in pb.
    pub imposed_xsection: Option<String>,
    /// Event weight imposed by the user, when different from 1.
    pub imposed_weight: Option<String>,
    /// Expected events at the configured luminosity, `"N +/- E"`.
    pub normalization: String,
    pub event_weight_ratio: String,
    pub insufficient_statistics: bool,
}

/// One line of a dataset's file table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldRow {
    pub path: String,
    pub nevents: String,
    /// Cross section in pb, with its relative error when measured.
    pub cross_section: String,
    /// Share of negative weights, in percent.
    pub negative_weights: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutFlowRow {
    pub label: String,
    /// Blank without signal datasets.
    pub signal: String,
    /// Blank without background datasets.
    pub background: String,
    /// Blank unless both signal and background exist.
    pub significance: String,
    /// Object-definition step: it changes objects, not event counts.
    pub object_definition: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyRow {
    pub dataset: String,
    pub kept: String,
    pub rejected: String,
    pub efficiency: String,
    pub cumulative_efficiency: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EfficiencyTable {
    pub rows: Vec<EfficiencyRow>,
    /// Aggregation warnings of the datasets, prefixed with the dataset name.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsRow {
    pub dataset: String,
    pub integral: String,
    pub entries_per_event: String,
    pub mean: String,
    pub rms: String,
    pub underflow_percent: String,
    pub overflow_percent: String,
    /// Grade of the summed underflow and overflow.
    pub out_of_range: OutOfRange,
}

/// How much of a histogram falls outside its range, graded on the summed
/// underflow and overflow percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRange {
    /// At most 5%.
    Low,
    /// Above 5%, at most 15%.
    Moderate,
    /// Above 15%: the binning should be revisited.
    High,
}

impl OutOfRange {
    pub fn from_percent(percent: f64) -> Self {
        if percent <= 5.0 {
            OutOfRange::Low
        } else if percent <= 15.0 {
            OutOfRange::Moderate
        } else {
            OutOfRange::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StatisticsTable {
    pub rows: Vec<StatisticsRow>,
    pub warnings: Vec<String>,
}

/// One block of the final report, in report order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum ReportSection {
    Dataset {
        summary: DatasetSummary,
        files: Vec<YieldRow>,
    },
    Histogram {
        observable: String,
        table: StatisticsTable,
    },
    /// One efficiency table per region the cut is applied in.
    Cut {
        index: usize,
        name: String,
        regions: Vec<(String, EfficiencyTable)>,
    },
    ObjectDefinition {
        description: String,
    },
    CutFlow {
        region: String,
        significance_formula: String,
        rows: Vec<CutFlowRow>,
    },
}
