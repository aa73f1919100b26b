use crate::enums::CutKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// The region every cut belongs to when no region tagging is used.
pub const DEFAULT_REGION: &str = "myregion";

/// A value with its (symmetric, non-negative) uncertainty.
///
/// A zero error means the value is exact, not that the error is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurement {
    pub mean: f64,
    pub error: f64,
}

impl Measurement {
    /// Creates a measurement; the sign of `error` is dropped.
    pub fn new(mean: f64, error: f64) -> Self {
        Self {
            mean,
            error: error.abs(),
        }
    }

    pub fn exact(mean: f64) -> Self {
        Self { mean, error: 0.0 }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Sum of two independent measurements: means add, errors add in quadrature.
    pub fn add_uncorrelated(&self, other: &Measurement) -> Measurement {
        Measurement {
            mean: self.mean + other.mean,
            error: self.error.hypot(other.error),
        }
    }
}

/// What the event reader measured for one sample file (or for the whole dataset).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasuredSample {
    pub nevents: u64,
    /// Cross section in pb.
    pub xsection: f64,
    pub xerror: f64,
    pub sumw_positive: f64,
    /// Magnitude of the summed negative event weights.
    pub sumw_negative: f64,
}

impl MeasuredSample {
    /// Percentage of the total absolute weight carried by negative-weight events.
    /// `None` when there is no weight at all.
    pub fn negative_weight_percent(&self) -> Option<f64> {
        let total = self.sumw_positive + self.sumw_negative;
        if total == 0.0 {
            None
        } else {
            Some(100.0 * self.sumw_negative / total)
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

/// A named dataset made of one or more event files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSample {
    pub name: String,
    #[serde(default)]
    pub filenames: Vec<PathBuf>,
    /// Cross section imposed by the user in pb. Zero means "use the measured one".
    #[serde(default)]
    pub xsection: f64,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub background: bool,
    /// One entry per file, parallel to `filenames`.
    #[serde(default)]
    pub measured_detail: Vec<MeasuredSample>,
    /// Measurement across all files, when the reader already combined them.
    #[serde(default)]
    pub measured_global: Option<MeasuredSample>,
}

impl DatasetSample {
    pub fn new(name: impl Into<String>, background: bool) -> Self {
        Self {
            name: name.into(),
            filenames: Vec::new(),
            xsection: 0.0,
            weight: 1.0,
            background,
            measured_detail: Vec::new(),
            measured_global: None,
        }
    }

    pub fn has_xsection_override(&self) -> bool {
        self.xsection != 0.0
    }
}

/// A selection or rejection criterion as declared by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutRecord {
    pub name: String,
    pub kind: CutKind,
    /// Region tags. Empty means the implicit default region.
    #[serde(default)]
    pub regions: BTreeSet<String>,
}

impl CutRecord {
    pub fn new(name: impl Into<String>, kind: CutKind) -> Self {
        Self {
            name: name.into(),
            kind,
            regions: BTreeSet::new(),
        }
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn belongs_to(&self, region: &str) -> bool {
        if self.regions.is_empty() {
            region == DEFAULT_REGION
        } else {
            self.regions.contains(region)
        }
    }
}

/// Weighted event count as accumulated by the cut engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightedCount {
    /// Number of (unweighted) entries.
    pub nentries: u64,
    pub sumw_positive: f64,
    /// Magnitude of the summed negative weights.
    pub sumw_negative: f64,
}

impl WeightedCount {
    pub fn new(nentries: u64, sumw_positive: f64, sumw_negative: f64) -> Self {
        Self {
            nentries,
            sumw_positive,
            sumw_negative,
        }
    }

    /// Unit-weight events.
    pub fn unweighted(nentries: u64) -> Self {
        Self::new(nentries, nentries as f64, 0.0)
    }

    /// Net weight: positive minus negative contributions.
    pub fn net(&self) -> f64 {
        self.sumw_positive - self.sumw_negative
    }

    pub fn has_negative_weights(&self) -> bool {
        self.sumw_negative > 0.0
    }
}

/// Events kept and rejected by one cut.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CutCounts {
    pub selected: WeightedCount,
    pub rejected: WeightedCount,
}

/// Raw cut flow of one dataset in one region.
///
/// `cuts` is parallel to the region's cut sequence, i.e. to
/// [`AnalysisSession::cuts_in_region`](crate::AnalysisSession::cuts_in_region).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionCounts {
    pub region: String,
    pub initial: WeightedCount,
    #[serde(default)]
    pub cuts: Vec<CutCounts>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatasetCutFlow {
    #[serde(default)]
    pub regions: Vec<RegionCounts>,
}

impl DatasetCutFlow {
    pub fn region(&self, name: &str) -> Option<&RegionCounts> {
        self.regions.iter().find(|r| r.region == name)
    }
}

/// Summary statistics of one histogram for one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotSummary {
    pub integral: f64,
    pub nentries: u64,
    pub nevents: u64,
    pub underflow: f64,
    pub overflow: f64,
    pub mean: f64,
    pub rms: f64,
}

/// A histogrammed observable with one summary per dataset (parallel to the
/// session's datasets).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotRecord {
    pub observable: String,
    #[serde(default)]
    pub summaries: Vec<PlotSummary>,
    #[serde(default)]
    pub warnings: Vec<String>,
}
