//! # Yieldbook Core Types
//!
//! Layer 0 of the workspace: the plain data handed over by the external
//! cut-execution and histogramming engine, plus the value types every other
//! crate computes with. Nothing in here performs normalization or formatting.

pub mod enums;
pub mod error;
pub mod session;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{CutKind, NormalizeType, SelectionItem};
pub use error::CoreError;
pub use session::AnalysisSession;
pub use structs::{
    CutCounts, CutRecord, DatasetCutFlow, DatasetSample, MeasuredSample, Measurement,
    PlotRecord, PlotSummary, RegionCounts, WeightedCount, DEFAULT_REGION,
};
