//! # Yieldbook Statistical Account
//!
//! This crate turns the raw counts measured by the external cut engine into
//! expected yields with uncertainties, and evaluates the configured figure of
//! merit on the signal and background totals.
//!
//! ## Architectural Principles
//!
//! - **Layer 2 Logic:** A pure calculation crate. It reads an `AnalysisSession`
//!   from `core-types` and an `AnalysisConfiguration` snapshot, and knows
//!   nothing about formatting or output.
//! - **Never Fatal on Numbers:** Ill-defined ratios (zero or negative
//!   denominators, negative-weight efficiencies outside [0,1], too few
//!   generated events) fall back to 0 and are recorded as `AggregationWarning`s.
//!
//! ## Public API
//!
//! - `StatisticalAccount`: Normalized yields, cut flows and figures of merit of a session.
//! - `DatasetYield`, `RegionFlow`, `CutFlowEntry`: The derived records.
//! - `aggregate_dataset`, `dataset_cross_section`, `scale_to_luminosity`: Building blocks.
//! - `AnalyticsError`, `AggregationWarning`: Lookup failures and non-fatal conditions.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod measure;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::StatisticalAccount;
pub use error::{AggregationWarning, AnalyticsError, RatioKind};
pub use measure::{aggregate_dataset, dataset_cross_section, scale_to_luminosity};
pub use report::{CutFlowEntry, DatasetYield, RegionFlow};
