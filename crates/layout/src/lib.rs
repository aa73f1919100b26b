//! # Yieldbook Layout
//!
//! This crate renders the statistical account of a session as formatted
//! records: dataset summaries, per-file yields, cut-flow, efficiency and
//! histogram statistics tables.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Presentation:** Reads a `StatisticalAccount` and produces
//!   strings. It performs no statistics of its own and owns no output device;
//!   the binary decides how records are printed.
//! - **Stable Number Rendering:** All numbers go through the `format` module,
//!   so every table shares the same significant-digit rules.
//!
//! ## Public API
//!
//! - `ResultPresenter`: Builds the records of a report.
//! - `round_to_ndigits`, `format_value_with_error`, `format_percentage_error`,
//!   `display_integer`: The number formatter.
//! - `ReportSection` and the row types: Serializable report records.
//! - `LayoutError`: Lookup failures while building a report.

// Declare the modules that constitute this crate.
pub mod error;
pub mod format;
pub mod presenter;
pub mod records;

// Re-export the key components to create a clean, public-facing API.
pub use error::LayoutError;
pub use format::{display_integer, format_percentage_error, format_value_with_error, round_to_ndigits};
pub use presenter::ResultPresenter;
pub use records::{
    CutFlowRow, DatasetSummary, EfficiencyRow, EfficiencyTable, OutOfRange, ReportSection,
    StatisticsRow, StatisticsTable, YieldRow,
};
