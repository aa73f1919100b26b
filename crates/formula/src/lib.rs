//! # Yieldbook Formula Engine
//!
//! Compiles, evaluates and compares the user-configurable figure-of-merit
//! formulas written over the four yield variables `S`, `B`, `ES` and `EB`.
//!
//! ## Public API
//!
//! - `CompiledFormula` / `compile`: validated formulas with their source text.
//! - `evaluate` and `Variables`: numeric evaluation, never panics (undefined
//!   results are NaN).
//! - `canonical_form`: an algebraically normalized rendering used to decide
//!   whether two formulas describe the same shape.
//! - `SignificanceCatalog`: the built-in table of significance shapes and their
//!   propagated-uncertainty formulas.

pub mod ast;
pub mod canonical;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{Expr, Function, Symbol};
pub use catalog::{CatalogEntry, ErrorSuggestion, SignificanceCatalog};
pub use engine::{CompiledFormula, canonical_form, compile, evaluate, swap_signal_background};
pub use error::FormulaError;
pub use eval::Variables;
