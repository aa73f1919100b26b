use crate::engine::{CompiledFormula, swap_signal_background};
use crate::error::FormulaError;
use std::sync::OnceLock;

/// A significance shape together with its propagated uncertainty, assuming
/// independent `S` and `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub significance: &'static str,
    pub error: &'static str,
}

pub const STANDARD_ENTRIES: [CatalogEntry; 3] = [
    CatalogEntry {
        significance: "S/B",
        error: "1./(B**2)*sqrt(B**2*ES**2+S**2*EB**2)",
    },
    CatalogEntry {
        significance: "S/(S+B)",
        error: "1./(S+B)**2*sqrt(B**2*ES**2+S**2*EB**2)",
    },
    CatalogEntry {
        significance: "S/sqrt(S+B)",
        error: "1/pow(S+B,3./2.)*sqrt((S+2*B)**2*ES**2+S**2*EB**2)",
    },
];

/// The outcome of a successful catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSuggestion {
    /// The catalog shape that matched, as written in the catalog.
    pub shape: &'static str,
    /// The error formula to use, already swapped when `swapped` is set.
    pub error_formula: String,
    /// True when the user formula matched the shape with `S` and `B` exchanged.
    pub swapped: bool,
}

#[derive(Debug, Clone)]
struct IndexedEntry {
    entry: CatalogEntry,
    direct: String,
    swapped: String,
}

#[derive(Debug, Clone)]
pub struct SignificanceCatalog {
    entries: Vec<IndexedEntry>,
}

impl SignificanceCatalog {
    /// Builds a catalog, normalizing every shape once up front.
    pub fn new(entries: &[CatalogEntry]) -> Result<Self, FormulaError> {
        let entries = entries
            .iter()
            .map(|entry| {
                let shape = CompiledFormula::compile(entry.significance)?;
                // The error formula must compile too, even if it is only ever
                // handed back as text.
                CompiledFormula::compile(entry.error)?;
                Ok(IndexedEntry {
                    entry: *entry,
                    direct: shape.canonical_form(),
                    swapped: shape.swapped().canonical_form(),
                })
            })
            .collect::<Result<Vec<_>, FormulaError>>()?;
        Ok(Self { entries })
    }

    /// The built-in catalog.
    pub fn standard() -> &'static SignificanceCatalog {
        static STANDARD: OnceLock<SignificanceCatalog> = OnceLock::new();
        STANDARD.get_or_init(|| {
            SignificanceCatalog::new(&STANDARD_ENTRIES)
                .expect("built-in catalog formulas are valid")
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().map(|e| &e.entry)
    }

    /// Every shape the catalog recognizes, in both orientations.
    pub fn known_significance_formulas(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|e| {
                let swapped = swap_signal_background(e.entry.significance)
                    .unwrap_or_else(|_| e.entry.significance.to_string());
                [e.entry.significance.to_string(), swapped]
            })
            .collect()
    }

    /// The catalog error formula for a shape written exactly as in the catalog.
    pub fn error_formula_for(&self, shape: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|e| e.entry.significance == shape)
            .map(|e| e.entry.error)
    }

    /// Finds the uncertainty formula matching a user significance formula.
    ///
    /// Direct matches are tried first over the whole catalog, then matches
    /// against the catalog shapes with `S` and `B` exchanged; the latter return
    /// the error formula with `S`/`B` and `ES`/`EB` exchanged as well.
    pub fn suggest_error_formula(&self, formula: &CompiledFormula) -> Option<ErrorSuggestion> {
        let key = formula.canonical_form();

        if let Some(hit) = self.entries.iter().find(|e| e.direct == key) {
            tracing::debug!(formula = %formula, shape = hit.entry.significance, "Catalog match.");
            return Some(ErrorSuggestion {
                shape: hit.entry.significance,
                error_formula: hit.entry.error.to_string(),
                swapped: false,
            });
        }

        for hit in self.entries.iter().filter(|e| e.swapped == key) {
            match swap_signal_background(hit.entry.error) {
                Ok(error_formula) => {
                    tracing::debug!(
                        formula = %formula,
                        shape = hit.entry.significance,
                        "Catalog match with signal and background exchanged."
                    );
                    return Some(ErrorSuggestion {
                        shape: hit.entry.significance,
                        error_formula,
                        swapped: true,
                    });
                }
                Err(e) => tracing::warn!(error = %e, "Skipping catalog entry that cannot be swapped."),
            }
        }

        tracing::debug!(formula = %formula, "No catalog match.");
        None
    }
}

impl Default for SignificanceCatalog {
    fn default() -> Self {
        SignificanceCatalog::standard().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggest(src: &str) -> Option<ErrorSuggestion> {
        let formula = CompiledFormula::compile(src).unwrap();
        SignificanceCatalog::standard().suggest_error_formula(&formula)
    }

    #[test_log::test]
    fn direct_match_returns_the_catalog_formula_unmodified() {
        let hit = suggest("S/B").unwrap();
        assert_eq!(hit.error_formula, "1./(B**2)*sqrt(B**2*ES**2+S**2*EB**2)");
        assert!(!hit.swapped);
    }

    #[test_log::test]
    fn swapped_match_swaps_the_error_formula() {
        let hit = suggest("B/S").unwrap();
        assert_eq!(hit.shape, "S/B");
        assert!(hit.swapped);
        assert_eq!(hit.error_formula, "1./(S**2)*sqrt(S**2*EB**2+B**2*ES**2)");
    }

    #[test_log::test]
    fn equivalent_spellings_match() {
        assert_eq!(suggest("(1*S)/B").unwrap().shape, "S/B");
        assert_eq!(suggest("S/(B+S)").unwrap().shape, "S/(S+B)");
        assert_eq!(suggest("S*pow(B+S,-0.5)").unwrap().shape, "S/sqrt(S+B)");
        assert_eq!(suggest("S*sqrt(1/(S+B))").unwrap().shape, "S/sqrt(S+B)");
        assert!(!suggest("S*sqrt(1/(S+B))").unwrap().swapped);

        let swapped = suggest("B/sqrt(B+S)").unwrap();
        assert!(swapped.swapped);
        assert_eq!(
            swapped.error_formula,
            "1/pow(B+S,3./2.)*sqrt((B+2*S)**2*EB**2+B**2*ES**2)"
        );
    }

    #[test_log::test]
    fn unrelated_shapes_do_not_match() {
        for src in ["S", "S*B", "S/B**2", "S/sqrt(B)", "sqrt(S/B)", "S-B"] {
            assert!(suggest(src).is_none(), "{src} should not match");
        }
    }

    #[test]
    fn known_formulas_list_both_orientations() {
        let known = SignificanceCatalog::standard().known_significance_formulas();
        assert_eq!(
            known,
            vec!["S/B", "B/S", "S/(S+B)", "B/(B+S)", "S/sqrt(S+B)", "B/sqrt(B+S)"]
        );
    }

    #[test]
    fn invalid_custom_entries_are_rejected() {
        let bad = [CatalogEntry {
            significance: "S/X",
            error: "0",
        }];
        assert!(SignificanceCatalog::new(&bad).is_err());
    }
}
