use crate::error::ConfigError;
use crate::settings::{AnalysisOverrides, AnalysisSettings};
use core_types::NormalizeType;
use formula::{CompiledFormula, FormulaError, SignificanceCatalog};

/// Everything the statistical account needs to know about the user's choices.
///
/// Instances are immutable: every change produces a new configuration, so a
/// report always works on one consistent significance/error pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfiguration {
    lumi: f64,
    normalize: NormalizeType,
    significance: CompiledFormula,
    error: CompiledFormula,
}

impl AnalysisConfiguration {
    /// Builds a validated configuration. Without an explicit `error` formula
    /// the catalog suggestion for `significance` is used, falling back to the
    /// default `S/B` uncertainty.
    pub fn new(
        lumi: f64,
        normalize: NormalizeType,
        significance: &str,
        error: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default()
            .with_lumi(lumi)?
            .with_normalize(normalize)
            .with_significance_formula(significance)?;
        if let Some(error) = error {
            config = config.with_error_formula(error)?;
        }
        Ok(config)
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Result<Self, ConfigError> {
        Self::new(
            settings.lumi,
            settings.normalize,
            &settings.significance,
            settings.error.as_deref(),
        )
    }

    /// Applies command-line overrides; an explicit error formula wins over the
    /// catalog suggestion of an overridden significance formula.
    pub fn apply_overrides(&self, overrides: &AnalysisOverrides) -> Result<Self, ConfigError> {
        let mut config = self.clone();
        if let Some(lumi) = overrides.lumi {
            config = config.with_lumi(lumi)?;
        }
        if let Some(normalize) = overrides.normalize {
            config = config.with_normalize(normalize);
        }
        if let Some(significance) = &overrides.significance {
            config = config.with_significance_formula(significance)?;
        }
        if let Some(error) = &overrides.error {
            config = config.with_error_formula(error)?;
        }
        Ok(config)
    }

    /// Integrated luminosity in fb^-1.
    pub fn lumi(&self) -> f64 {
        self.lumi
    }

    pub fn normalize(&self) -> NormalizeType {
        self.normalize
    }

    pub fn significance_formula(&self) -> &CompiledFormula {
        &self.significance
    }

    pub fn error_formula(&self) -> &CompiledFormula {
        &self.error
    }

    pub fn with_lumi(&self, lumi: f64) -> Result<Self, ConfigError> {
        if !lumi.is_finite() || lumi <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "'lumi' must be a positive number, got {lumi}"
            )));
        }
        Ok(Self {
            lumi,
            ..self.clone()
        })
    }

    pub fn with_normalize(&self, normalize: NormalizeType) -> Self {
        Self {
            normalize,
            ..self.clone()
        }
    }

    /// Replaces the significance formula and, when the catalog knows its shape,
    /// the error formula with it. Otherwise the current error formula is kept.
    pub fn with_significance_formula(&self, text: &str) -> Result<Self, FormulaError> {
        let significance = CompiledFormula::compile(strip_quotes(text))?;

        let error = match SignificanceCatalog::standard().suggest_error_formula(&significance) {
            Some(suggestion) => {
                tracing::info!(
                    error_formula = %suggestion.error_formula,
                    "Formula corresponding to the uncertainty calculation has been found."
                );
                CompiledFormula::compile(&suggestion.error_formula)?
            }
            None => {
                tracing::info!(
                    formula = %significance,
                    error_formula = %self.error,
                    "No catalog uncertainty for this formula, keeping the current error formula."
                );
                self.error.clone()
            }
        };

        Ok(Self {
            significance,
            error,
            ..self.clone()
        })
    }

    pub fn with_error_formula(&self, text: &str) -> Result<Self, FormulaError> {
        let error = CompiledFormula::compile(strip_quotes(text))?;
        Ok(Self {
            error,
            ..self.clone()
        })
    }
}

impl Default for AnalysisConfiguration {
    fn default() -> Self {
        let catalog = SignificanceCatalog::standard();
        let error = catalog
            .error_formula_for("S/B")
            .expect("the catalog always carries S/B");
        Self {
            lumi: 10.0,
            normalize: NormalizeType::LumiWeight,
            significance: CompiledFormula::compile("S/B").expect("S/B is a valid formula"),
            error: CompiledFormula::compile(error).expect("catalog formulas are valid"),
        }
    }
}

/// Formulas typed at a prompt often arrive quoted; one matching pair of
/// surrounding quotes is removed.
fn strip_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}
