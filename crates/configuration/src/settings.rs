use core_types::NormalizeType;
use serde::Deserialize;

/// The root configuration structure, as read from `yieldbook.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

/// The `[analysis]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSettings {
    /// Integrated luminosity in fb^-1.
    #[serde(default = "default_lumi")]
    pub lumi: f64,
    #[serde(default)]
    pub normalize: NormalizeType,
    /// Figure of merit over S, B, ES and EB.
    #[serde(default = "default_significance")]
    pub significance: String,
    /// Uncertainty on the figure of merit. When omitted, the catalog
    /// suggestion for `significance` is used.
    #[serde(default)]
    pub error: Option<String>,
}

fn default_lumi() -> f64 {
    10.0
}

fn default_significance() -> String {
    "S/B".to_string()
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            lumi: default_lumi(),
            normalize: NormalizeType::default(),
            significance: default_significance(),
            error: None,
        }
    }
}

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct AnalysisOverrides {
    /// Integrated luminosity in fb^-1.
    #[cfg_attr(feature = "clap", arg(long))]
    pub lumi: Option<f64>,

    /// Normalization mode: none, lumi or lumi_weight.
    #[cfg_attr(feature = "clap", arg(long))]
    pub normalize: Option<NormalizeType>,

    /// Significance formula, e.g. "S/sqrt(S+B)".
    #[cfg_attr(feature = "clap", arg(long))]
    pub significance: Option<String>,

    /// Error formula; replaces any catalog suggestion.
    #[cfg_attr(feature = "clap", arg(long))]
    pub error: Option<String>,
}
