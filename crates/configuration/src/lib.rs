use std::path::Path;

// Declare the modules that make up this crate.
pub mod analysis;
pub mod error;
pub mod settings;
pub mod store;

// Re-export the core types to provide a clean public API.
pub use analysis::AnalysisConfiguration;
pub use error::ConfigError;
pub use settings::{AnalysisOverrides, AnalysisSettings, Settings};
pub use store::ConfigurationStore;

/// Loads the analysis configuration from a TOML file.
///
/// Values can be overridden from the environment with the `YIELDBOOK`
/// prefix, e.g. `YIELDBOOK__ANALYSIS__LUMI=300`. The raw settings are then
/// validated into an `AnalysisConfiguration`.
pub fn load_config(path: impl AsRef<Path>) -> Result<AnalysisConfiguration, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path.as_ref()).required(false))
        .add_source(
            config::Environment::with_prefix("YIELDBOOK")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;

    AnalysisConfiguration::from_settings(&settings.analysis)
}
