use crate::analysis::AnalysisConfiguration;
use crate::error::ConfigError;
use core_types::NormalizeType;
use formula::FormulaError;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared holder of the active configuration.
///
/// Readers take a snapshot and keep working on it even if the configuration
/// is replaced meanwhile. A failed update leaves the current value untouched.
#[derive(Debug, Default)]
pub struct ConfigurationStore {
    current: RwLock<Arc<AnalysisConfiguration>>,
}

impl ConfigurationStore {
    pub fn new(config: AnalysisConfiguration) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    pub fn snapshot(&self) -> Arc<AnalysisConfiguration> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn replace(&self, config: AnalysisConfiguration) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(config);
    }

    pub fn set_significance_formula(&self, text: &str) -> Result<(), FormulaError> {
        self.update(|config| config.with_significance_formula(text))
    }

    pub fn set_error_formula(&self, text: &str) -> Result<(), FormulaError> {
        self.update(|config| config.with_error_formula(text))
    }

    pub fn set_lumi(&self, lumi: f64) -> Result<(), ConfigError> {
        self.update(|config| config.with_lumi(lumi))
    }

    pub fn set_normalize(&self, normalize: NormalizeType) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(guard.with_normalize(normalize));
    }

    fn update<E>(
        &self,
        change: impl FnOnce(&AnalysisConfiguration) -> Result<AnalysisConfiguration, E>,
    ) -> Result<(), E> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = change(&guard)?;
        *guard = Arc::new(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn snapshots_survive_replacement() {
        let store = ConfigurationStore::default();
        let before = store.snapshot();
        store.set_significance_formula("S/(S+B)").unwrap();
        let after = store.snapshot();

        assert_eq!(before.significance_formula().source(), "S/B");
        assert_eq!(after.significance_formula().source(), "S/(S+B)");
        assert_eq!(
            after.error_formula().source(),
            "1./(S+B)**2*sqrt(B**2*ES**2+S**2*EB**2)"
        );
    }

    #[test]
    fn invalid_formula_keeps_previous_configuration() {
        let store = ConfigurationStore::default();
        let before = store.snapshot();
        assert!(store.set_significance_formula("S/X").is_err());
        assert!(store.set_error_formula("sqrt(").is_err());
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn lumi_and_normalization_updates() {
        let store = ConfigurationStore::default();
        store.set_lumi(139.0).unwrap();
        store.set_normalize(NormalizeType::Lumi);
        assert!(store.set_lumi(-5.0).is_err());

        let config = store.snapshot();
        assert_eq!(config.lumi(), 139.0);
        assert_eq!(config.normalize(), NormalizeType::Lumi);
    }

    #[test]
    fn replace_swaps_the_whole_configuration() {
        let store = ConfigurationStore::default();
        let config = AnalysisConfiguration::new(1.0, NormalizeType::None, "B/S", None).unwrap();
        store.replace(config.clone());
        assert_eq!(*store.snapshot(), config);
    }
}
