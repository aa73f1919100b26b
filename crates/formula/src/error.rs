use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Invalid formula '{formula}' at position {position}: {reason}")]
    SyntaxError {
        formula: String,
        position: usize,
        reason: String,
    },
}

impl FormulaError {
    pub(crate) fn syntax(formula: &str, position: usize, reason: impl Into<String>) -> Self {
        FormulaError::SyntaxError {
            formula: formula.to_string(),
            position,
            reason: reason.into(),
        }
    }
}
