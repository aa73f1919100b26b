use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown normalization mode '{0}' (expected 'none', 'lumi' or 'lumi_weight')")]
    UnknownNormalization(String),
}
