use analytics::AnalyticsError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("No histogram recorded for observable: {0}")]
    UnknownObservable(String),

    #[error("Unknown cut index: {0}")]
    UnknownCut(usize),

    #[error("Cut {index} is not applied in region '{region}'")]
    CutNotInRegion { index: usize, region: String },
}
