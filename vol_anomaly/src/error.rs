use thiserror::Error;

/// Failures raised by the pipeline stages
///
/// Every variant is data-conditioned: supplying more history or a corrected
/// configuration is always enough to recover.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Fewer observations than a stage requires
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Rolling window is longer than the available return history
    #[error("insufficient window: rolling window of {window} exceeds {available} available returns")]
    InsufficientWindow { window: usize, available: usize },

    /// Optimizer did not converge or the input was numerically degenerate
    #[error("model fit failure: {0}")]
    ModelFitFailure(String),

    /// Out-of-range configuration or malformed input
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
