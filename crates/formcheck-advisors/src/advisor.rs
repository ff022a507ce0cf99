//! Shared advisor error types.

/// Result type for advisor operations
pub type AdvisorResult<T> = Result<T, AdvisorError>;

/// Advisor error types
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("advisor backend not configured")]
    NotConfigured,

    #[error("analysis already in progress")]
    Busy,

    #[error("not enough buffered frames: need {required}, have {available}")]
    InsufficientFrames { required: usize, available: usize },

    #[error("nothing to synthesize")]
    EmptyPhrase,

    #[error("backend error: {0}")]
    Backend(String),

    #[error("timeout after {0}ms")]
    Timeout(u64),
}
