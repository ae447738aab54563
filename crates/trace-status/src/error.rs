//! Error types for trace-status

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("Malformed status message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Signal error: {0}")]
    Signal(#[from] trace_signals::SignalError),
}
