//! Error types for trace-signals

use crate::menu::MAX_SUBMENU_DEPTH;

/// Error returned by a subscriber. Logged by the bus, never seen by the producer.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single handler invocation.
pub type HandlerResult = Result<(), HandlerError>;

/// Payload construction errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PayloadError {
    #[error("count must be non-negative, got {0}")]
    NegativeCount(i64),

    #[error("submenu '{id}' nests {depth} levels (max {max})", max = MAX_SUBMENU_DEPTH)]
    SubmenuTooDeep { id: String, depth: usize },

    #[error("{0} must not be empty")]
    EmptyId(&'static str),

    #[error("time range is inverted: start {start} > end {end}")]
    InvertedRange { start: i64, end: i64 },
}

/// Signal bus errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    #[error("channel '{channel}' carries {expected}, not {found}")]
    PayloadMismatch {
        channel: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("signal queue is full")]
    QueueFull,

    #[error("signal queue is closed")]
    QueueClosed,
}
