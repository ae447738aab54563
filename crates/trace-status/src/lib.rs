//! trace-status - status messages shared between trace viewer components
//!
//! Producers add and remove keyed messages; presentation layers watch the
//! registry (change feed or bus channels) and render what is active.

pub mod error;
pub mod registry;
pub mod signals;
pub mod types;

pub use error::StatusError;
pub use registry::{EVENT_CAPACITY, StatusEvent, StatusLink, StatusRegistry};
pub use signals::{ClearStatusMessage, PostStatusMessage, StatusMessageAdded, StatusMessageRemoved};
pub use types::{Severity, StatusCategory, StatusEntry, StatusMessage};
