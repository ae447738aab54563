//! Bus tuning knobs, embedded in the host's config file.

use serde::{Deserialize, Serialize};

/// Default capacity of a [`SignalQueue`](crate::SignalQueue).
/// Posting beyond this fails with `QueueFull` until the owner drains.
pub const QUEUE_CAPACITY: usize = 64;

/// Unknown keys are ignored, so older config files still load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Capacity of queues built by [`SignalQueue::from_config`](crate::SignalQueue::from_config).
    pub queue_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            queue_capacity: QUEUE_CAPACITY,
        }
    }
}
