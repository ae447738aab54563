//! Signal plumbing shared by every panel and service.
//!
//! Design principles:
//! - One `SignalBus`, constructed here and handed to each component
//! - Background threads post through the queue, never fire directly
//! - Single polling tick on the main thread drains the queue
//! - The status registry listens for status requests on the same bus

use std::sync::Arc;
use trace_signals::{BusConfig, SignalBus, SignalQueue, SignalSender};
use trace_status::{StatusError, StatusLink, StatusRegistry};

pub struct ShellBus {
    bus: SignalBus,
    queue: SignalQueue,
    status: Arc<StatusRegistry>,
    _status_link: StatusLink,
}

impl ShellBus {
    pub fn new(config: &BusConfig) -> Result<Self, StatusError> {
        let bus = SignalBus::with_config(config.clone());
        let status = Arc::new(StatusRegistry::with_bus(bus.clone()));
        let status_link = status.listen(&bus)?;

        Ok(Self {
            bus,
            queue: SignalQueue::from_config(config),
            status,
            _status_link: status_link,
        })
    }

    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    pub fn status(&self) -> &Arc<StatusRegistry> {
        &self.status
    }

    /// Posting handle for a background service.
    pub fn sender(&self) -> SignalSender {
        self.queue.sender()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Fire everything posted since the last tick. Call from the main thread.
    #[inline]
    pub fn tick(&self) -> usize {
        self.queue.drain(&self.bus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_status::{PostStatusMessage, StatusEntry, StatusMessage};

    #[test]
    fn test_posted_status_applied_on_tick() {
        let shell = ShellBus::new(&BusConfig::default()).unwrap();
        shell
            .sender()
            .post::<PostStatusMessage>(StatusEntry::new("srv", StatusMessage::new("up")))
            .unwrap();

        assert!(shell.has_pending());
        assert!(shell.status().is_empty());
        assert_eq!(shell.tick(), 1);
        assert_eq!(shell.status().get("srv").map(|m| m.text), Some("up".into()));
    }
}
