//! Cross-thread posting of signals.
//!
//! Background services never fire on the bus themselves. They post through a
//! [`SignalSender`] and the thread that owns the UI drains the queue on its
//! polling tick, so every handler runs on that one thread and signals keep the
//! order they were posted in.

use crate::bus::SignalBus;
use crate::config::{BusConfig, QUEUE_CAPACITY};
use crate::error::SignalError;
use crate::signal::Signal;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::warn;

type Job = Box<dyn FnOnce(&SignalBus) -> Result<usize, SignalError> + Send>;

/// Receiving side, owned by the thread that drives the bus.
pub struct SignalQueue {
    tx: Sender<Job>,
    rx: Receiver<Job>,
}

/// Posting side. Cheap to clone, one per producer thread.
#[derive(Clone)]
pub struct SignalSender {
    tx: Sender<Job>,
}

impl Default for SignalQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalQueue {
    pub fn new() -> Self {
        Self::with_capacity(QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        Self { tx, rx }
    }

    pub fn from_config(config: &BusConfig) -> Self {
        Self::with_capacity(config.queue_capacity)
    }

    pub fn sender(&self) -> SignalSender {
        SignalSender {
            tx: self.tx.clone(),
        }
    }

    /// Number of signals waiting to be fired.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Fire every signal queued so far on `bus`, oldest first.
    ///
    /// Signals posted while draining (including by handlers) wait for the next
    /// call. Returns how many signals were fired.
    pub fn drain(&self, bus: &SignalBus) -> usize {
        let pending = self.rx.len();
        let mut fired = 0;

        for job in self.rx.try_iter().take(pending) {
            match job(bus) {
                Ok(_) => fired += 1,
                Err(e) => warn!("Dropped queued signal: {}", e),
            }
        }

        fired
    }
}

impl SignalSender {
    /// Queue `payload` for channel `S`. Never blocks.
    pub fn post<S: Signal>(&self, payload: S::Payload) -> Result<(), SignalError> {
        let job: Job = Box::new(move |bus: &SignalBus| bus.fire::<S>(&payload));

        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!("Signal queue full, dropping '{}'", S::NAME);
                Err(SignalError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(SignalError::QueueClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::{OpenedTraces, Theme};
    use crate::signal::{OpenedTracesUpdated, ThemeChanged};
    use std::sync::{Arc, Mutex};
    use std::thread;

    #[test]
    fn test_drain_fires_in_posting_order_on_owner_thread() {
        let bus = SignalBus::new();
        let queue = SignalQueue::new();
        let owner = thread::current().id();
        let seen = Arc::new(Mutex::new(Vec::new()));

        {
            let seen = seen.clone();
            bus.subscribe::<OpenedTracesUpdated, _>(move |p| {
                assert_eq!(thread::current().id(), owner);
                seen.lock().unwrap().push(p.count());
                Ok(())
            })
            .unwrap();
        }

        let sender = queue.sender();
        thread::spawn(move || {
            for n in 1..=5 {
                sender
                    .post::<OpenedTracesUpdated>(OpenedTraces::new(n).unwrap())
                    .unwrap();
            }
        })
        .join()
        .unwrap();

        assert_eq!(queue.len(), 5);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(queue.drain(&bus), 5);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_rejects_post() {
        let queue = SignalQueue::with_capacity(1);
        let sender = queue.sender();

        assert!(sender.post::<ThemeChanged>(Theme::Dark).is_ok());
        assert_eq!(
            sender.post::<ThemeChanged>(Theme::Light),
            Err(SignalError::QueueFull)
        );
    }

    #[test]
    fn test_closed_queue_rejects_post() {
        let queue = SignalQueue::new();
        let sender = queue.sender();
        drop(queue);

        assert_eq!(
            sender.post::<ThemeChanged>(Theme::Dark),
            Err(SignalError::QueueClosed)
        );
    }

    #[test]
    fn test_posts_from_handlers_wait_for_next_drain() {
        let bus = SignalBus::new();
        let queue = SignalQueue::new();
        let sender = queue.sender();
        let themes = Arc::new(Mutex::new(Vec::new()));

        bus.subscribe::<OpenedTracesUpdated, _>(move |_| {
            sender.post::<ThemeChanged>(Theme::Dark)?;
            Ok(())
        })
        .unwrap();
        {
            let themes = themes.clone();
            bus.subscribe::<ThemeChanged, _>(move |t| {
                themes.lock().unwrap().push(*t);
                Ok(())
            })
            .unwrap();
        }

        queue
            .sender()
            .post::<OpenedTracesUpdated>(OpenedTraces::new(1).unwrap())
            .unwrap();

        assert_eq!(queue.drain(&bus), 1);
        assert!(themes.lock().unwrap().is_empty());
        assert_eq!(queue.drain(&bus), 1);
        assert_eq!(*themes.lock().unwrap(), vec![Theme::Dark]);
    }
}
