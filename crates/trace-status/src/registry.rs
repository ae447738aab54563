//! Status message registry.

use crate::error::StatusError;
use crate::signals::{
    ClearStatusMessage, PostStatusMessage, StatusMessageAdded, StatusMessageRemoved,
};
use crate::types::{StatusCategory, StatusEntry, StatusMessage};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tokio::sync::broadcast;
use trace_signals::{ScopedSubscription, SignalBus};

/// Change feed capacity. Lagging receivers skip old events.
pub const EVENT_CAPACITY: usize = 64;

/// Events emitted when the registry changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusEvent {
    Added(StatusEntry),
    Removed(StatusEntry),
}

/// Keyed store of active status messages.
///
/// The last write for a key wins. Messages never expire; whoever adds a
/// message removes it.
pub struct StatusRegistry {
    messages: RwLock<HashMap<String, StatusMessage>>,
    event_tx: broadcast::Sender<StatusEvent>,
    bus: Option<SignalBus>,
}

impl Default for StatusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusRegistry {
    /// Create an empty registry reporting changes only on its change feed.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            messages: RwLock::new(HashMap::new()),
            event_tx: tx,
            bus: None,
        }
    }

    /// Create an empty registry that also fires
    /// [`StatusMessageAdded`]/[`StatusMessageRemoved`] on `bus`.
    pub fn with_bus(bus: SignalBus) -> Self {
        Self {
            bus: Some(bus),
            ..Self::new()
        }
    }

    /// Insert or replace the message for `key`. Returns the replaced message.
    pub fn add_status_message(
        &self,
        key: impl Into<String>,
        message: StatusMessage,
    ) -> Option<StatusMessage> {
        let entry = StatusEntry::new(key, message);
        debug!(
            "Status '{}' [{} {}]: {}",
            entry.key, entry.message.category, entry.message.severity, entry.message.text
        );

        let previous = {
            let mut messages = self.messages.write().unwrap_or_else(PoisonError::into_inner);
            let previous = messages.insert(entry.key.clone(), entry.message.clone());
            self.record(StatusEvent::Added(entry.clone()));
            previous
        };

        self.announce(&StatusEvent::Added(entry));
        previous
    }

    /// Remove the message for `key`, if any. Absent keys are ignored.
    pub fn remove_status_message(&self, key: &str) -> Option<StatusMessage> {
        let removed = {
            let mut messages = self.messages.write().unwrap_or_else(PoisonError::into_inner);
            let removed = messages.remove(key);
            if let Some(message) = &removed {
                self.record(StatusEvent::Removed(StatusEntry::new(key, message.clone())));
            }
            removed
        };

        if let Some(message) = &removed {
            debug!("Status '{}' removed", key);
            self.announce(&StatusEvent::Removed(StatusEntry::new(key, message.clone())));
        }
        removed
    }

    /// Remove every message of `category`. Returns how many were removed.
    pub fn clear_category(&self, category: StatusCategory) -> usize {
        let removed: Vec<StatusEntry> = {
            let mut messages = self.messages.write().unwrap_or_else(PoisonError::into_inner);
            let mut keys: Vec<String> = messages
                .iter()
                .filter(|(_, m)| m.category == category)
                .map(|(k, _)| k.clone())
                .collect();
            keys.sort();

            let removed: Vec<StatusEntry> = keys
                .into_iter()
                .filter_map(|k| messages.remove(&k).map(|m| StatusEntry::new(k, m)))
                .collect();
            for entry in &removed {
                self.record(StatusEvent::Removed(entry.clone()));
            }
            removed
        };

        for entry in &removed {
            self.announce(&StatusEvent::Removed(entry.clone()));
        }
        removed.len()
    }

    pub fn get(&self, key: &str) -> Option<StatusMessage> {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All active messages, sorted by key so renders are stable.
    pub fn snapshot(&self) -> Vec<StatusEntry> {
        let mut entries: Vec<StatusEntry> = self
            .messages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, m)| StatusEntry::new(k.clone(), m.clone()))
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    /// The most urgent active message; ties go to the smallest key.
    pub fn most_severe(&self) -> Option<StatusEntry> {
        self.snapshot()
            .into_iter()
            .min_by(|a, b| a.message.severity.cmp(&b.message.severity))
    }

    /// Subscribe to registry changes.
    pub fn watch(&self) -> broadcast::Receiver<StatusEvent> {
        self.event_tx.subscribe()
    }

    /// Apply [`PostStatusMessage`] and [`ClearStatusMessage`] requests fired
    /// on `bus` to this registry until the returned link is dropped.
    pub fn listen(self: &Arc<Self>, bus: &SignalBus) -> Result<StatusLink, StatusError> {
        let registry: Weak<StatusRegistry> = Arc::downgrade(self);
        let post = bus.subscribe_scoped::<PostStatusMessage, _>(move |entry| {
            if let Some(registry) = registry.upgrade() {
                registry.add_status_message(entry.key.clone(), entry.message.clone());
            }
            Ok(())
        })?;

        let registry: Weak<StatusRegistry> = Arc::downgrade(self);
        let clear = bus.subscribe_scoped::<ClearStatusMessage, _>(move |key| {
            if let Some(registry) = registry.upgrade() {
                registry.remove_status_message(key);
            }
            Ok(())
        })?;

        Ok(StatusLink {
            _subscriptions: [post, clear],
        })
    }

    /// Push onto the change feed. Called with the write lock held so the
    /// feed order matches the order changes were applied.
    fn record(&self, event: StatusEvent) {
        // No receivers is fine (nothing rendered yet).
        let _ = self.event_tx.send(event);
    }

    /// Fire the bus notification. Called after the lock is released since
    /// handlers may call back into the registry.
    fn announce(&self, event: &StatusEvent) {
        let Some(bus) = &self.bus else {
            return;
        };
        let fired = match event {
            StatusEvent::Added(entry) => bus.fire::<StatusMessageAdded>(entry),
            StatusEvent::Removed(entry) => bus.fire::<StatusMessageRemoved>(entry),
        };
        if let Err(e) = fired {
            warn!("Failed to announce status change: {}", e);
        }
    }
}

/// Keeps a registry subscribed to the status request channels.
#[must_use = "dropping the link stops applying status requests"]
#[derive(Debug)]
pub struct StatusLink {
    _subscriptions: [ScopedSubscription; 2],
}
