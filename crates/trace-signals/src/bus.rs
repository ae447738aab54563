//! Synchronous, typed publish/subscribe bus.
//!
//! Delivery rules:
//! - `fire` runs every handler registered on the channel, in registration
//!   order, on the calling thread, before returning.
//! - The handler list is snapshotted when `fire` starts. Subscriptions added or
//!   removed by a handler only affect later fires.
//! - A handler that returns `Err` or panics is logged and skipped; the
//!   remaining handlers still run and the producer never sees the failure.

use crate::config::BusConfig;
use crate::error::{HandlerError, HandlerResult, SignalError};
use crate::signal::Signal;
use log::{debug, error};
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

/// Opaque per-bus subscription number. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Token returned by [`SignalBus::subscribe`]. Its only use is unsubscribing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    channel: &'static str,
    id: SubscriptionId,
}

impl SubscriptionHandle {
    pub fn channel(&self) -> &'static str {
        self.channel
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

/// Delivery counters, cumulative over the bus lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusStats {
    pub fired: u64,
    pub delivered: u64,
    pub failed: u64,
}

type ErasedHandler = Arc<dyn Fn(&dyn Any) -> HandlerResult + Send + Sync>;

struct Channel {
    payload_type: TypeId,
    payload_name: &'static str,
    handlers: Vec<(SubscriptionId, ErasedHandler)>,
}

impl Channel {
    fn new<P: 'static>() -> Self {
        Self {
            payload_type: TypeId::of::<P>(),
            payload_name: type_name::<P>(),
            handlers: Vec::new(),
        }
    }

    fn check<S: Signal>(&self) -> Result<(), SignalError> {
        if self.payload_type == TypeId::of::<S::Payload>() {
            Ok(())
        } else {
            Err(SignalError::PayloadMismatch {
                channel: S::NAME,
                expected: self.payload_name,
                found: type_name::<S::Payload>(),
            })
        }
    }
}

struct BusState {
    config: BusConfig,
    channels: RwLock<HashMap<&'static str, Channel>>,
    next_id: AtomicU64,
    fired: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl BusState {
    fn remove(&self, handle: SubscriptionHandle) -> bool {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        let Some(channel) = channels.get_mut(handle.channel) else {
            return false;
        };
        let before = channel.handlers.len();
        channel.handlers.retain(|(id, _)| *id != handle.id);
        let removed = channel.handlers.len() != before;
        if removed {
            debug!("Unsubscribed {} from '{}'", handle.id, handle.channel);
        }
        removed
    }
}

/// Process-wide signal dispatcher.
///
/// Cloning is cheap and yields another handle to the same registry, so one bus
/// can be constructed at startup and handed to every component.
#[derive(Clone)]
pub struct SignalBus {
    state: Arc<BusState>,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBus")
            .field("channels", &self.channel_names())
            .field("stats", &self.stats())
            .finish()
    }
}

impl SignalBus {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            state: Arc::new(BusState {
                config,
                channels: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                fired: AtomicU64::new(0),
                delivered: AtomicU64::new(0),
                failed: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.state.config
    }

    /// Register `handler` on channel `S`.
    ///
    /// Fails only when another channel type already claimed `S::NAME` with a
    /// different payload type.
    pub fn subscribe<S, F>(&self, handler: F) -> Result<SubscriptionHandle, SignalError>
    where
        S: Signal,
        F: Fn(&S::Payload) -> HandlerResult + Send + Sync + 'static,
    {
        let erased: ErasedHandler = Arc::new(move |payload: &dyn Any| {
            match payload.downcast_ref::<S::Payload>() {
                Some(payload) => handler(payload),
                None => Err(HandlerError::from(format!(
                    "payload is not {}",
                    type_name::<S::Payload>()
                ))),
            }
        });

        let mut channels = self
            .state
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let channel = channels
            .entry(S::NAME)
            .or_insert_with(Channel::new::<S::Payload>);
        channel.check::<S>()?;

        let id = SubscriptionId(self.state.next_id.fetch_add(1, Ordering::Relaxed));
        channel.handlers.push((id, erased));
        debug!(
            "Subscribed {} to '{}' ({} handlers)",
            id,
            S::NAME,
            channel.handlers.len()
        );

        Ok(SubscriptionHandle {
            channel: S::NAME,
            id,
        })
    }

    /// Like [`subscribe`](Self::subscribe), but the subscription ends when the
    /// returned guard is dropped.
    pub fn subscribe_scoped<S, F>(&self, handler: F) -> Result<ScopedSubscription, SignalError>
    where
        S: Signal,
        F: Fn(&S::Payload) -> HandlerResult + Send + Sync + 'static,
    {
        let handle = self.subscribe::<S, F>(handler)?;
        Ok(ScopedSubscription {
            bus: Arc::downgrade(&self.state),
            handle,
            armed: true,
        })
    }

    /// Remove a subscription. Returns whether a handler was removed; stale or
    /// repeated handles are a no-op.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        self.state.remove(handle)
    }

    /// Deliver `payload` to every handler currently registered on `S`.
    ///
    /// Returns the number of handlers the payload was handed to, failed ones
    /// included. Firing a channel nobody listens to returns `Ok(0)`.
    pub fn fire<S: Signal>(&self, payload: &S::Payload) -> Result<usize, SignalError> {
        let snapshot: Vec<(SubscriptionId, ErasedHandler)> = {
            let channels = self
                .state
                .channels
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match channels.get(S::NAME) {
                Some(channel) => {
                    channel.check::<S>()?;
                    channel.handlers.clone()
                }
                None => Vec::new(),
            }
        };

        self.state.fired.fetch_add(1, Ordering::Relaxed);
        if snapshot.is_empty() {
            debug!("Fired '{}' with no subscribers", S::NAME);
            return Ok(0);
        }

        for (id, handler) in &snapshot {
            self.invoke(S::NAME, *id, handler, payload);
        }

        Ok(snapshot.len())
    }

    fn invoke(
        &self,
        channel: &'static str,
        id: SubscriptionId,
        handler: &ErasedHandler,
        payload: &dyn Any,
    ) {
        self.state.delivered.fetch_add(1, Ordering::Relaxed);

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| handler(payload))) {
            Ok(result) => result,
            Err(panic) => Err(HandlerError::from(format!(
                "panicked: {}",
                panic_message(panic.as_ref())
            ))),
        };

        if let Err(e) = outcome {
            self.state.failed.fetch_add(1, Ordering::Relaxed);
            error!("Handler {} on '{}' failed: {}", id, channel, e);
        }
    }

    /// Number of handlers currently registered on `S`.
    pub fn subscriber_count<S: Signal>(&self) -> usize {
        self.state
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(S::NAME)
            .map(|c| c.handlers.len())
            .unwrap_or(0)
    }

    /// Names of every channel that has ever had a subscriber, sorted.
    pub fn channel_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .state
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        names.sort_unstable();
        names
    }

    pub fn stats(&self) -> BusStats {
        BusStats {
            fired: self.state.fired.load(Ordering::Relaxed),
            delivered: self.state.delivered.load(Ordering::Relaxed),
            failed: self.state.failed.load(Ordering::Relaxed),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Subscription that is removed when dropped.
///
/// Holds the bus weakly: dropping the guard after the bus is gone is fine.
#[must_use = "dropping the guard unsubscribes immediately"]
pub struct ScopedSubscription {
    bus: Weak<BusState>,
    handle: SubscriptionHandle,
    armed: bool,
}

impl ScopedSubscription {
    pub fn handle(&self) -> SubscriptionHandle {
        self.handle
    }

    /// Keep the subscription alive past the guard and return its plain handle.
    pub fn detach(mut self) -> SubscriptionHandle {
        self.armed = false;
        self.handle
    }
}

impl std::fmt::Debug for ScopedSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedSubscription")
            .field("handle", &self.handle)
            .field("armed", &self.armed)
            .finish()
    }
}

impl Drop for ScopedSubscription {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(state) = self.bus.upgrade() {
            state.remove(self.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::{OpenedTraces, Theme};
    use crate::signal::{OpenedTracesUpdated, ThemeChanged};
    use std::sync::Mutex;

    fn traces(n: i64) -> OpenedTraces {
        OpenedTraces::new(n).unwrap()
    }

    type Recorded = Box<dyn Fn(&OpenedTraces) -> HandlerResult + Send + Sync>;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Recorded) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let make = {
            let log = log.clone();
            move |name: &str| -> Recorded {
                let log = log.clone();
                let name = name.to_string();
                Box::new(move |p: &OpenedTraces| {
                    log.lock().unwrap().push(format!("{}:{}", name, p.count()));
                    Ok(())
                })
            }
        };
        (log, make)
    }

    #[test]
    fn test_fire_in_registration_order() {
        let bus = SignalBus::new();
        let (log, make) = recorder();

        for name in ["a", "b", "c", "d"] {
            let handler = make(name);
            bus.subscribe::<OpenedTracesUpdated, _>(move |p| handler(p))
                .unwrap();
        }

        assert_eq!(bus.fire::<OpenedTracesUpdated>(&traces(3)), Ok(4));
        assert_eq!(*log.lock().unwrap(), vec!["a:3", "b:3", "c:3", "d:3"]);
    }

    #[test]
    fn test_fire_without_subscribers_is_noop() {
        let bus = SignalBus::new();
        assert_eq!(bus.fire::<ThemeChanged>(&Theme::Dark), Ok(0));
        assert_eq!(bus.stats().delivered, 0);
    }

    #[test]
    fn test_failing_handler_is_isolated() {
        let bus = SignalBus::new();
        let (log, make) = recorder();

        bus.subscribe::<OpenedTracesUpdated, _>(|_| Err("boom".into()))
            .unwrap();
        let second = make("second");
        bus.subscribe::<OpenedTracesUpdated, _>(move |p| second(p))
            .unwrap();

        assert_eq!(bus.fire::<OpenedTracesUpdated>(&traces(1)), Ok(2));
        assert_eq!(*log.lock().unwrap(), vec!["second:1"]);
        assert_eq!(bus.stats().failed, 1);
    }

    #[test]
    fn test_panicking_handler_is_isolated() {
        let bus = SignalBus::new();
        let (log, make) = recorder();

        bus.subscribe::<OpenedTracesUpdated, _>(|_| panic!("handler exploded"))
            .unwrap();
        let after = make("after");
        bus.subscribe::<OpenedTracesUpdated, _>(move |p| after(p))
            .unwrap();

        assert_eq!(bus.fire::<OpenedTracesUpdated>(&traces(2)), Ok(2));
        assert_eq!(*log.lock().unwrap(), vec!["after:2"]);
        assert_eq!(bus.stats().failed, 1);
    }

    #[test]
    fn test_panic_isolated_with_legacy_config_key() {
        let config: BusConfig = serde_json::from_str(r#"{"catch_panics": false}"#).unwrap();
        let bus = SignalBus::with_config(config);
        let (log, make) = recorder();

        bus.subscribe::<OpenedTracesUpdated, _>(|_| panic!("boom"))
            .unwrap();
        let after = make("after");
        bus.subscribe::<OpenedTracesUpdated, _>(move |p| after(p))
            .unwrap();

        let fired = panic::catch_unwind(AssertUnwindSafe(|| {
            bus.fire::<OpenedTracesUpdated>(&traces(4))
        }));
        assert_eq!(fired.ok(), Some(Ok(2)));
        assert_eq!(*log.lock().unwrap(), vec!["after:4"]);
        assert_eq!(
            bus.stats(),
            BusStats {
                fired: 1,
                delivered: 2,
                failed: 1,
            }
        );
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = SignalBus::new();
        let handle = bus
            .subscribe::<OpenedTracesUpdated, _>(|_| Ok(()))
            .unwrap();

        assert!(bus.unsubscribe(handle));
        assert!(!bus.unsubscribe(handle));
        assert_eq!(bus.subscriber_count::<OpenedTracesUpdated>(), 0);
        assert_eq!(bus.fire::<OpenedTracesUpdated>(&traces(0)), Ok(0));
    }

    #[test]
    fn test_unsubscribe_mid_fire_applies_to_next_fire() {
        let bus = SignalBus::new();
        let (log, make) = recorder();
        let victim: Arc<Mutex<Option<SubscriptionHandle>>> = Arc::new(Mutex::new(None));

        {
            let bus_inner = bus.clone();
            let victim = victim.clone();
            bus.subscribe::<OpenedTracesUpdated, _>(move |_| {
                if let Some(handle) = victim.lock().unwrap().take() {
                    bus_inner.unsubscribe(handle);
                }
                Ok(())
            })
            .unwrap();
        }
        let second = make("second");
        let handle = bus
            .subscribe::<OpenedTracesUpdated, _>(move |p| second(p))
            .unwrap();
        *victim.lock().unwrap() = Some(handle);

        assert_eq!(bus.fire::<OpenedTracesUpdated>(&traces(1)), Ok(2));
        assert_eq!(bus.fire::<OpenedTracesUpdated>(&traces(2)), Ok(1));
        assert_eq!(*log.lock().unwrap(), vec!["second:1"]);
    }

    #[test]
    fn test_subscribe_mid_fire_applies_to_next_fire() {
        let bus = SignalBus::new();
        let (log, make) = recorder();
        let late = Arc::new(Mutex::new(Some(make("late"))));

        {
            let bus_inner = bus.clone();
            bus.subscribe::<OpenedTracesUpdated, _>(move |_| {
                if let Some(handler) = late.lock().unwrap().take() {
                    bus_inner.subscribe::<OpenedTracesUpdated, _>(move |p| handler(p))?;
                }
                Ok(())
            })
            .unwrap();
        }

        assert_eq!(bus.fire::<OpenedTracesUpdated>(&traces(1)), Ok(1));
        assert!(log.lock().unwrap().is_empty());

        assert_eq!(bus.fire::<OpenedTracesUpdated>(&traces(2)), Ok(2));
        assert_eq!(*log.lock().unwrap(), vec!["late:2"]);
    }

    #[test]
    fn test_nested_fire_from_handler() {
        let bus = SignalBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        {
            let seen = seen.clone();
            bus.subscribe::<ThemeChanged, _>(move |theme| {
                seen.lock().unwrap().push(theme.to_string());
                Ok(())
            })
            .unwrap();
        }
        {
            let bus_inner = bus.clone();
            bus.subscribe::<OpenedTracesUpdated, _>(move |p| {
                let theme = if p.count() > 0 { Theme::Dark } else { Theme::Light };
                bus_inner.fire::<ThemeChanged>(&theme)?;
                Ok(())
            })
            .unwrap();
        }

        bus.fire::<OpenedTracesUpdated>(&traces(1)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["dark"]);
    }

    struct ImpostorTraces;

    impl Signal for ImpostorTraces {
        type Payload = String;
        const NAME: &'static str = OpenedTracesUpdated::NAME;
    }

    #[test]
    fn test_name_collision_with_other_payload_is_rejected() {
        let bus = SignalBus::new();
        bus.subscribe::<OpenedTracesUpdated, _>(|_| Ok(())).unwrap();

        let err = bus.subscribe::<ImpostorTraces, _>(|_| Ok(())).unwrap_err();
        assert!(matches!(
            err,
            SignalError::PayloadMismatch {
                channel: "opened-traces-updated",
                ..
            }
        ));
        assert!(bus.fire::<ImpostorTraces>(&"3".to_string()).is_err());
        assert_eq!(bus.subscriber_count::<OpenedTracesUpdated>(), 1);
    }

    #[test]
    fn test_scoped_subscription_unsubscribes_on_drop() {
        let bus = SignalBus::new();

        let guard = bus
            .subscribe_scoped::<ThemeChanged, _>(|_| Ok(()))
            .unwrap();
        assert_eq!(bus.subscriber_count::<ThemeChanged>(), 1);
        drop(guard);
        assert_eq!(bus.subscriber_count::<ThemeChanged>(), 0);

        let handle = bus
            .subscribe_scoped::<ThemeChanged, _>(|_| Ok(()))
            .unwrap()
            .detach();
        assert_eq!(bus.subscriber_count::<ThemeChanged>(), 1);
        assert!(bus.unsubscribe(handle));
    }

    #[test]
    fn test_scoped_subscription_outlives_bus() {
        let bus = SignalBus::new();
        let guard = bus
            .subscribe_scoped::<ThemeChanged, _>(|_| Ok(()))
            .unwrap();
        drop(bus);
        drop(guard);
    }

    #[test]
    fn test_handles_are_unique() {
        let bus = SignalBus::new();
        let a = bus.subscribe::<ThemeChanged, _>(|_| Ok(())).unwrap();
        let b = bus.subscribe::<ThemeChanged, _>(|_| Ok(())).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.channel(), "theme-changed");
        assert_eq!(bus.channel_names(), vec!["theme-changed"]);
    }
}
