//! trace-signals - typed in-process signal bus for trace viewer components
//!
//! Features:
//! - One bus, many named channels, each with a fixed payload type
//! - Synchronous fan-out in registration order, failing handlers isolated
//! - Snapshot-on-fire: subscribing or unsubscribing from a handler is safe
//! - Handles and scoped guards for deterministic unsubscription
//! - Bounded queue for posting signals from background threads

pub mod bus;
pub mod config;
pub mod error;
pub mod menu;
pub mod payloads;
pub mod property;
pub mod queue;
pub mod signal;

pub use bus::{BusStats, ScopedSubscription, SignalBus, SubscriptionHandle, SubscriptionId};
pub use config::{BusConfig, QUEUE_CAPACITY};
pub use error::{HandlerError, HandlerResult, PayloadError, SignalError};
pub use menu::{ContextMenu, MAX_SUBMENU_DEPTH, MenuItem, Submenu};
pub use payloads::{
    AnalysesChanged, Experiment, MenuContribution, MenuItemClick, OpenedTraces, OutputDescriptor,
    OutputType, Theme, TimeRange, Tooltip,
};
pub use property::{Properties, PropertyValue};
pub use queue::{SignalQueue, SignalSender};
pub use signal::{
    AvailableAnalysesChanged, ContextMenuContributed, ContextMenuItemClicked, ExperimentClosed,
    ExperimentOpened, ExperimentSelected, OpenedTracesUpdated, SelectionRangeUpdated, Signal,
    ThemeChanged, TooltipUpdated,
};
