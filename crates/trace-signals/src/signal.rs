//! Signal channel definitions.
//!
//! A channel is a zero-sized marker type naming the channel and fixing its
//! payload type. Crates outside this one add channels the same way:
//!
//! ```
//! use trace_signals::Signal;
//!
//! pub struct ServerReachable;
//!
//! impl Signal for ServerReachable {
//!     type Payload = bool;
//!     const NAME: &'static str = "server-reachable";
//! }
//! ```

use crate::payloads::{
    AnalysesChanged, Experiment, MenuContribution, MenuItemClick, OpenedTraces, Theme, TimeRange,
    Tooltip,
};

/// A named channel with a fixed payload type.
pub trait Signal: 'static {
    /// Payload delivered to every handler of this channel.
    type Payload: Send + Sync + 'static;

    /// Stable channel name. Must be unique per payload type within a bus.
    const NAME: &'static str;
}

macro_rules! signals {
    ($($(#[$doc:meta])* $marker:ident => $name:literal: $payload:ty;)*) => {
        $(
            $(#[$doc])*
            #[derive(Clone, Copy, Debug)]
            pub struct $marker;

            impl Signal for $marker {
                type Payload = $payload;
                const NAME: &'static str = $name;
            }
        )*
    };
}

signals! {
    /// The outputs available for an experiment changed.
    AvailableAnalysesChanged => "available-analyses-changed": AnalysesChanged;
    /// An output view contributed its context menu.
    ContextMenuContributed => "context-menu-contributed": MenuContribution;
    /// A contributed context menu item was clicked.
    ContextMenuItemClicked => "context-menu-item-clicked": MenuItemClick;
    /// The number of open traces changed.
    OpenedTracesUpdated => "opened-traces-updated": OpenedTraces;
    /// Hover content changed.
    TooltipUpdated => "tooltip-updated": Tooltip;
    /// An experiment finished opening.
    ExperimentOpened => "experiment-opened": Experiment;
    /// An experiment was closed.
    ExperimentClosed => "experiment-closed": Experiment;
    /// The focused experiment changed; `None` when nothing is selected.
    ExperimentSelected => "experiment-selected": Option<Experiment>;
    /// The user selected a new time range.
    SelectionRangeUpdated => "selection-range-updated": TimeRange;
    /// The host switched color themes.
    ThemeChanged => "theme-changed": Theme;
}
