//! Bus channels for status messages.
//!
//! The two request channels let any component, including background services
//! posting through a `SignalQueue`, change the registry without holding it.
//! The two notification channels report every change the registry applied.

use crate::types::StatusEntry;
use trace_signals::Signal;

/// Ask the registry to add or replace a message.
#[derive(Clone, Copy, Debug)]
pub struct PostStatusMessage;

impl Signal for PostStatusMessage {
    type Payload = StatusEntry;
    const NAME: &'static str = "post-status-message";
}

/// Ask the registry to remove the message with this key.
#[derive(Clone, Copy, Debug)]
pub struct ClearStatusMessage;

impl Signal for ClearStatusMessage {
    type Payload = String;
    const NAME: &'static str = "clear-status-message";
}

/// A message was added or replaced.
#[derive(Clone, Copy, Debug)]
pub struct StatusMessageAdded;

impl Signal for StatusMessageAdded {
    type Payload = StatusEntry;
    const NAME: &'static str = "status-message-added";
}

/// A message was removed.
#[derive(Clone, Copy, Debug)]
pub struct StatusMessageRemoved;

impl Signal for StatusMessageRemoved {
    type Payload = StatusEntry;
    const NAME: &'static str = "status-message-removed";
}
