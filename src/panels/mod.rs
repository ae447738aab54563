//! Panels rendered by the shell.
//!
//! Each panel keeps its own state behind a mutex, updated by bus handlers,
//! and holds scoped subscriptions so dropping the panel detaches it.
//!
//! - `status_bar` - open trace count and active status messages
//! - `context_menu` - collects contributed menus, turns raw activations into clicks
//! - `overview` - available analyses, selection range, tooltip

pub mod context_menu;
pub mod overview;
pub mod status_bar;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A handler that panicked mid-update must not wedge the panel.
#[inline]
pub(crate) fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
