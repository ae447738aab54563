//! Status bar: open trace count followed by the active status messages.

use crate::event_bus::ShellBus;
use crate::panel_manager::{PanelFactory, PanelInstance};
use crate::panels::lock;
use log::debug;
use std::error::Error;
use std::sync::{Arc, Mutex};
use trace_signals::{OpenedTracesUpdated, ScopedSubscription};
use trace_status::{Severity, StatusEntry, StatusMessageAdded, StatusMessageRemoved, StatusRegistry};

pub struct StatusBarFactory {
    pub show_debug: bool,
}

/// `line` is the last render, dropped whenever an input changes.
#[derive(Default)]
struct BarState {
    open_traces: u64,
    line: Option<String>,
}

pub struct StatusBar {
    state: Arc<Mutex<BarState>>,
    status: Arc<StatusRegistry>,
    show_debug: bool,
    _subscriptions: Vec<ScopedSubscription>,
}

impl PanelFactory for StatusBarFactory {
    fn panel_name(&self) -> &str {
        "status-bar"
    }

    fn create_instance(&self, shell: &ShellBus) -> Result<Box<dyn PanelInstance>, Box<dyn Error>> {
        let state = Arc::new(Mutex::new(BarState::default()));
        let bus = shell.bus();

        let traces = {
            let state = state.clone();
            bus.subscribe_scoped::<OpenedTracesUpdated, _>(move |opened| {
                let mut state = lock(&state);
                state.open_traces = opened.count();
                state.line = None;
                Ok(())
            })?
        };

        // Messages are read from the registry at render time.
        let added = {
            let state = state.clone();
            bus.subscribe_scoped::<StatusMessageAdded, _>(move |entry| {
                debug!("Status bar dirty: +{}", entry.key);
                lock(&state).line = None;
                Ok(())
            })?
        };
        let removed = {
            let state = state.clone();
            bus.subscribe_scoped::<StatusMessageRemoved, _>(move |entry| {
                debug!("Status bar dirty: -{}", entry.key);
                lock(&state).line = None;
                Ok(())
            })?
        };

        Ok(Box::new(StatusBar {
            state,
            status: shell.status().clone(),
            show_debug: self.show_debug,
            _subscriptions: vec![traces, added, removed],
        }))
    }
}

impl PanelInstance for StatusBar {
    fn render(&self) -> String {
        let mut state = lock(&self.state);
        let open_traces = state.open_traces;
        state
            .line
            .get_or_insert_with(|| {
                format_status_line(open_traces, &self.status.snapshot(), self.show_debug)
            })
            .clone()
    }
}

/// Render e.g. `2 traces open | [WARNING] Server slow | Indexing done`.
/// INFO messages carry no tag; DEBUG messages are skipped unless asked for.
pub fn format_status_line(open_traces: u64, entries: &[StatusEntry], show_debug: bool) -> String {
    let mut parts = vec![match open_traces {
        0 => "no traces open".to_string(),
        1 => "1 trace open".to_string(),
        n => format!("{} traces open", n),
    }];

    for entry in entries {
        let msg = &entry.message;
        match msg.severity {
            Severity::Debug if !show_debug => continue,
            Severity::Info => parts.push(msg.text.clone()),
            severity => parts.push(format!("[{}] {}", severity, msg.text)),
        }
    }

    parts.join(" | ")
}
