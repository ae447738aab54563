//! Background and bus-driven services for TraceShell.
//!
//! - `trace_loader` - opens the configured traces on a worker thread
//! - `trace_context` - mirrors open experiments into status messages

pub mod trace_context;
pub mod trace_loader;

use crate::config::ShellConfig;
use crate::event_bus::ShellBus;
use log::info;
use std::thread::JoinHandle;
use std::time::Duration;
use trace_context::TraceContext;
use trace_signals::SignalError;

/// Start all services. Call once from main before creating any panels.
pub fn start_all(shell: &ShellBus, config: &ShellConfig) -> Result<Services, SignalError> {
    info!("Starting shared services...");

    let context = TraceContext::start(shell)?;
    let loader = trace_loader::start_loader(
        shell.sender(),
        config.traces.clone(),
        Duration::from_millis(config.load_delay_ms),
    );

    Ok(Services {
        _context: context,
        loader,
    })
}

/// Handles of the started services.
pub struct Services {
    _context: TraceContext,
    loader: JoinHandle<()>,
}

impl Services {
    pub fn is_loading(&self) -> bool {
        !self.loader.is_finished()
    }
}
