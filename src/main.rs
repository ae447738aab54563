//! TraceShell - headless host for the trace viewer signal bus
//!
//! Single-threaded bus with background services posting through a queue.

mod config;
mod event_bus;
mod panel_manager;
mod panels;
mod services;

use config::ShellConfig;
use env_logger::Env;
use event_bus::ShellBus;
use log::{debug, info, warn};
use panel_manager::PanelManager;
use panels::context_menu::{ContextMenuFactory, ItemActivation, MenuItemActivated};
use panels::overview::OverviewFactory;
use panels::status_bar::StatusBarFactory;
use services::trace_loader;
use std::error::Error;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use trace_signals::{ExperimentClosed, ExperimentSelected};
use trace_status::StatusEvent;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting TraceShell...");

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => ShellConfig::load(&path),
        None => match ShellConfig::default_path() {
            Some(path) => {
                if !path.exists() {
                    if let Err(e) = ShellConfig::default().save(&path) {
                        warn!("Failed to write default config {:?}: {}", path, e);
                    }
                }
                ShellConfig::load(&path)
            }
            None => {
                warn!("No config directory, using defaults");
                ShellConfig::default()
            }
        },
    };

    let shell = ShellBus::new(&config.bus)?;

    // Start shared services ONCE, before any panel subscribes.
    // Nothing posted by the loader fires until the first tick.
    let services = services::start_all(&shell, &config)?;

    let mut panels = PanelManager::new();
    panels.register_factory(StatusBarFactory {
        show_debug: config.show_debug_messages,
    });
    panels.register_factory(ContextMenuFactory);
    panels.register_factory(OverviewFactory);
    panels.start(&shell)?;

    let mut status_events = shell.status().watch();
    let poll_interval = Duration::from_millis(config.poll_interval_ms);
    while services.is_loading() || shell.has_pending() {
        if shell.tick() > 0 {
            log_status_changes(&mut status_events);
            for line in panels.render_all() {
                info!("{}", line);
            }
        }
        thread::sleep(poll_interval);
    }

    // Stand-in for user input on the first analysis.
    let output_id = trace_loader::ANALYSES[0].0;
    for item in ["export-csv", "reset-selection"] {
        shell
            .bus()
            .fire::<MenuItemActivated>(&ItemActivation::new(output_id, item))?;
    }
    for line in panels.render_all() {
        info!("{}", line);
    }

    for (index, name) in config.traces.iter().enumerate() {
        let experiment = trace_loader::synthesize_experiment(index, name)?;
        shell.bus().fire::<ExperimentClosed>(&experiment)?;
    }
    shell.bus().fire::<ExperimentSelected>(&None)?;
    log_status_changes(&mut status_events);

    info!("Shutting down {} panels", panels.len());
    panels.shutdown();

    let stats = shell.bus().stats();
    info!(
        "TraceShell done: {} signals fired, {} deliveries, {} handler failures",
        stats.fired, stats.delivered, stats.failed
    );
    Ok(())
}

fn log_status_changes(events: &mut broadcast::Receiver<StatusEvent>) {
    loop {
        match events.try_recv() {
            Ok(StatusEvent::Added(entry)) => {
                debug!("Status +{} [{}] {}", entry.key, entry.message.severity, entry.message.text)
            }
            Ok(StatusEvent::Removed(entry)) => debug!("Status -{}", entry.key),
            Err(TryRecvError::Lagged(skipped)) => warn!("Missed {} status changes", skipped),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}
