//! Trace loading service.
//!
//! Opens the configured traces on a background thread and posts the
//! resulting signals to the shell. A real trace server would be queried here;
//! experiments, event counts and analyses are synthesized instead.

use log::{error, info, warn};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use trace_signals::{
    AnalysesChanged, AvailableAnalysesChanged, Experiment, ExperimentOpened, ExperimentSelected,
    OpenedTraces, OpenedTracesUpdated, OutputDescriptor, OutputType, PayloadError, Signal,
    SignalError, SignalSender, TimeRange,
};
use trace_status::{ClearStatusMessage, PostStatusMessage, Severity, StatusEntry, StatusMessage};

/// Analyses every synthesized experiment offers: (id, name, type).
pub const ANALYSES: [(&str, &str, OutputType); 3] = [
    ("cpu-usage", "CPU Usage", OutputType::Xy),
    ("thread-status", "Thread Status", OutputType::TimeGraph),
    ("events", "Events Table", OutputType::Table),
];

/// Status key of the "loading..." message.
pub const LOADING_KEY: &str = "trace-loader";

/// What the trace server announces once reachable.
const SERVER_READY: &str = r#"{"text": "Trace server ready", "category": "SERVER_STATUS"}"#;

const POST_RETRIES: u32 = 20;

type LoaderError = Box<dyn std::error::Error + Send + Sync>;

/// Start the loader thread. The thread ends once every trace is open.
pub fn start_loader(sender: SignalSender, traces: Vec<String>, delay: Duration) -> JoinHandle<()> {
    info!("Starting trace loader ({} traces)...", traces.len());

    thread::spawn(move || {
        if let Err(e) = load_all(&sender, &traces, delay) {
            error!("Trace loader failed: {}", e);
            let failure = StatusMessage::new(format!("Loading traces failed: {}", e))
                .with_severity(Severity::Error);
            let _ = sender.post::<PostStatusMessage>(StatusEntry::new(LOADING_KEY, failure));
        }
    })
}

fn load_all(sender: &SignalSender, traces: &[String], delay: Duration) -> Result<(), LoaderError> {
    post::<PostStatusMessage>(
        sender,
        StatusEntry::new("server", StatusMessage::from_json(SERVER_READY)?),
    )?;
    post::<PostStatusMessage>(
        sender,
        StatusEntry::new(
            LOADING_KEY,
            StatusMessage::new(format!("Opening {} traces", traces.len()))
                .with_severity(Severity::Debug),
        ),
    )?;

    let outputs = analyses();
    let mut last = None;

    for (index, name) in traces.iter().enumerate() {
        thread::sleep(delay);
        let experiment = synthesize_experiment(index, name)?;
        info!("Opened trace '{}' ({} events)", name, experiment.nb_events());

        post::<ExperimentOpened>(sender, experiment.clone())?;
        post::<OpenedTracesUpdated>(sender, OpenedTraces::new(index as i64 + 1)?)?;
        let changed = AnalysesChanged::new(experiment.clone(), &outputs);
        post::<AvailableAnalysesChanged>(sender, changed)?;
        last = Some(experiment);
    }

    post::<ExperimentSelected>(sender, last)?;
    post::<ClearStatusMessage>(sender, LOADING_KEY.to_string())?;
    Ok(())
}

pub fn analyses() -> Vec<OutputDescriptor> {
    ANALYSES
        .iter()
        .map(|(id, name, kind)| OutputDescriptor::new(*id, *name, *kind))
        .collect()
}

/// Deterministic stand-in for what the server reports about a trace.
pub fn synthesize_experiment(index: usize, name: &str) -> Result<Experiment, PayloadError> {
    let nb_events = 10_000 * (name.len() as u64 + 1);
    let start = 1_000_000 * index as i64;
    let range = TimeRange::new(start, start + nb_events as i64 * 10)?;

    Experiment::new(
        format!("exp-{}-{}", index, name),
        name,
        nb_events,
        range,
        vec![name.to_string()],
    )
}

/// Post, waiting for the main thread to drain when the queue is full.
fn post<S>(sender: &SignalSender, payload: S::Payload) -> Result<(), SignalError>
where
    S: Signal,
    S::Payload: Clone,
{
    for _ in 0..POST_RETRIES {
        match sender.post::<S>(payload.clone()) {
            Err(SignalError::QueueFull) => thread::sleep(Duration::from_millis(10)),
            other => return other,
        }
    }
    warn!("Giving up on '{}' after {} retries", S::NAME, POST_RETRIES);
    Err(SignalError::QueueFull)
}
