//! Keeps TRACE_CONTEXT status messages in step with the open experiments.

use crate::event_bus::ShellBus;
use log::{debug, info};
use trace_signals::{
    Experiment, ExperimentClosed, ExperimentOpened, ExperimentSelected, ScopedSubscription,
    SignalError,
};
use trace_status::{StatusCategory, StatusMessage};

pub struct TraceContext {
    _subscriptions: Vec<ScopedSubscription>,
}

pub fn status_key(experiment: &Experiment) -> String {
    format!("exp:{}", experiment.uuid())
}

impl TraceContext {
    pub fn start(shell: &ShellBus) -> Result<Self, SignalError> {
        info!("Starting trace context tracker...");
        let bus = shell.bus();

        let opened = {
            let status = shell.status().clone();
            bus.subscribe_scoped::<ExperimentOpened, _>(move |experiment| {
                let text = format!(
                    "Opened {} ({} events)",
                    experiment.name(),
                    experiment.nb_events()
                );
                status.add_status_message(
                    status_key(experiment),
                    StatusMessage::new(text).with_category(StatusCategory::TraceContext),
                );
                Ok(())
            })?
        };

        let closed = {
            let status = shell.status().clone();
            bus.subscribe_scoped::<ExperimentClosed, _>(move |experiment| {
                status.remove_status_message(&status_key(experiment));
                Ok(())
            })?
        };

        let selected = {
            let status = shell.status().clone();
            bus.subscribe_scoped::<ExperimentSelected, _>(move |experiment| {
                if experiment.is_none() {
                    let cleared = status.clear_category(StatusCategory::TraceContext);
                    debug!("Selection cleared, dropped {} trace messages", cleared);
                }
                Ok(())
            })?
        };

        Ok(Self {
            _subscriptions: vec![opened, closed, selected],
        })
    }
}
