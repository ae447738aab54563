//! Overview chart: lists the analyses of the current experiment, tracks the
//! selected time range and owns the context menu of every listed output.

use crate::event_bus::ShellBus;
use crate::panel_manager::{PanelFactory, PanelInstance};
use crate::panels::lock;
use log::info;
use std::error::Error;
use std::sync::{Arc, Mutex};
use trace_signals::{
    AvailableAnalysesChanged, ContextMenu, ContextMenuContributed, ContextMenuItemClicked,
    Experiment, ExperimentClosed, HandlerResult, MenuContribution, MenuItem, MenuItemClick,
    OutputDescriptor, ScopedSubscription, SelectionRangeUpdated, SignalBus, Submenu, TimeRange,
    Tooltip, TooltipUpdated,
};
use trace_status::{PostStatusMessage, StatusCategory, StatusEntry, StatusMessage};

pub struct OverviewFactory;

#[derive(Default)]
struct OverviewState {
    experiment: Option<Experiment>,
    outputs: Vec<OutputDescriptor>,
    selection: Option<TimeRange>,
}

pub struct Overview {
    state: Arc<Mutex<OverviewState>>,
    _subscriptions: Vec<ScopedSubscription>,
}

/// Menu contributed for every output listed in the overview.
pub fn output_menu() -> ContextMenu {
    let advanced = Submenu::new(
        "export-advanced",
        "Advanced",
        vec![MenuItem::new("export-raw", "Raw events")],
    );
    let export = Submenu::new(
        "export",
        "Export",
        vec![
            MenuItem::new("export-csv", "CSV"),
            MenuItem::new("export-json", "JSON"),
        ],
    )
    .with_submenu(advanced);

    ContextMenu::new(
        vec![MenuItem::new("reset-selection", "Reset selection")],
        vec![export],
    )
}

impl PanelFactory for OverviewFactory {
    fn panel_name(&self) -> &str {
        "overview"
    }

    fn create_instance(&self, shell: &ShellBus) -> Result<Box<dyn PanelInstance>, Box<dyn Error>> {
        let state = Arc::new(Mutex::new(OverviewState::default()));
        let bus = shell.bus();

        let analyses = {
            let state = state.clone();
            let target = bus.clone();
            bus.subscribe_scoped::<AvailableAnalysesChanged, _>(move |changed| {
                {
                    let mut state = lock(&state);
                    state.experiment = Some(changed.experiment().clone());
                    state.outputs = changed.outputs().to_vec();
                    state.selection = None;
                }
                for output in changed.outputs() {
                    let contribution = MenuContribution::new(output.id.clone(), output_menu())?;
                    target.fire::<ContextMenuContributed>(&contribution)?;
                }
                Ok(())
            })?
        };

        let selection = {
            let state = state.clone();
            let target = bus.clone();
            bus.subscribe_scoped::<SelectionRangeUpdated, _>(move |range| {
                lock(&state).selection = Some(*range);
                let tooltip = Tooltip::new([
                    ("start", range.start().to_string()),
                    ("end", range.end().to_string()),
                    ("duration", format!("{} ns", range.duration())),
                ]);
                target.fire::<TooltipUpdated>(&tooltip)?;
                Ok(())
            })?
        };

        let closed = {
            let state = state.clone();
            bus.subscribe_scoped::<ExperimentClosed, _>(move |experiment| {
                let mut state = lock(&state);
                if state.experiment.as_ref().map(Experiment::uuid) == Some(experiment.uuid()) {
                    *state = OverviewState::default();
                }
                Ok(())
            })?
        };

        let clicked = {
            let state = state.clone();
            let target = bus.clone();
            bus.subscribe_scoped::<ContextMenuItemClicked, _>(move |click| {
                handle_click(&state, &target, click)
            })?
        };

        Ok(Box::new(Overview {
            state,
            _subscriptions: vec![analyses, selection, closed, clicked],
        }))
    }
}

fn handle_click(
    state: &Mutex<OverviewState>,
    bus: &SignalBus,
    click: &MenuItemClick,
) -> HandlerResult {
    let (experiment, owned) = {
        let state = lock(state);
        let owned = state.outputs.iter().any(|o| o.id == click.output_id());
        (state.experiment.clone(), owned)
    };
    if !owned {
        return Ok(());
    }
    let Some(experiment) = experiment else {
        return Ok(());
    };

    match click.item_id() {
        "reset-selection" => {
            bus.fire::<SelectionRangeUpdated>(&experiment.range())?;
        }
        action @ ("export-csv" | "export-json" | "export-raw") => {
            let text = format!(
                "Exported {} of {} as {}",
                click.output_id(),
                experiment.name(),
                action.trim_start_matches("export-")
            );
            info!("{}", text);
            let entry = StatusEntry::new(
                format!("export:{}", click.output_id()),
                StatusMessage::new(text).with_category(StatusCategory::TraceContext),
            );
            bus.fire::<PostStatusMessage>(&entry)?;
        }
        other => return Err(format!("overview has no action '{}'", other).into()),
    }
    Ok(())
}

impl PanelInstance for Overview {
    fn render(&self) -> String {
        let state = lock(&self.state);
        let Some(experiment) = &state.experiment else {
            return "no experiment".to_string();
        };

        let outputs: Vec<&str> = state.outputs.iter().map(|o| o.name.as_str()).collect();
        let mut line = format!("{}: {}", experiment.name(), outputs.join(", "));
        if let Some(range) = state.selection {
            line.push_str(&format!(" [{}..{}]", range.start(), range.end()));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_signals::{AnalysesChanged, BusConfig, OutputType};

    fn experiment() -> Experiment {
        Experiment::new(
            "exp-0",
            "kernel",
            500,
            TimeRange::new(100, 900).unwrap(),
            vec!["kernel".to_string()],
        )
        .unwrap()
    }

    fn announce(shell: &ShellBus) {
        let outputs = vec![
            OutputDescriptor::new("cpu-usage", "CPU Usage", OutputType::Xy),
            OutputDescriptor::new("events", "Events", OutputType::Table),
        ];
        shell
            .bus()
            .fire::<AvailableAnalysesChanged>(&AnalysesChanged::new(experiment(), &outputs))
            .unwrap();
    }

    fn click(item: &str, parent: Option<&str>) -> MenuItemClick {
        MenuItemClick::new(
            "cpu-usage",
            item,
            Default::default(),
            parent.map(str::to_string),
        )
        .unwrap()
    }

    #[test]
    fn test_output_menu_is_valid() {
        assert!(MenuContribution::new("any", output_menu()).is_ok());
    }

    #[test]
    fn test_contributes_menu_per_output() {
        let shell = ShellBus::new(&BusConfig::default()).unwrap();
        let _panel = OverviewFactory.create_instance(&shell).unwrap();
        let contributed = Arc::new(Mutex::new(Vec::new()));
        {
            let contributed = contributed.clone();
            shell
                .bus()
                .subscribe::<ContextMenuContributed, _>(move |c| {
                    contributed.lock().unwrap().push(c.output_id().to_string());
                    Ok(())
                })
                .unwrap();
        }

        announce(&shell);
        assert_eq!(*contributed.lock().unwrap(), vec!["cpu-usage", "events"]);
    }

    #[test]
    fn test_reset_selection_and_tooltip() {
        let shell = ShellBus::new(&BusConfig::default()).unwrap();
        let panel = OverviewFactory.create_instance(&shell).unwrap();
        let tooltips = Arc::new(Mutex::new(Vec::new()));
        {
            let tooltips = tooltips.clone();
            shell
                .bus()
                .subscribe::<TooltipUpdated, _>(move |t| {
                    tooltips.lock().unwrap().push(t.get("duration").map(str::to_string));
                    Ok(())
                })
                .unwrap();
        }

        announce(&shell);
        assert_eq!(panel.render(), "kernel: CPU Usage, Events");

        shell
            .bus()
            .fire::<ContextMenuItemClicked>(&click("reset-selection", None))
            .unwrap();
        assert_eq!(panel.render(), "kernel: CPU Usage, Events [100..900]");
        assert_eq!(*tooltips.lock().unwrap(), vec![Some("800 ns".to_string())]);
    }

    #[test]
    fn test_export_posts_status_message() {
        let shell = ShellBus::new(&BusConfig::default()).unwrap();
        let _panel = OverviewFactory.create_instance(&shell).unwrap();
        announce(&shell);

        shell
            .bus()
            .fire::<ContextMenuItemClicked>(&click("export-raw", Some("export-advanced")))
            .unwrap();

        let msg = shell.status().get("export:cpu-usage").unwrap();
        assert_eq!(msg.text, "Exported cpu-usage of kernel as raw");
        assert_eq!(msg.category, StatusCategory::TraceContext);
    }

    #[test]
    fn test_closing_experiment_clears_overview() {
        let shell = ShellBus::new(&BusConfig::default()).unwrap();
        let panel = OverviewFactory.create_instance(&shell).unwrap();
        announce(&shell);

        shell.bus().fire::<ExperimentClosed>(&experiment()).unwrap();
        assert_eq!(panel.render(), "no experiment");
    }
}
