//! Payloads carried by the built-in signal channels.
//!
//! Every payload is built once by the producer with all of its fields and is
//! read-only afterwards. Constructors that can break an invariant return a
//! `Result`.

use crate::error::PayloadError;
use crate::menu::ContextMenu;
use crate::property::{Properties, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Closed interval of trace timestamps (nanoseconds).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: i64,
    end: i64,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start: i64,
    end: i64,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = PayloadError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        TimeRange::new(raw.start, raw.end)
    }
}

impl TimeRange {
    pub fn new(start: i64, end: i64) -> Result<Self, PayloadError> {
        if start > end {
            return Err(PayloadError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn duration(&self) -> u64 {
        self.end.abs_diff(self.start)
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        (self.start..=self.end).contains(&timestamp)
    }
}

/// An opened set of traces analysed together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExperiment")]
pub struct Experiment {
    uuid: String,
    name: String,
    nb_events: u64,
    range: TimeRange,
    traces: Vec<String>,
}

#[derive(Deserialize)]
struct RawExperiment {
    uuid: String,
    name: String,
    nb_events: u64,
    range: TimeRange,
    #[serde(default)]
    traces: Vec<String>,
}

impl TryFrom<RawExperiment> for Experiment {
    type Error = PayloadError;

    fn try_from(raw: RawExperiment) -> Result<Self, Self::Error> {
        Experiment::new(raw.uuid, raw.name, raw.nb_events, raw.range, raw.traces)
    }
}

impl Experiment {
    pub fn new(
        uuid: impl Into<String>,
        name: impl Into<String>,
        nb_events: u64,
        range: TimeRange,
        traces: Vec<String>,
    ) -> Result<Self, PayloadError> {
        let uuid = uuid.into();
        if uuid.is_empty() {
            return Err(PayloadError::EmptyId("experiment uuid"));
        }
        Ok(Self {
            uuid,
            name: name.into(),
            nb_events,
            range,
            traces,
        })
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nb_events(&self) -> u64 {
        self.nb_events
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn traces(&self) -> &[String] {
        &self.traces
    }
}

/// Kind of view an output provider renders into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputType {
    #[default]
    TimeGraph,
    Xy,
    Table,
    DataTree,
}

/// Describes one analysis output available for an experiment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub output_type: OutputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl OutputDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, output_type: OutputType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            output_type,
            parent_id: None,
        }
    }
}

/// The set of available outputs for an experiment changed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysesChanged {
    experiment: Experiment,
    outputs: Vec<OutputDescriptor>,
}

impl AnalysesChanged {
    /// Takes a snapshot of `outputs`; later edits on the producer side do not
    /// reach subscribers.
    pub fn new(experiment: Experiment, outputs: &[OutputDescriptor]) -> Self {
        Self {
            experiment,
            outputs: outputs.to_vec(),
        }
    }

    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    pub fn outputs(&self) -> &[OutputDescriptor] {
        &self.outputs
    }

    pub fn find_output(&self, output_id: &str) -> Option<&OutputDescriptor> {
        self.outputs.iter().find(|o| o.id == output_id)
    }
}

/// An output view contributes entries to its context menu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMenuContribution")]
pub struct MenuContribution {
    output_id: String,
    menu: ContextMenu,
}

#[derive(Deserialize)]
struct RawMenuContribution {
    output_id: String,
    menu: ContextMenu,
}

impl TryFrom<RawMenuContribution> for MenuContribution {
    type Error = PayloadError;

    fn try_from(raw: RawMenuContribution) -> Result<Self, Self::Error> {
        MenuContribution::new(raw.output_id, raw.menu)
    }
}

impl MenuContribution {
    pub fn new(output_id: impl Into<String>, menu: ContextMenu) -> Result<Self, PayloadError> {
        let output_id = output_id.into();
        if output_id.is_empty() {
            return Err(PayloadError::EmptyId("output descriptor id"));
        }
        menu.validate()?;
        Ok(Self { output_id, menu })
    }

    pub fn output_id(&self) -> &str {
        &self.output_id
    }

    pub fn menu_items(&self) -> &ContextMenu {
        &self.menu
    }
}

/// A contributed context menu item was clicked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMenuItemClick")]
pub struct MenuItemClick {
    output_id: String,
    item_id: String,
    #[serde(default)]
    props: Properties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_menu_id: Option<String>,
}

#[derive(Deserialize)]
struct RawMenuItemClick {
    output_id: String,
    item_id: String,
    #[serde(default)]
    props: Properties,
    #[serde(default)]
    parent_menu_id: Option<String>,
}

impl TryFrom<RawMenuItemClick> for MenuItemClick {
    type Error = PayloadError;

    fn try_from(raw: RawMenuItemClick) -> Result<Self, Self::Error> {
        MenuItemClick::new(raw.output_id, raw.item_id, raw.props, raw.parent_menu_id)
    }
}

impl MenuItemClick {
    pub fn new(
        output_id: impl Into<String>,
        item_id: impl Into<String>,
        props: Properties,
        parent_menu_id: Option<String>,
    ) -> Result<Self, PayloadError> {
        let output_id = output_id.into();
        let item_id = item_id.into();
        if output_id.is_empty() {
            return Err(PayloadError::EmptyId("output descriptor id"));
        }
        if item_id.is_empty() {
            return Err(PayloadError::EmptyId("menu item id"));
        }
        Ok(Self {
            output_id,
            item_id,
            props,
            parent_menu_id,
        })
    }

    pub fn output_id(&self) -> &str {
        &self.output_id
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn props(&self) -> &Properties {
        &self.props
    }

    pub fn prop(&self, key: &str) -> Option<&PropertyValue> {
        self.props.get(key)
    }

    pub fn parent_menu_id(&self) -> Option<&str> {
        self.parent_menu_id.as_deref()
    }

    /// True when the item lives in the root menu rather than a submenu.
    pub fn is_root_item(&self) -> bool {
        self.parent_menu_id.is_none()
    }
}

/// Number of traces currently open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedTraces {
    count: u64,
}

impl OpenedTraces {
    pub fn new(count: i64) -> Result<Self, PayloadError> {
        let count = u64::try_from(count).map_err(|_| PayloadError::NegativeCount(count))?;
        Ok(Self { count })
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Hover content as key/value pairs, rendered in key order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tooltip {
    entries: BTreeMap<String, String>,
}

impl Tooltip {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Color theme of the host application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}
