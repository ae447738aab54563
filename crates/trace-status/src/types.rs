//! Status message taxonomy.

use crate::error::StatusError;
use serde::{Deserialize, Serialize};

/// Where a status message comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCategory {
    /// Tied to the currently opened traces/experiment.
    TraceContext,
    /// Free-form message from the trace server.
    #[default]
    ServerMessage,
    /// Connection/health state of the trace server.
    ServerStatus,
}

/// Message severity, declared from most to least urgent so `Ord` sorts the
/// most urgent first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
    #[default]
    Info,
    Debug,
}

impl Severity {
    pub fn is_problem(&self) -> bool {
        matches!(self, Severity::Error | Severity::Warning)
    }
}

impl std::fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusCategory::TraceContext => write!(f, "TRACE_CONTEXT"),
            StatusCategory::ServerMessage => write!(f, "SERVER_MESSAGE"),
            StatusCategory::ServerStatus => write!(f, "SERVER_STATUS"),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Info => write!(f, "INFO"),
            Severity::Debug => write!(f, "DEBUG"),
        }
    }
}

/// One status line. Category and severity default to
/// `SERVER_MESSAGE` / `INFO` when not given.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub text: String,
    #[serde(default)]
    pub category: StatusCategory,
    #[serde(default)]
    pub severity: Severity,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: StatusCategory::default(),
            severity: Severity::default(),
        }
    }

    pub fn with_category(mut self, category: StatusCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Parse a message as sent by the trace server, e.g.
    /// `{"text": "Indexing", "severity": "DEBUG"}`.
    pub fn from_json(json: &str) -> Result<Self, StatusError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A message together with its registry key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub key: String,
    pub message: StatusMessage,
}

impl StatusEntry {
    pub fn new(key: impl Into<String>, message: StatusMessage) -> Self {
        Self {
            key: key.into(),
            message,
        }
    }
}
