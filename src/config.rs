//! Shell configuration, stored as JSON.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use trace_signals::BusConfig;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// How often the main loop drains queued signals.
    pub poll_interval_ms: u64,
    /// Simulated delay between two traces being opened.
    pub load_delay_ms: u64,
    /// Traces opened at startup.
    pub traces: Vec<String>,
    /// Also show DEBUG status messages in the status bar.
    pub show_debug_messages: bool,
    pub bus: BusConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            load_delay_ms: 100,
            traces: vec!["kernel".to_string(), "ust".to_string()],
            show_debug_messages: false,
            bus: BusConfig::default(),
        }
    }
}

impl ShellConfig {
    /// `$XDG_CONFIG_HOME/traceshell/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("traceshell").join("config.json"))
    }

    /// Load from config file, or return default if missing or malformed.
    pub fn load(path: &Path) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!("Ignoring malformed config {:?}: {}", path, e);
            Self::default()
        })
    }

    /// Save to config file
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("traceshell-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = ShellConfig::load(&temp_path("does-not-exist.json"));
        assert_eq!(config, ShellConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("saved/config.json");
        let config = ShellConfig {
            traces: vec!["lttng".to_string()],
            show_debug_messages: true,
            ..ShellConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(ShellConfig::load(&path), config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_partial_and_malformed_files() {
        let path = temp_path("partial.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        fs::write(&path, r#"{"poll_interval_ms": 5, "bus": {"queue_capacity": 4}}"#).unwrap();
        let config = ShellConfig::load(&path);
        assert_eq!(config.poll_interval_ms, 5);
        assert_eq!(config.bus.queue_capacity, 4);
        assert_eq!(config.traces, ShellConfig::default().traces);

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(ShellConfig::load(&path), ShellConfig::default());
        let _ = fs::remove_file(&path);
    }
}
