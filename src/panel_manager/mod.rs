use crate::event_bus::ShellBus;
use log::{debug, info};
use std::error::Error;

pub mod factory;

pub use factory::PanelFactory;

/// Trait representing a live panel (mostly for keeping its subscriptions alive).
/// Dropping the instance tears down every handler it registered.
pub trait PanelInstance {
    /// One-line textual rendering of the panel state.
    fn render(&self) -> String;
    fn on_show(&self) {}
    fn on_hide(&self) {}
}

/// The main manager that coordinates all panels.
pub struct PanelManager {
    factories: Vec<Box<dyn PanelFactory>>,
    instances: Vec<(String, Box<dyn PanelInstance>)>,
}

impl Default for PanelManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelManager {
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
            instances: Vec::new(),
        }
    }

    pub fn register_factory<F: PanelFactory + 'static>(&mut self, factory: F) {
        self.factories.push(Box::new(factory));
    }

    /// Create one instance per registered factory, in registration order.
    pub fn start(&mut self, shell: &ShellBus) -> Result<(), Box<dyn Error>> {
        for factory in &self.factories {
            let name = factory.panel_name().to_string();
            let instance = factory.create_instance(shell)?;
            instance.on_show();
            debug!("Panel '{}' started", name);
            self.instances.push((name, instance));
        }
        info!("Started {} panels", self.instances.len());
        Ok(())
    }

    pub fn render_all(&self) -> Vec<String> {
        self.instances
            .iter()
            .map(|(name, panel)| format!("[{}] {}", name, panel.render()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Hide and drop every panel, newest first.
    pub fn shutdown(&mut self) {
        while let Some((name, panel)) = self.instances.pop() {
            panel.on_hide();
            debug!("Panel '{}' stopped", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use trace_signals::{BusConfig, Theme, ThemeChanged};

    struct ThemePanel {
        theme: Arc<Mutex<Theme>>,
        _sub: trace_signals::ScopedSubscription,
    }

    impl PanelInstance for ThemePanel {
        fn render(&self) -> String {
            self.theme.lock().unwrap().to_string()
        }
    }

    struct ThemeFactory;

    impl PanelFactory for ThemeFactory {
        fn panel_name(&self) -> &str {
            "theme"
        }

        fn create_instance(
            &self,
            shell: &ShellBus,
        ) -> Result<Box<dyn PanelInstance>, Box<dyn Error>> {
            let theme = Arc::new(Mutex::new(Theme::default()));
            let state = theme.clone();
            let sub = shell.bus().subscribe_scoped::<ThemeChanged, _>(move |t| {
                *state.lock().unwrap() = *t;
                Ok(())
            })?;
            Ok(Box::new(ThemePanel { theme, _sub: sub }))
        }
    }

    #[test]
    fn test_start_render_shutdown() {
        let shell = ShellBus::new(&BusConfig::default()).unwrap();
        let mut manager = PanelManager::new();
        manager.register_factory(ThemeFactory);
        manager.start(&shell).unwrap();

        shell.bus().fire::<ThemeChanged>(&Theme::Dark).unwrap();
        assert_eq!(manager.render_all(), vec!["[theme] dark"]);

        manager.shutdown();
        assert!(manager.is_empty());
        assert_eq!(shell.bus().subscriber_count::<ThemeChanged>(), 0);
    }
}
