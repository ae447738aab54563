use crate::event_bus::ShellBus;
use crate::panel_manager::PanelInstance;
use std::error::Error;

/// Trait that defines a factory for creating a specific type of panel (e.g., StatusBar, Overview).
pub trait PanelFactory {
    /// Unique identifier for this panel type.
    fn panel_name(&self) -> &str;

    /// Initializes a panel instance.
    /// This is where the panel attaches its handlers to the shell bus.
    fn create_instance(&self, shell: &ShellBus) -> Result<Box<dyn PanelInstance>, Box<dyn Error>>;
}
