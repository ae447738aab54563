//! Context menu renderer.
//!
//! Output views contribute their menus over the bus. When the user activates
//! an entry, the renderer resolves which submenu holds it and fires the typed
//! click back to the owning view.

use crate::event_bus::ShellBus;
use crate::panel_manager::{PanelFactory, PanelInstance};
use crate::panels::lock;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use trace_signals::{
    ContextMenu, ContextMenuContributed, ContextMenuItemClicked, MenuItemClick, Properties,
    ScopedSubscription, Signal, Submenu,
};

/// Raw user activation of a menu entry, before it is resolved against the
/// contributed menu.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemActivation {
    pub output_id: String,
    pub item_id: String,
    pub props: Properties,
}

impl ItemActivation {
    pub fn new(output_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            output_id: output_id.into(),
            item_id: item_id.into(),
            props: Properties::new(),
        }
    }
}

/// Fired by the input layer when the user picks a menu entry.
#[derive(Clone, Copy, Debug)]
pub struct MenuItemActivated;

impl Signal for MenuItemActivated {
    type Payload = ItemActivation;
    const NAME: &'static str = "menu-item-activated";
}

pub struct ContextMenuFactory;

pub struct ContextMenuPanel {
    menus: Arc<Mutex<BTreeMap<String, ContextMenu>>>,
    _subscriptions: Vec<ScopedSubscription>,
}

impl PanelFactory for ContextMenuFactory {
    fn panel_name(&self) -> &str {
        "context-menu"
    }

    fn create_instance(&self, shell: &ShellBus) -> Result<Box<dyn PanelInstance>, Box<dyn Error>> {
        let menus: Arc<Mutex<BTreeMap<String, ContextMenu>>> = Arc::default();
        let bus = shell.bus();

        let contributed = {
            let menus = menus.clone();
            bus.subscribe_scoped::<ContextMenuContributed, _>(move |contribution| {
                debug!("Menu contributed for '{}'", contribution.output_id());
                lock(&menus).insert(
                    contribution.output_id().to_string(),
                    contribution.menu_items().clone(),
                );
                Ok(())
            })?
        };

        let activated = {
            let menus = menus.clone();
            let target = bus.clone();
            bus.subscribe_scoped::<MenuItemActivated, _>(move |activation| {
                let click = resolve_click(&lock(&menus), activation)?;
                target.fire::<ContextMenuItemClicked>(&click)?;
                Ok(())
            })?
        };

        Ok(Box::new(ContextMenuPanel {
            menus,
            _subscriptions: vec![contributed, activated],
        }))
    }
}

/// Turn an activation into a click, filling in the parent submenu id.
pub fn resolve_click(
    menus: &BTreeMap<String, ContextMenu>,
    activation: &ItemActivation,
) -> Result<MenuItemClick, Box<dyn Error + Send + Sync>> {
    let Some(menu) = menus.get(&activation.output_id) else {
        warn!("No menu contributed for '{}'", activation.output_id);
        return Err(format!("no menu for output '{}'", activation.output_id).into());
    };
    let Some((item, parent)) = menu.locate(&activation.item_id) else {
        return Err(format!(
            "output '{}' has no menu item '{}'",
            activation.output_id, activation.item_id
        )
        .into());
    };

    Ok(MenuItemClick::new(
        activation.output_id.clone(),
        item.id.clone(),
        activation.props.clone(),
        parent.map(str::to_string),
    )?)
}

impl PanelInstance for ContextMenuPanel {
    fn render(&self) -> String {
        let menus = lock(&self.menus);
        if menus.is_empty() {
            return "no menus".to_string();
        }
        menus
            .iter()
            .map(|(output, menu)| {
                let submenu_items: usize = menu.submenus.iter().map(count_items).sum();
                format!("{}: {} items", output, menu.items.len() + submenu_items)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn count_items(submenu: &Submenu) -> usize {
    submenu.items.len() + submenu.submenu.as_deref().map(count_items).unwrap_or(0)
}
