//! Context menu model contributed by output views.
//!
//! Menus are shallow: a root-level submenu may hold one nested submenu, and
//! that one may not nest further. Deeper chains are rejected when the
//! contribution payload is built.

use crate::error::PayloadError;
use serde::{Deserialize, Serialize};

/// Maximum submenu chain length, counting the root-level submenu.
pub const MAX_SUBMENU_DEPTH: usize = 2;

/// A clickable menu entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
}

impl MenuItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A labelled group of items with at most one child submenu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submenu {
    pub id: String,
    pub label: String,
    pub items: Vec<MenuItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submenu: Option<Box<Submenu>>,
}

impl Submenu {
    pub fn new(id: impl Into<String>, label: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            items,
            submenu: None,
        }
    }

    /// Attach (or replace) the single child submenu.
    pub fn with_submenu(mut self, child: Submenu) -> Self {
        self.submenu = Some(Box::new(child));
        self
    }

    /// Length of the submenu chain starting here (1 for a leaf submenu).
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.submenu.as_deref();
        while let Some(child) = current {
            depth += 1;
            current = child.submenu.as_deref();
        }
        depth
    }

    /// Find an item by id in this submenu or its child.
    pub fn find_item(&self, item_id: &str) -> Option<&MenuItem> {
        self.items
            .iter()
            .find(|item| item.id == item_id)
            .or_else(|| self.submenu.as_deref().and_then(|s| s.find_item(item_id)))
    }

    fn validate(&self) -> Result<(), PayloadError> {
        let depth = self.depth();
        if depth > MAX_SUBMENU_DEPTH {
            return Err(PayloadError::SubmenuTooDeep {
                id: self.id.clone(),
                depth,
            });
        }

        let mut current = Some(self);
        while let Some(sub) = current {
            if sub.id.is_empty() {
                return Err(PayloadError::EmptyId("submenu id"));
            }
            check_item_ids(&sub.items)?;
            current = sub.submenu.as_deref();
        }
        Ok(())
    }
}

fn check_item_ids(items: &[MenuItem]) -> Result<(), PayloadError> {
    if items.iter().any(|i| i.id.is_empty()) {
        return Err(PayloadError::EmptyId("menu item id"));
    }
    Ok(())
}

/// Root menu: flat items followed by submenus.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMenu {
    #[serde(default)]
    pub items: Vec<MenuItem>,
    #[serde(default)]
    pub submenus: Vec<Submenu>,
}

impl ContextMenu {
    pub fn new(items: Vec<MenuItem>, submenus: Vec<Submenu>) -> Self {
        Self { items, submenus }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.submenus.is_empty()
    }

    /// Locate an item and the id of the submenu holding it.
    /// `Some((item, None))` means the item sits at the root.
    pub fn locate(&self, item_id: &str) -> Option<(&MenuItem, Option<&str>)> {
        if let Some(item) = self.items.iter().find(|i| i.id == item_id) {
            return Some((item, None));
        }
        for root in &self.submenus {
            let mut current = Some(root);
            while let Some(sub) = current {
                if let Some(item) = sub.items.iter().find(|i| i.id == item_id) {
                    return Some((item, Some(sub.id.as_str())));
                }
                current = sub.submenu.as_deref();
            }
        }
        None
    }

    pub(crate) fn validate(&self) -> Result<(), PayloadError> {
        check_item_ids(&self.items)?;
        self.submenus.iter().try_for_each(Submenu::validate)
    }
}
