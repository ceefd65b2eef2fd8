//! Toolbar button registry.
//!
//! The engine does not render anything; it only maintains the declarative
//! list of buttons a host UI should draw, in a stable order. Buttons are
//! keyed by the command they trigger, so re-registering a command replaces
//! its button in place.

use serde::{Deserialize, Serialize};

/// One entry of a button's dropdown menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownItem {
    pub label: String,
    /// Payload passed to the button's command when this item is chosen.
    pub value: String,
}

/// A declarative toolbar button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolbarButton {
    /// Command executed on activation; also the registry key.
    pub command: String,
    /// Icon identifier for the host to resolve.
    pub icon: String,
    /// Buttons with the same group render together.
    pub group: u32,
    /// Position within the group.
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropdown: Option<Vec<DropdownItem>>,
}

/// Ordered collection of registered buttons.
#[derive(Debug, Clone, Default)]
pub struct ToolbarRegistry {
    buttons: Vec<ToolbarButton>,
}

impl ToolbarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a button, replacing any existing button for the same
    /// command.
    pub fn register(&mut self, button: ToolbarButton) {
        match self.buttons.iter_mut().find(|b| b.command == button.command) {
            Some(existing) => *existing = button,
            None => self.buttons.push(button),
        }
    }

    pub fn remove(&mut self, command: &str) -> bool {
        let before = self.buttons.len();
        self.buttons.retain(|b| b.command != command);
        self.buttons.len() != before
    }

    /// Buttons sorted by (group, order); registration order breaks ties.
    pub fn buttons(&self) -> Vec<&ToolbarButton> {
        let mut out: Vec<&ToolbarButton> = self.buttons.iter().collect();
        out.sort_by_key(|b| (b.group, b.order));
        out
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn clear(&mut self) {
        self.buttons.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(command: &str, group: u32, order: u32) -> ToolbarButton {
        ToolbarButton {
            command: command.to_string(),
            icon: format!("icon-{command}"),
            group,
            order,
            dropdown: None,
        }
    }

    #[test]
    fn test_sorted_by_group_then_order() {
        let mut registry = ToolbarRegistry::new();
        registry.register(button("undo", 2, 0));
        registry.register(button("italic", 1, 1));
        registry.register(button("bold", 1, 0));
        let names: Vec<&str> = registry
            .buttons()
            .iter()
            .map(|b| b.command.as_str())
            .collect();
        assert_eq!(names, vec!["bold", "italic", "undo"]);
    }

    #[test]
    fn test_reregister_replaces() {
        let mut registry = ToolbarRegistry::new();
        registry.register(button("bold", 1, 0));
        registry.register(ToolbarButton {
            icon: "icon-bold-alt".to_string(),
            ..button("bold", 1, 0)
        });
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.buttons()[0].icon, "icon-bold-alt");
    }

    #[test]
    fn test_remove() {
        let mut registry = ToolbarRegistry::new();
        registry.register(button("bold", 1, 0));
        assert!(registry.remove("bold"));
        assert!(!registry.remove("bold"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_dropdown_serde() {
        let button = ToolbarButton {
            command: "formatBlock".to_string(),
            icon: "icon-heading".to_string(),
            group: 0,
            order: 0,
            dropdown: Some(vec![DropdownItem {
                label: "Heading 1".to_string(),
                value: "h1".to_string(),
            }]),
        };
        let json = serde_json::to_string(&button).unwrap();
        let back: ToolbarButton = serde_json::from_str(&json).unwrap();
        assert_eq!(back, button);
    }
}
