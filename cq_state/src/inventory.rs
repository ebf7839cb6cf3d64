use serde::{Deserialize, Serialize};

use crate::ids::ItemId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            icon: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Name shown in notifications; falls back to the id for unnamed items.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}

/// Carried items in pickup order, unique by id.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: Vec<Item>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when an item with the same id is already carried.
    pub fn add(&mut self, item: Item) -> bool {
        if self.has(item.id.as_str()) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<Item> {
        let index = self.items.iter().position(|item| item.id.as_str() == id)?;
        Some(self.items.remove(index))
    }

    pub fn has(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id.as_str() == id)
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id.as_str() == id)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_pickups_are_ignored() {
        let mut inventory = Inventory::new();
        assert!(inventory.add(Item::new("usb_stick", "USB Stick")));
        assert!(!inventory.add(Item::new("usb_stick", "Another USB Stick")));
        assert!(inventory.add(Item::new("flipper_zero", "Flipper Zero")));

        let names: Vec<&str> = inventory.items().iter().map(|item| item.label()).collect();
        assert_eq!(names, vec!["USB Stick", "Flipper Zero"]);
    }

    #[test]
    fn removal_keeps_remaining_order() {
        let mut inventory = Inventory::new();
        inventory.add(Item::new("a", "A"));
        inventory.add(Item::new("b", "B"));
        inventory.add(Item::new("c", "C"));

        let removed = inventory.remove("b").expect("b was carried");
        assert_eq!(removed.name, "B");
        assert!(inventory.remove("b").is_none());
        assert!(!inventory.has("b"));

        let ids: Vec<&str> = inventory.items().iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn unnamed_item_label_uses_id() {
        let item = Item::new("sdr_dongle", "");
        assert_eq!(item.label(), "sdr_dongle");
    }

    #[test]
    fn browser_inventory_entries_deserialize() {
        let raw = r#"[{"id":"flipper_zero","name":"Flipper Zero","description":"Multi-tool","icon":"assets/images/icons/flipper-zero.svg"},{"id":"note","name":"Note"}]"#;
        let inventory: Inventory = serde_json::from_str(raw).expect("parse inventory");
        assert_eq!(inventory.len(), 2);
        assert_eq!(
            inventory.get("flipper_zero").and_then(|item| item.icon.as_deref()),
            Some("assets/images/icons/flipper-zero.svg")
        );
        assert_eq!(inventory.get("note").map(|item| item.description.as_str()), Some(""));
    }
}
