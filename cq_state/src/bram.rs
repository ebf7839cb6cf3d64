//! Slot format of the Brammelquest engine. Scene, inventory and flags map
//! onto a CyberQuest [`SaveData`]; the sprite position has no counterpart
//! there and is supplied separately when converting back.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::flags::FlagStore;
use crate::ids::SceneId;
use crate::inventory::Inventory;
use crate::save::SaveData;
use crate::state::GameState;

/// Slot key the Brammelquest build writes to local storage.
pub const BRAM_SAVE_KEY: &str = "bram_save";

/// Canvas coordinates of the player sprite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpritePosition {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BramSave {
    pub scene: SceneId,
    pub player: SpritePosition,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub flags: FlagStore,
}

impl BramSave {
    pub fn new(scene: impl Into<SceneId>, player: SpritePosition) -> Self {
        Self {
            scene: scene.into(),
            player,
            inventory: Inventory::new(),
            flags: FlagStore::new(),
        }
    }

    /// Compact JSON, the way the browser stores the slot.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// CyberQuest save with the same scene, inventory and flags. The sprite
    /// position is dropped.
    pub fn into_save_data(self) -> SaveData {
        let game_state = GameState {
            flags: self.flags,
            ..GameState::default()
        };
        SaveData::new(Some(self.scene), self.inventory, game_state)
    }

    /// Returns `None` when the save has no scene to put the sprite in.
    pub fn from_save_data(save: &SaveData, player: SpritePosition) -> Option<Self> {
        Some(Self {
            scene: save.current_scene.clone()?,
            player,
            inventory: save.inventory.clone(),
            flags: save.game_state.flags.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::inventory::Item;

    const BROWSER_SLOT: &str = r#"{
        "scene": "backyard",
        "player": {"x": 400, "y": 350},
        "inventory": [
            {"id": "squeaky_bone", "name": "Squeaky Bone", "icon": "🦴", "description": "A squeaky toy bone."}
        ],
        "flags": {"squirrel_distracted": true, "treats_eaten": 2}
    }"#;

    #[test]
    fn reads_browser_slot() {
        let save = BramSave::from_json(BROWSER_SLOT).expect("parse bram slot");
        assert_eq!(save.scene.as_str(), "backyard");
        assert_eq!(save.player, SpritePosition { x: 400.0, y: 350.0 });
        assert!(save.inventory.has("squeaky_bone"));
        assert_eq!(
            save.inventory.items()[0].icon.as_deref(),
            Some("🦴")
        );
        assert!(save.flags.is_set("squirrel_distracted"));
        assert_eq!(save.flags.int("treats_eaten"), 2);
    }

    #[test]
    fn written_slot_keeps_the_browser_shape() {
        let mut save = BramSave::new("kitchen", SpritePosition { x: 120.0, y: 380.0 });
        save.inventory.add(Item::new("dog_treat", "Dog Treat"));
        save.flags.set("met_cat", true);

        let raw = save.to_json().expect("serialize bram slot");
        let value: Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(value["scene"], "kitchen");
        assert_eq!(value["player"]["x"], 120.0);
        assert_eq!(value["inventory"][0]["id"], "dog_treat");
        assert_eq!(value["flags"]["met_cat"], true);
        assert!(!raw.contains('\n'));
        assert_eq!(BramSave::from_json(&raw).expect("parse back"), save);
    }

    #[test]
    fn slot_without_a_sprite_position_is_rejected() {
        let err = BramSave::from_json(r#"{"scene": "kitchen"}"#).expect_err("must fail");
        assert!(matches!(err, StoreError::Json(_)));
    }

    #[test]
    fn converts_to_and_from_cyberquest_saves() {
        let save = BramSave::from_json(BROWSER_SLOT).expect("parse bram slot");
        let data = save.clone().into_save_data();
        assert_eq!(data.current_scene.as_ref().map(SceneId::as_str), Some("backyard"));
        assert!(data.inventory.has("squeaky_bone"));
        assert!(data.game_state.flags.is_set("squirrel_distracted"));
        assert_eq!(data.game_state.story_part, 0);
        assert!(data.timestamp.is_some());

        let back = BramSave::from_save_data(&data, save.player).expect("scene present");
        assert_eq!(back, save);
        assert!(BramSave::from_save_data(&SaveData::default(), save.player).is_none());
    }
}
