use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::ids::SceneId;
use crate::inventory::Inventory;
use crate::state::GameState;

/// Slot key the browser build writes to local storage.
pub const DEFAULT_SAVE_KEY: &str = "cyberquest_save";

/// One save slot: where the player stands, what they carry and the story
/// state.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    #[serde(default)]
    pub current_scene: Option<SceneId>,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub game_state: GameState,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl SaveData {
    pub fn new(
        current_scene: Option<SceneId>,
        inventory: Inventory,
        game_state: GameState,
    ) -> Self {
        Self {
            current_scene,
            inventory,
            game_state,
            timestamp: Some(Utc::now()),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Parses a save whose `gameState` is laid over `defaults` key by key,
    /// so a slot written without a clock or quests picks up the caller's
    /// starting values instead of the built-in ones.
    pub fn from_json_over(raw: &str, defaults: &GameState) -> Result<Self, StoreError> {
        let mut value: Value = serde_json::from_str(raw)?;
        let mut state = serde_json::to_value(defaults)?;
        if let (Some(base), Some(saved)) = (
            state.as_object_mut(),
            value.get("gameState").and_then(Value::as_object),
        ) {
            for (key, field) in saved {
                base.insert(key.clone(), field.clone());
            }
        }
        if let Some(object) = value.as_object_mut() {
            object.insert("gameState".to_string(), state);
        }
        Ok(serde_json::from_value(value)?)
    }
}
