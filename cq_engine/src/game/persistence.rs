use cq_state::{GameState, SaveData, StoreError};

use super::Game;
use crate::error::EngineError;
use crate::scene::Transition;

impl Game {
    /// Snapshot of everything a save slot holds, stamped with the current
    /// wall-clock time.
    pub fn snapshot(&self) -> SaveData {
        SaveData::new(
            self.current_scene.clone(),
            self.inventory.clone(),
            self.state.clone(),
        )
    }

    pub fn save_game(&mut self) -> Result<(), EngineError> {
        let key = self.config.save_key.clone();
        let result = self
            .snapshot()
            .to_json_pretty()
            .and_then(|raw| self.storage.write(&key, &raw));
        match result {
            Ok(()) => {
                self.record(format!("game.save {key}"));
                self.show_notification("Game saved!");
                Ok(())
            }
            Err(err) => {
                log::error!("failed to save game: {err}");
                self.show_notification("Failed to save game.");
                Err(err.into())
            }
        }
    }

    /// Restores inventory and story state from the save slot and re-enters
    /// the saved scene. Fields missing from the save take the configured
    /// starting values. Refused while a scene change is still fading.
    pub fn load_game(&mut self) -> Result<(), EngineError> {
        let key = self.config.save_key.clone();
        let data = match self.read_save(&key) {
            Ok(Some(data)) => data,
            Ok(None) => {
                self.show_notification("No save file found.");
                return Err(EngineError::NoSave(key));
            }
            Err(err) => {
                log::error!("failed to load game: {err}");
                self.show_notification("Failed to load saved game. Save data may be corrupted.");
                return Err(err.into());
            }
        };

        if let Some(scene) = data.current_scene.as_ref().filter(|_| self.scene_loading) {
            log::warn!("cannot load game while a scene change is in flight");
            return Err(EngineError::SceneLoadInProgress(scene.clone()));
        }

        self.inventory = data.inventory;
        self.state = data.game_state;
        self.record(format!("game.load {key}"));
        self.present_inventory();
        self.present_quests();
        self.presenter.clock_changed(&self.state.clock.to_string());
        if let Some(scene) = data.current_scene {
            if let Err(err) = self.load_scene(scene.as_str(), Transition::Fade) {
                log::warn!("saved scene could not be entered: {err}");
            }
        }
        self.show_notification("Game loaded!");
        Ok(())
    }

    pub fn has_save(&self) -> bool {
        matches!(self.storage.read(&self.config.save_key), Ok(Some(_)))
    }

    fn read_save(&self, key: &str) -> Result<Option<SaveData>, StoreError> {
        let defaults = GameState::with_clock(self.config.starting_clock());
        match self.storage.read(key)? {
            Some(raw) => SaveData::from_json_over(&raw, &defaults).map(Some),
            None => Ok(None),
        }
    }
}
