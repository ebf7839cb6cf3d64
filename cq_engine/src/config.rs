use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use cq_state::{ClockTime, GameClock, DEFAULT_SAVE_KEY};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Optional automatic pacing for dialogue lines. When enabled each line
/// advances on its own after it has been "typed" and read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialoguePacing {
    pub auto_advance: bool,
    pub read_pause_ms: u64,
}

impl Default for DialoguePacing {
    fn default() -> Self {
        Self {
            auto_advance: false,
            read_pause_ms: 1500,
        }
    }
}

/// Engine timings and defaults. Every field can be omitted from a config
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub transition_ms: u64,
    pub scene_change_delay_ms: u64,
    pub notification_ms: u64,
    pub typewriter_ms_per_char: u64,
    pub thought_ms: u64,
    pub idle_thought_interval_ms: u64,
    pub default_time: ClockTime,
    pub default_day: u32,
    pub default_speaker: String,
    pub player_name: String,
    pub puzzle_success_delay_ms: u64,
    pub puzzle_failure_delay_ms: u64,
    pub section_poll_ms: u64,
    pub section_pause_ms: u64,
    pub dialogue: DialoguePacing,
    pub save_key: String,
    /// Lower-case speaker name to portrait path.
    pub portraits: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transition_ms: 500,
            scene_change_delay_ms: 300,
            notification_ms: 3000,
            typewriter_ms_per_char: 30,
            thought_ms: 4000,
            idle_thought_interval_ms: 15_000,
            default_time: ClockTime::default(),
            default_day: 1,
            default_speaker: "Ryan".to_string(),
            player_name: "Ryan".to_string(),
            puzzle_success_delay_ms: 1500,
            puzzle_failure_delay_ms: 2000,
            section_poll_ms: 250,
            section_pause_ms: 1200,
            dialogue: DialoguePacing::default(),
            save_key: DEFAULT_SAVE_KEY.to_string(),
            portraits: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, EngineError> {
        let raw = fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| EngineError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Clock a fresh session starts with.
    pub fn starting_clock(&self) -> GameClock {
        GameClock::new(self.default_time, self.default_day)
    }

    pub fn portrait_for(&self, speaker: &str) -> Option<&str> {
        self.portraits
            .get(&speaker.to_lowercase())
            .map(String::as_str)
    }

    /// Time a line stays on screen before auto-advance moves on.
    pub fn line_display_ms(&self, text: &str) -> u64 {
        let chars = text.chars().count() as u64;
        chars
            .saturating_mul(self.typewriter_ms_per_char)
            .saturating_add(self.dialogue.read_pause_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timings() {
        let config = EngineConfig::default();
        assert_eq!(config.transition_ms, 500);
        assert_eq!(config.scene_change_delay_ms, 300);
        assert_eq!(config.notification_ms, 3000);
        assert_eq!(config.typewriter_ms_per_char, 30);
        assert_eq!(config.starting_clock().to_string(), "Day 1 08:00");
        assert_eq!(config.default_speaker, "Ryan");
        assert_eq!(config.save_key, "cyberquest_save");
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{"transition_ms": 0, "default_time": "22:30", "dialogue": {"auto_advance": true}}"#,
        )
        .expect("parse config");
        assert_eq!(config.transition_ms, 0);
        assert_eq!(config.default_time.to_string(), "22:30");
        assert!(config.dialogue.auto_advance);
        assert_eq!(config.dialogue.read_pause_ms, 1500);
        assert_eq!(config.section_pause_ms, 1200);
    }

    #[test]
    fn line_display_time_counts_characters() {
        let config = EngineConfig::default();
        assert_eq!(config.line_display_ms("héllo"), 5 * 30 + 1500);
    }

    #[test]
    fn portraits_are_matched_case_insensitively() {
        let mut config = EngineConfig::default();
        config
            .portraits
            .insert("eva".to_string(), "assets/images/characters/eva_southpark.svg".to_string());
        assert_eq!(
            config.portrait_for("Eva"),
            Some("assets/images/characters/eva_southpark.svg")
        );
        assert_eq!(config.portrait_for("Volkov"), None);
    }
}
