use serde::{Deserialize, Serialize};

use crate::clock::GameClock;
use crate::flags::FlagStore;
use crate::ids::DocumentId;
use crate::quests::QuestLog;

/// Evidence collected during an investigation, listed in the evidence log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: DocumentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl EvidenceRecord {
    pub fn new(id: impl Into<DocumentId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Everything the story remembers between scenes. Field names match the
/// browser save so older saves load unchanged; missing fields fall back to
/// their defaults.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    #[serde(default)]
    pub story_part: u32,
    #[serde(flatten)]
    pub quests: QuestLog,
    #[serde(default)]
    pub flags: FlagStore,
    #[serde(flatten)]
    pub clock: GameClock,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<EvidenceRecord>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starting state for a fresh session with a configured clock.
    pub fn with_clock(clock: GameClock) -> Self {
        Self {
            clock,
            ..Self::default()
        }
    }

    /// Records a piece of evidence unless one with the same id exists.
    pub fn add_evidence(&mut self, record: EvidenceRecord) -> bool {
        if self.has_evidence(record.id.as_str()) {
            return false;
        }
        self.evidence.push(record);
        true
    }

    pub fn has_evidence(&self, id: &str) -> bool {
        self.evidence.iter().any(|record| record.id.as_str() == id)
    }
}
