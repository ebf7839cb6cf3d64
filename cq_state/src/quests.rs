use serde::{Deserialize, Serialize};

use crate::ids::QuestId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Steps reported through [`QuestLog::update_progress`], without repeats.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub progress: Vec<String>,
}

impl Quest {
    pub fn new(id: impl Into<QuestId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            hint: None,
            progress: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}

/// Active quests in the order they were given, plus the ids of completed
/// ones. A quest id is never both active and completed.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestLog {
    #[serde(default)]
    pub active_quests: Vec<Quest>,
    #[serde(default)]
    pub quests_completed: Vec<QuestId>,
}

impl QuestLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a quest unless it is already active or already completed.
    pub fn add(&mut self, quest: Quest) -> bool {
        if self.has_quest(quest.id.as_str()) {
            return false;
        }
        self.active_quests.push(quest);
        true
    }

    /// Moves an active quest to the completed list and returns it.
    pub fn complete(&mut self, id: &str) -> Option<Quest> {
        let index = self
            .active_quests
            .iter()
            .position(|quest| quest.id.as_str() == id)?;
        let quest = self.active_quests.remove(index);
        self.quests_completed.push(quest.id.clone());
        Some(quest)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active(id).is_some()
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.quests_completed.iter().any(|done| done.as_str() == id)
    }

    pub fn has_quest(&self, id: &str) -> bool {
        self.is_active(id) || self.is_completed(id)
    }

    pub fn active(&self, id: &str) -> Option<&Quest> {
        self.active_quests
            .iter()
            .find(|quest| quest.id.as_str() == id)
    }

    /// Records a progress step on an active quest. Returns `false` for unknown
    /// quests and for steps that were already recorded.
    pub fn update_progress(&mut self, id: &str, step: impl Into<String>) -> bool {
        let Some(quest) = self
            .active_quests
            .iter_mut()
            .find(|quest| quest.id.as_str() == id)
        else {
            return false;
        };
        let step = step.into();
        if quest.progress.contains(&step) {
            return false;
        }
        quest.progress.push(step);
        true
    }

    pub fn progress(&self, id: &str) -> &[String] {
        self.active(id)
            .map(|quest| quest.progress.as_slice())
            .unwrap_or(&[])
    }
}
