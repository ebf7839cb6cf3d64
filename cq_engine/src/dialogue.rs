use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::Hook;

/// One line of a dialogue. An empty speaker is shown as the default speaker.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct DialogueLine {
    #[serde(default)]
    pub speaker: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait: Option<String>,
    /// Runs when the line is shown.
    #[serde(skip)]
    pub action: Option<Hook>,
}

impl fmt::Debug for DialogueLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogueLine")
            .field("speaker", &self.speaker)
            .field("text", &self.text)
            .field("portrait", &self.portrait)
            .field("action", &self.action.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

impl DialogueLine {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            portrait: None,
            action: None,
        }
    }

    /// Narration line (`*An image slowly forms...*`) with no explicit speaker.
    pub fn narration(text: impl Into<String>) -> Self {
        Self::new("", text)
    }

    pub fn with_portrait(mut self, portrait: impl Into<String>) -> Self {
        self.portrait = Some(portrait.into());
        self
    }

    pub fn with_action(mut self, action: Hook) -> Self {
        self.action = Some(action);
        self
    }
}

/// Builds a dialogue where one speaker says every line.
pub fn monologue<I, S>(speaker: &str, lines: I) -> Vec<DialogueLine>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    lines
        .into_iter()
        .map(|text| DialogueLine::new(speaker, text))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogueLineView {
    pub speaker: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portrait: Option<String>,
    pub index: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueStep {
    Line(DialogueLineView),
    Finished,
    Idle,
}

/// Ordered dialogue queue. Only one dialogue is active at a time.
#[derive(Debug, Default)]
pub struct DialogueRuntime {
    lines: Vec<DialogueLine>,
    cursor: usize,
    active: bool,
    token: u64,
}

impl DialogueRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was playing. An empty list finishes immediately.
    pub fn start(&mut self, lines: Vec<DialogueLine>, default_speaker: &str) -> DialogueStep {
        self.lines = lines;
        self.cursor = 0;
        self.token += 1;
        if self.lines.is_empty() {
            self.active = false;
            return DialogueStep::Finished;
        }
        self.active = true;
        self.current_view(default_speaker)
            .map(DialogueStep::Line)
            .unwrap_or(DialogueStep::Finished)
    }

    pub fn advance(&mut self, default_speaker: &str) -> DialogueStep {
        if !self.active {
            return DialogueStep::Idle;
        }
        self.cursor += 1;
        self.token += 1;
        match self.current_view(default_speaker) {
            Some(view) => DialogueStep::Line(view),
            None => {
                self.active = false;
                self.lines.clear();
                DialogueStep::Finished
            }
        }
    }

    /// Stops the dialogue without finishing it. Returns whether one was
    /// playing.
    pub fn end(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        self.lines.clear();
        self.cursor = 0;
        self.token += 1;
        was_active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Changes every time the visible line changes; lets delayed advances
    /// detect that they are stale.
    pub fn line_token(&self) -> u64 {
        self.token
    }

    pub fn current_line(&self) -> Option<&DialogueLine> {
        if self.active {
            self.lines.get(self.cursor)
        } else {
            None
        }
    }

    pub fn current_view(&self, default_speaker: &str) -> Option<DialogueLineView> {
        let line = self.current_line()?;
        let speaker = if line.speaker.is_empty() {
            default_speaker.to_string()
        } else {
            line.speaker.clone()
        };
        Some(DialogueLineView {
            speaker,
            text: line.text.clone(),
            portrait: line.portrait.clone(),
            index: self.cursor,
            total: self.lines.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<DialogueLine> {
        vec![
            DialogueLine::new("Ryan", "Wait! New SSTV transmission!"),
            DialogueLine::narration("*An image slowly forms, line by line...*"),
        ]
    }

    #[test]
    fn walks_lines_then_finishes() {
        let mut runtime = DialogueRuntime::new();
        let DialogueStep::Line(first) = runtime.start(lines(), "Ryan") else {
            panic!("expected first line");
        };
        assert_eq!(first.index, 0);
        assert_eq!(first.total, 2);
        assert!(runtime.is_active());

        let DialogueStep::Line(second) = runtime.advance("Ryan") else {
            panic!("expected second line");
        };
        assert_eq!(second.speaker, "Ryan");
        assert_eq!(second.text, "*An image slowly forms, line by line...*");

        assert_eq!(runtime.advance("Ryan"), DialogueStep::Finished);
        assert!(!runtime.is_active());
        assert_eq!(runtime.advance("Ryan"), DialogueStep::Idle);
    }

    #[test]
    fn empty_dialogue_finishes_at_once() {
        let mut runtime = DialogueRuntime::new();
        assert_eq!(runtime.start(Vec::new(), "Ryan"), DialogueStep::Finished);
        assert!(!runtime.is_active());
    }

    #[test]
    fn empty_speaker_uses_default() {
        let mut runtime = DialogueRuntime::new();
        runtime.start(vec![DialogueLine::narration("...")], "Narrator");
        let view = runtime.current_view("Narrator").expect("line visible");
        assert_eq!(view.speaker, "Narrator");
    }

    #[test]
    fn token_changes_with_every_line_and_on_end() {
        let mut runtime = DialogueRuntime::new();
        runtime.start(lines(), "Ryan");
        let shown = runtime.line_token();
        runtime.advance("Ryan");
        let second = runtime.line_token();
        assert_ne!(shown, second);
        assert!(runtime.end());
        assert_ne!(second, runtime.line_token());
        assert!(!runtime.end());
    }

    #[test]
    fn monologue_assigns_one_speaker() {
        let lines = monologue("Eva", ["Hello.", "It's me."]);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.speaker == "Eva"));
    }
}
