use std::{cell::RefCell, fmt, rc::Rc};

use cq_state::{ConversationId, DocumentId, PuzzleId};
use serde::Serialize;

use crate::characters::CharacterView;
use crate::chat::{ConversationView, MessageView};
use crate::dialogue::DialogueLineView;
use crate::evidence::RenderedDocument;
use crate::puzzle::{PuzzleFeedback, PuzzleView};
use crate::scene::SceneView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeDirection {
    Out,
    In,
}

/// Receives view models whenever something visible changes. Every method
/// defaults to doing nothing so front ends implement only what they draw.
pub trait Presenter {
    fn scene_fade(&self, _direction: FadeDirection, _duration_ms: u64) {}
    fn scene_shown(&self, _scene: &SceneView) {}
    fn dialogue_line(&self, _line: &DialogueLineView) {}
    fn dialogue_closed(&self) {}
    fn player_thought(&self, _text: &str) {}
    fn player_moved(&self, _x: f32, _y: f32) {}
    fn notification(&self, _message: &str, _duration_ms: u64) {}
    fn chat_opened(&self, _conversation: &ConversationView) {}
    fn chat_message(&self, _conversation: &ConversationId, _message: &MessageView) {}
    fn chat_typing(&self, _conversation: &ConversationId, _visible: bool) {}
    fn chat_closed(&self, _conversation: &ConversationId) {}
    fn document_shown(&self, _document: &RenderedDocument) {}
    fn document_closed(&self, _document: &DocumentId) {}
    fn puzzle_shown(&self, _puzzle: &PuzzleView) {}
    fn puzzle_feedback(&self, _puzzle: &PuzzleId, _feedback: &PuzzleFeedback) {}
    fn puzzle_closed(&self, _puzzle: &PuzzleId) {}
    fn character_shown(&self, _character: &CharacterView) {}
    fn characters_cleared(&self) {}
    fn inventory_changed(&self, _items: &[String]) {}
    fn quests_changed(&self, _active: &[String]) {}
    fn clock_changed(&self, _clock: &str) {}
}

impl fmt::Debug for dyn Presenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Presenter")
    }
}

/// Headless front end.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PresentationEvent {
    SceneFade {
        direction: FadeDirection,
        duration_ms: u64,
    },
    SceneShown {
        scene: SceneView,
    },
    DialogueLine {
        line: DialogueLineView,
    },
    DialogueClosed,
    PlayerThought {
        text: String,
    },
    PlayerMoved {
        x: f32,
        y: f32,
    },
    Notification {
        message: String,
        duration_ms: u64,
    },
    ChatOpened {
        conversation: ConversationView,
    },
    ChatMessage {
        conversation: ConversationId,
        message: MessageView,
    },
    ChatTyping {
        conversation: ConversationId,
        visible: bool,
    },
    ChatClosed {
        conversation: ConversationId,
    },
    DocumentShown {
        document: RenderedDocument,
    },
    DocumentClosed {
        document: DocumentId,
    },
    PuzzleShown {
        puzzle: PuzzleView,
    },
    PuzzleFeedback {
        puzzle: PuzzleId,
        feedback: PuzzleFeedback,
    },
    PuzzleClosed {
        puzzle: PuzzleId,
    },
    CharacterShown {
        character: CharacterView,
    },
    CharactersCleared,
    InventoryChanged {
        items: Vec<String>,
    },
    QuestsChanged {
        active: Vec<String>,
    },
    ClockChanged {
        clock: String,
    },
}

/// Presenter that keeps every event; shared through `Rc` so a test can hold
/// one clone while the game owns another.
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    events: Rc<RefCell<Vec<PresentationEvent>>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PresentationEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: PresentationEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn scene_fade(&self, direction: FadeDirection, duration_ms: u64) {
        self.push(PresentationEvent::SceneFade {
            direction,
            duration_ms,
        });
    }

    fn scene_shown(&self, scene: &SceneView) {
        self.push(PresentationEvent::SceneShown {
            scene: scene.clone(),
        });
    }

    fn dialogue_line(&self, line: &DialogueLineView) {
        self.push(PresentationEvent::DialogueLine { line: line.clone() });
    }

    fn dialogue_closed(&self) {
        self.push(PresentationEvent::DialogueClosed);
    }

    fn player_thought(&self, text: &str) {
        self.push(PresentationEvent::PlayerThought {
            text: text.to_string(),
        });
    }

    fn player_moved(&self, x: f32, y: f32) {
        self.push(PresentationEvent::PlayerMoved { x, y });
    }

    fn notification(&self, message: &str, duration_ms: u64) {
        self.push(PresentationEvent::Notification {
            message: message.to_string(),
            duration_ms,
        });
    }

    fn chat_opened(&self, conversation: &ConversationView) {
        self.push(PresentationEvent::ChatOpened {
            conversation: conversation.clone(),
        });
    }

    fn chat_message(&self, conversation: &ConversationId, message: &MessageView) {
        self.push(PresentationEvent::ChatMessage {
            conversation: conversation.clone(),
            message: message.clone(),
        });
    }

    fn chat_typing(&self, conversation: &ConversationId, visible: bool) {
        self.push(PresentationEvent::ChatTyping {
            conversation: conversation.clone(),
            visible,
        });
    }

    fn chat_closed(&self, conversation: &ConversationId) {
        self.push(PresentationEvent::ChatClosed {
            conversation: conversation.clone(),
        });
    }

    fn document_shown(&self, document: &RenderedDocument) {
        self.push(PresentationEvent::DocumentShown {
            document: document.clone(),
        });
    }

    fn document_closed(&self, document: &DocumentId) {
        self.push(PresentationEvent::DocumentClosed {
            document: document.clone(),
        });
    }

    fn puzzle_shown(&self, puzzle: &PuzzleView) {
        self.push(PresentationEvent::PuzzleShown {
            puzzle: puzzle.clone(),
        });
    }

    fn puzzle_feedback(&self, puzzle: &PuzzleId, feedback: &PuzzleFeedback) {
        self.push(PresentationEvent::PuzzleFeedback {
            puzzle: puzzle.clone(),
            feedback: feedback.clone(),
        });
    }

    fn puzzle_closed(&self, puzzle: &PuzzleId) {
        self.push(PresentationEvent::PuzzleClosed {
            puzzle: puzzle.clone(),
        });
    }

    fn character_shown(&self, character: &CharacterView) {
        self.push(PresentationEvent::CharacterShown {
            character: character.clone(),
        });
    }

    fn characters_cleared(&self) {
        self.push(PresentationEvent::CharactersCleared);
    }

    fn inventory_changed(&self, items: &[String]) {
        self.push(PresentationEvent::InventoryChanged {
            items: items.to_vec(),
        });
    }

    fn quests_changed(&self, active: &[String]) {
        self.push(PresentationEvent::QuestsChanged {
            active: active.to_vec(),
        });
    }

    fn clock_changed(&self, clock: &str) {
        self.push(PresentationEvent::ClockChanged {
            clock: clock.to_string(),
        });
    }
}
