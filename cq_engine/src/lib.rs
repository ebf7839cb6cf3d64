//! Headless runtime for CyberQuest-style point-and-click stories.
//!
//! [`Game`] owns the story state from `cq_state` together with the scene
//! registry, a virtual-time scheduler and the overlay components (dialogue,
//! chat, evidence viewer, puzzles). Rendering is left to a
//! [`Presenter`]; the engine only tells it what to show.

pub mod characters;
pub mod chat;
pub mod cli;
pub mod config;
pub mod demo;
pub mod dialogue;
pub mod error;
pub mod evidence;
pub mod game;
pub mod hotspot;
pub mod player;
pub mod presenter;
pub mod puzzle;
pub mod runtime;
pub mod scene;
pub mod scheduler;
pub mod sequence;

pub use chat::{ChatKind, ChatMessage, ConversationConfig};
pub use config::EngineConfig;
pub use dialogue::DialogueLine;
pub use error::EngineError;
pub use evidence::{DocumentKind, EvidenceDocument};
pub use game::{Callback, Game, Hook, Key};
pub use hotspot::{ClickOutcome, Condition, Hotspot, Rect};
pub use presenter::{NullPresenter, PresentationEvent, Presenter, RecordingPresenter};
pub use puzzle::{FailureKind, FrequencyDial, PuzzleConfig, PuzzleKind, SubmitOutcome};
pub use scene::{Scene, SceneDescriptor, ScriptedScene, Transition};
pub use scheduler::{ScopeId, TimerHandle};
pub use sequence::SectionSequence;
