//! Persistent story state shared by the CyberQuest engine and its tools.
//!
//! Everything here is plain data: flags, inventory, quests, the in-game
//! clock and the save format. Runtime behaviour (timers, dialogue, overlays)
//! lives in `cq_engine`.

pub mod bram;
pub mod clock;
pub mod error;
pub mod flags;
pub mod ids;
pub mod inventory;
pub mod quests;
pub mod save;
pub mod state;
pub mod storage;

pub use bram::{BramSave, SpritePosition, BRAM_SAVE_KEY};
pub use clock::{ClockTime, GameClock};
pub use error::StoreError;
pub use flags::{FlagStore, FlagValue};
pub use ids::{ConversationId, DocumentId, FlagKey, ItemId, PuzzleId, QuestId, SceneId};
pub use inventory::{Inventory, Item};
pub use quests::{Quest, QuestLog};
pub use save::{SaveData, DEFAULT_SAVE_KEY};
pub use state::{EvidenceRecord, GameState};
pub use storage::{DirectoryStorage, MemoryStorage, SaveStorage};
