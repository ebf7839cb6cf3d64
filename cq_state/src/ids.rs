use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&$name> for $name {
            fn from(value: &$name) -> Self {
                value.clone()
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Name of a story flag (`visited_astron`, `usb_analyzed`, ...).
    FlagKey
);
string_id!(SceneId);
string_id!(ItemId);
string_id!(QuestId);
string_id!(ConversationId);
string_id!(DocumentId);
string_id!(PuzzleId);

impl FlagKey {
    /// Flag recording that a chat conversation has been opened at least once.
    pub fn chat_viewed(conversation: &ConversationId) -> Self {
        Self(format!("chat_{conversation}_viewed"))
    }

    /// Flag recording that a password puzzle has been solved.
    pub fn puzzle_solved(puzzle: &PuzzleId) -> Self {
        Self(format!("puzzle_{puzzle}_solved"))
    }

    pub fn visited(scene: &SceneId) -> Self {
        Self(format!("visited_{scene}"))
    }
}
