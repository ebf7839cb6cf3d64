//! Built-in stories used by the command-line host and the integration
//! tests, plus a small scripted-input format for driving them headless.

mod long_night;
mod mancave;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::game::{Game, Key};
use crate::scene::Transition;

pub use long_night::COMPLETION_FLAGS as LONG_NIGHT_FLAGS;

/// Dialogue lines skipped by a single `skip_dialogue` step before giving up.
const MAX_SKIPPED_LINES: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Story {
    /// Ryan's mancave with the SSTV burst and the wall safe
    Mancave,
    /// The final night sequence that hands over to the debrief
    LongNight,
}

impl Story {
    pub fn install(self, game: &mut Game) {
        match self {
            Story::Mancave => mancave::install(game),
            Story::LongNight => long_night::install(game),
        }
    }

    pub fn entry_scene(self) -> &'static str {
        match self {
            Story::Mancave => mancave::ENTRY_SCENE,
            Story::LongNight => long_night::ENTRY_SCENE,
        }
    }

    /// Input script that plays the story through to its end.
    pub fn script(self) -> Vec<ScriptStep> {
        match self {
            Story::Mancave => mancave::script(),
            Story::LongNight => long_night::script(),
        }
    }
}

/// One player input (or a pause) in a scripted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    Enter {
        scene: String,
        #[serde(default)]
        instant: bool,
    },
    Click {
        hotspot: String,
    },
    Key {
        key: Key,
    },
    SkipDialogue,
    Answer {
        text: String,
    },
    Reply {
        text: String,
    },
    NextPage,
    /// Turns the dial of an open frequency puzzle.
    Tune {
        delta_mhz: f64,
    },
    UseItem {
        item: String,
    },
    Wait {
        ms: u64,
    },
    Save,
    Load,
}

/// Applies one step. Only scene and save failures are errors; inputs the
/// game ignores (a blocked click, an answer with no puzzle open) are logged.
pub fn run_step(game: &mut Game, step: &ScriptStep) -> Result<(), EngineError> {
    log::debug!("script step {step:?}");
    match step {
        ScriptStep::Enter { scene, instant } => {
            let transition = if *instant {
                Transition::Instant
            } else {
                Transition::Fade
            };
            game.load_scene(scene, transition)?;
        }
        ScriptStep::Click { hotspot } => {
            let outcome = game.click_hotspot(hotspot);
            log::info!("click {hotspot}: {outcome:?}");
        }
        ScriptStep::Key { key } => {
            game.handle_key(*key);
        }
        ScriptStep::SkipDialogue => {
            let mut skipped = 0;
            while game.is_dialogue_active() && skipped < MAX_SKIPPED_LINES {
                game.advance_dialogue();
                skipped += 1;
            }
            if game.is_dialogue_active() {
                log::warn!("dialogue still running after {skipped} lines");
            }
        }
        ScriptStep::Answer { text } => {
            let outcome = game.submit_puzzle_answer(text);
            log::info!("answer {text:?}: {outcome:?}");
        }
        ScriptStep::Reply { text } => {
            if !game.send_reply(text) {
                log::warn!("reply {text:?} was not sent");
            }
        }
        ScriptStep::NextPage => {
            game.next_page();
        }
        ScriptStep::Tune { delta_mhz } => {
            if game.tune_puzzle(*delta_mhz).is_none() {
                log::warn!("tune {delta_mhz}: no dial is showing");
            }
        }
        ScriptStep::UseItem { item } => {
            game.use_item(item);
        }
        ScriptStep::Wait { ms } => {
            game.advance(*ms);
        }
        ScriptStep::Save => game.save_game()?,
        ScriptStep::Load => game.load_game()?,
    }
    Ok(())
}

pub fn run_script(game: &mut Game, steps: &[ScriptStep]) -> Result<(), EngineError> {
    for step in steps {
        run_step(game, step)?;
    }
    Ok(())
}
