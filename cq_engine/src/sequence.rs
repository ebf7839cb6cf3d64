use std::collections::VecDeque;
use std::fmt;
use std::ops::ControlFlow;

use crate::dialogue::DialogueLine;
use crate::game::{Callback, Game};

/// Plays dialogue sections back to back. Each section starts once the
/// previous one has been read to the end and a short pause has passed.
/// All waits are scene timers, so leaving the scene stops the sequence.
pub struct SectionSequence {
    sections: VecDeque<Vec<DialogueLine>>,
    on_finish: Option<Callback>,
}

impl SectionSequence {
    pub fn new(sections: Vec<Vec<DialogueLine>>) -> Self {
        Self {
            sections: sections.into(),
            on_finish: None,
        }
    }

    /// Runs after the last section (and its pause) is over.
    pub fn then(mut self, on_finish: impl FnOnce(&mut Game) + 'static) -> Self {
        self.on_finish = Some(Box::new(on_finish));
        self
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn start(self, game: &mut Game) {
        game.record(format!("sequence.start {}", self.sections.len()));
        self.play_next(game);
    }

    fn play_next(mut self, game: &mut Game) {
        let Some(section) = self.sections.pop_front() else {
            game.record("sequence.finish");
            if let Some(on_finish) = self.on_finish.take() {
                on_finish(game);
            }
            return;
        };
        game.start_dialogue(section);

        let poll_ms = game.config().section_poll_ms;
        let pause_ms = game.config().section_pause_ms;
        let mut rest = Some(self);
        game.scene_interval(poll_ms, move |game| {
            if game.is_dialogue_active() {
                return ControlFlow::Continue(());
            }
            if let Some(rest) = rest.take() {
                game.scene_timeout(pause_ms, move |game| rest.play_next(game));
            }
            ControlFlow::Break(())
        });
    }
}

impl fmt::Debug for SectionSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionSequence")
            .field("sections", &self.sections.len())
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}
