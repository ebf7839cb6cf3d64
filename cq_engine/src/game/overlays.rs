use std::collections::VecDeque;

use cq_state::{ConversationId, DocumentId, FlagKey, PuzzleId};
use serde::{Deserialize, Serialize};

use super::Game;
use crate::chat::{ChatInterface, ChatMessage, ConversationConfig, Delivery};
use crate::evidence::{EvidenceDocument, EvidenceViewer, RenderedDocument};
use crate::puzzle::{feedback_for, FailureKind, Puzzle, PuzzleConfig, SubmitOutcome};
use crate::scheduler::ScopeId;

/// Keys the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// Closes the top-most overlay: puzzle, then document, then chat.
    Escape,
    /// Advances the running dialogue.
    Space,
    /// Toggles the inventory panel.
    Inventory,
}

impl Game {
    pub fn handle_key(&mut self, key: Key) -> bool {
        match key {
            Key::Escape => {
                if self.puzzle.is_some() {
                    self.close_puzzle()
                } else if self.evidence.is_open() {
                    self.close_document()
                } else {
                    self.close_chat()
                }
            }
            Key::Space => self.advance_dialogue(),
            Key::Inventory => {
                self.inventory_open = !self.inventory_open;
                let state = if self.inventory_open { "open" } else { "closed" };
                self.record(format!("ui.inventory {state}"));
                true
            }
        }
    }

    pub(super) fn close_overlays(&mut self) {
        self.close_puzzle();
        self.close_document();
        self.close_chat();
    }

    // Chat

    pub fn chat(&self) -> &ChatInterface {
        &self.chat
    }

    /// Opens a conversation, closing the one on screen first.
    pub fn show_conversation(&mut self, config: ConversationConfig) {
        if self.chat.is_open() {
            self.close_chat();
        }
        let id = config.id.clone();
        let on_open = config.on_open.clone();
        let view = self.chat.open(config, &self.config.player_name);
        self.record(format!("chat.open {id}"));
        self.presenter.chat_opened(&view);
        if let Some(hook) = on_open {
            hook(self);
        }
        self.set_flag(FlagKey::chat_viewed(&id), true);
    }

    /// Closes the open conversation and runs its close hook.
    pub fn close_chat(&mut self) -> bool {
        let Some((id, on_close)) = self.chat.close() else {
            return false;
        };
        self.record(format!("chat.close {id}"));
        self.presenter.chat_closed(&id);
        if let Some(hook) = on_close {
            hook(self);
        }
        true
    }

    /// Appends a message to a stored conversation. It is shown right away
    /// only when `immediate` is set and that conversation is on screen.
    pub fn add_chat_message(&mut self, id: &str, message: ChatMessage, immediate: bool) -> bool {
        let from = message.from.clone();
        match self
            .chat
            .add_message(id, message, immediate, &self.config.player_name)
        {
            Delivery::UnknownConversation => {
                log::error!("conversation {id} not found");
                false
            }
            Delivery::Stored => {
                self.record(format!("chat.message {id} {from}"));
                true
            }
            Delivery::Shown(view) => {
                self.record(format!("chat.message {id} {from}"));
                self.presenter.chat_message(&ConversationId::new(id), &view);
                true
            }
        }
    }

    /// Delivers `messages` one by one, `delay_ms` apart, with a typing
    /// indicator while the conversation is on screen. Delivery keeps going
    /// when the chat closes or the scene changes; cancel the returned scope
    /// to stop it.
    pub fn send_messages_with_delay(
        &mut self,
        id: impl Into<ConversationId>,
        messages: Vec<ChatMessage>,
        delay_ms: u64,
    ) -> ScopeId {
        let scope = self.scheduler.open_scope();
        self.deliver_next(scope, id.into(), messages.into(), delay_ms);
        scope
    }

    fn deliver_next(
        &mut self,
        scope: ScopeId,
        id: ConversationId,
        mut queue: VecDeque<ChatMessage>,
        delay_ms: u64,
    ) {
        let Some(message) = queue.pop_front() else {
            self.scheduler.cancel_scope(scope);
            return;
        };
        let typing = message.from != self.config.player_name;
        if self.chat.set_typing(id.as_str(), typing) {
            self.presenter.chat_typing(&id, typing);
        }
        self.timeout_in(scope, delay_ms, move |game| {
            if game.chat.set_typing(id.as_str(), false) {
                game.presenter.chat_typing(&id, false);
            }
            game.add_chat_message(id.as_str(), message, true);
            game.deliver_next(scope, id, queue, delay_ms);
        });
    }

    /// Sends a player reply in the open conversation. Blank replies and
    /// conversations without a reply box are ignored.
    pub fn send_reply(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let Some(id) = self.chat.open_id().cloned() else {
            log::warn!("send_reply: no conversation is open");
            return false;
        };
        if !self.chat.allows_reply(id.as_str()) {
            log::warn!("send_reply: conversation {id} does not take replies");
            return false;
        }
        let message = ChatMessage::new(self.config.player_name.clone(), text)
            .at(self.state.clock.time.to_string());
        self.add_chat_message(id.as_str(), message.clone(), true);
        if let Some(hook) = self.chat.reply_hook(id.as_str()) {
            hook(self, &message);
        }
        true
    }

    pub fn has_viewed_conversation(&self, id: &str) -> bool {
        self.is_flag_set(FlagKey::chat_viewed(&ConversationId::new(id)).as_str())
    }

    // Evidence

    pub fn evidence(&self) -> &EvidenceViewer {
        &self.evidence
    }

    pub fn show_document(&mut self, document: EvidenceDocument) -> RenderedDocument {
        self.open_document(document, None)
    }

    /// Shows a document and runs `on_read` the first time it is ever shown.
    pub fn show_document_then(
        &mut self,
        document: EvidenceDocument,
        on_read: impl FnOnce(&mut Game) + 'static,
    ) -> RenderedDocument {
        self.open_document(document, Some(Box::new(on_read)))
    }

    fn open_document(
        &mut self,
        document: EvidenceDocument,
        on_read: Option<super::Callback>,
    ) -> RenderedDocument {
        let id = document.id.clone();
        let (rendered, first_view) = self.evidence.show(document);
        self.record(format!("document.show {id}"));
        self.presenter.document_shown(&rendered);
        if first_view {
            self.record(format!("document.first_view {id}"));
            if let Some(callback) = on_read {
                callback(self);
            }
        }
        rendered
    }

    pub fn next_page(&mut self) -> Option<RenderedDocument> {
        let rendered = self.evidence.next_page()?;
        self.record(format!("document.page {}", self.evidence.current_page()));
        self.presenter.document_shown(&rendered);
        Some(rendered)
    }

    pub fn previous_page(&mut self) -> Option<RenderedDocument> {
        let rendered = self.evidence.previous_page()?;
        self.record(format!("document.page {}", self.evidence.current_page()));
        self.presenter.document_shown(&rendered);
        Some(rendered)
    }

    pub fn close_document(&mut self) -> bool {
        let Some(id) = self.evidence.close() else {
            return false;
        };
        self.record(format!("document.close {id}"));
        self.presenter.document_closed(&id);
        true
    }

    pub fn has_viewed_document(&self, id: &str) -> bool {
        self.evidence.has_viewed(id)
    }

    pub fn viewed_documents(&self) -> &[DocumentId] {
        self.evidence.viewed_documents()
    }

    // Puzzles

    pub fn is_puzzle_active(&self) -> bool {
        self.puzzle.is_some()
    }

    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.puzzle.as_ref()
    }

    /// Shows a fresh puzzle with zero attempts, replacing any open one.
    pub fn show_puzzle(&mut self, config: PuzzleConfig) {
        if self.puzzle.is_some() {
            self.close_puzzle();
        }
        self.puzzle_session += 1;
        let puzzle = Puzzle::new(config, self.puzzle_session);
        self.record(format!("puzzle.show {}", puzzle.id()));
        self.presenter.puzzle_shown(&puzzle.view());
        self.puzzle = Some(puzzle);
    }

    pub fn submit_puzzle_answer(&mut self, input: &str) -> SubmitOutcome {
        let Some(puzzle) = self.puzzle.as_mut() else {
            log::warn!("submit_puzzle_answer: no puzzle is open");
            return SubmitOutcome::Rejected;
        };
        let outcome = puzzle.submit(input);
        let id = puzzle.id().clone();
        let session = puzzle.session();
        let view = puzzle.view();
        let on_success = puzzle.config().on_success.clone();
        let on_failure = puzzle.config().on_failure.clone();
        let completes_quest = puzzle.config().completes_quest.clone();

        if let Some(feedback) = feedback_for(puzzle.kind(), outcome) {
            self.presenter.puzzle_feedback(&id, &feedback);
        }
        match outcome {
            SubmitOutcome::Solved => {
                self.record(format!("puzzle.solved {id}"));
                self.presenter.puzzle_shown(&view);
                self.mark_puzzle_solved(id.as_str());
                if let Some(quest) = completes_quest {
                    self.complete_quest(quest.as_str());
                }
                // engine scope: the result is delivered even if the player
                // escapes and leaves the scene before the delay runs out
                let delay = self.config.puzzle_success_delay_ms;
                self.engine_timeout(delay, move |game| {
                    if let Some(hook) = on_success {
                        hook(game);
                    }
                    game.close_puzzle_session(session);
                });
            }
            SubmitOutcome::Wrong { remaining } => {
                self.record(format!("puzzle.wrong {id}"));
                self.presenter.puzzle_shown(&view);
                if let Some(hook) = on_failure {
                    hook(self, FailureKind::Wrong { remaining });
                }
            }
            SubmitOutcome::Exhausted => {
                self.record(format!("puzzle.exhausted {id}"));
                self.presenter.puzzle_shown(&view);
                let delay = self.config.puzzle_failure_delay_ms;
                self.engine_timeout(delay, move |game| {
                    if let Some(hook) = on_failure {
                        hook(game, FailureKind::Exhausted);
                    }
                    game.close_puzzle_session(session);
                });
            }
            SubmitOutcome::Rejected => {
                log::debug!("puzzle {id} is no longer taking answers");
            }
        }
        outcome
    }

    /// Turns the dial of the open frequency puzzle. Returns the new
    /// frequency, or `None` when no dial is showing.
    pub fn tune_puzzle(&mut self, delta_mhz: f64) -> Option<f64> {
        let puzzle = self.puzzle.as_mut()?;
        let Some(mhz) = puzzle.tune(delta_mhz) else {
            log::debug!("puzzle {} has no dial to tune", puzzle.id());
            return None;
        };
        let view = puzzle.view();
        self.presenter.puzzle_shown(&view);
        Some(mhz)
    }

    pub fn close_puzzle(&mut self) -> bool {
        let Some(puzzle) = self.puzzle.take() else {
            return false;
        };
        self.record(format!("puzzle.close {}", puzzle.id()));
        self.presenter.puzzle_closed(puzzle.id());
        true
    }

    /// Closes the puzzle only if it is still the showing `session` refers to.
    fn close_puzzle_session(&mut self, session: u64) {
        if self.puzzle.as_ref().map(Puzzle::session) == Some(session) {
            self.close_puzzle();
        }
    }

    pub fn is_puzzle_solved(&self, id: &str) -> bool {
        self.is_flag_set(FlagKey::puzzle_solved(&PuzzleId::new(id)).as_str())
    }

    pub fn mark_puzzle_solved(&mut self, id: &str) {
        self.set_flag(FlagKey::puzzle_solved(&PuzzleId::new(id)), true);
    }
}
