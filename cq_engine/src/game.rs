mod overlays;
mod persistence;
mod scenes;

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::rc::Rc;

use cq_state::{
    EvidenceRecord, FlagKey, FlagValue, GameClock, GameState, Inventory, Item, ItemId,
    MemoryStorage, Quest, QuestId, QuestLog, SaveStorage, SceneId,
};

use crate::characters::CharacterLayer;
use crate::chat::ChatInterface;
use crate::config::EngineConfig;
use crate::dialogue::{DialogueLine, DialogueRuntime, DialogueStep};
use crate::evidence::EvidenceViewer;
use crate::player::Player;
use crate::presenter::{NullPresenter, Presenter};
use crate::puzzle::Puzzle;
use crate::scene::SceneRegistry;
use crate::scheduler::{Scheduler, ScopeId, TimerHandle};

pub use overlays::Key;

/// One-shot continuation run with the game once a wait is over.
pub type Callback = Box<dyn FnOnce(&mut Game)>;
/// Shared callback that may run many times (scene hooks, overlay hooks).
pub type Hook = Rc<dyn Fn(&mut Game)>;

pub enum Task {
    Once(Callback),
    Every(Box<dyn FnMut(&mut Game) -> ControlFlow<()>>),
}

/// Application context: story state, the current scene, overlays and the
/// virtual clock every wait is measured on.
pub struct Game {
    config: EngineConfig,
    state: GameState,
    inventory: Inventory,
    inventory_open: bool,
    scenes: SceneRegistry,
    current_scene: Option<SceneId>,
    scene_loading: bool,
    scene_scope: ScopeId,
    scheduler: Scheduler<Task>,
    now_ms: u64,
    advancing: bool,
    dialogue: DialogueRuntime,
    dialogue_callback: Option<Callback>,
    chat: ChatInterface,
    evidence: EvidenceViewer,
    puzzle: Option<Puzzle>,
    puzzle_session: u64,
    characters: CharacterLayer,
    player: Player,
    item_hooks: BTreeMap<ItemId, Hook>,
    quest_hooks: BTreeMap<QuestId, Callback>,
    storage: Box<dyn SaveStorage>,
    presenter: Rc<dyn Presenter>,
    events: Vec<String>,
}

impl Game {
    pub fn new(config: EngineConfig) -> Self {
        let mut scheduler = Scheduler::new();
        let scene_scope = scheduler.open_scope();
        let state = GameState::with_clock(config.starting_clock());
        Self {
            config,
            state,
            inventory: Inventory::new(),
            inventory_open: false,
            scenes: SceneRegistry::new(),
            current_scene: None,
            scene_loading: false,
            scene_scope,
            scheduler,
            now_ms: 0,
            advancing: false,
            dialogue: DialogueRuntime::new(),
            dialogue_callback: None,
            chat: ChatInterface::new(),
            evidence: EvidenceViewer::new(),
            puzzle: None,
            puzzle_session: 0,
            characters: CharacterLayer::new(),
            player: Player::new(),
            item_hooks: BTreeMap::new(),
            quest_hooks: BTreeMap::new(),
            storage: Box::new(MemoryStorage::new()),
            presenter: Rc::new(NullPresenter),
            events: Vec::new(),
        }
    }

    pub fn with_presenter(mut self, presenter: Rc<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    pub fn with_storage(mut self, storage: Box<dyn SaveStorage>) -> Self {
        self.storage = storage;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<String> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn record(&mut self, event: impl Into<String>) {
        self.events.push(event.into());
    }

    // Flags

    pub fn flag(&self, key: &str) -> Option<&FlagValue> {
        self.state.flags.get(key)
    }

    pub fn is_flag_set(&self, key: &str) -> bool {
        self.state.flags.is_set(key)
    }

    pub fn flag_int(&self, key: &str) -> i64 {
        self.state.flags.int(key)
    }

    /// Writes a flag. Returns `false` when the stored value was already equal.
    pub fn set_flag(&mut self, key: impl Into<FlagKey>, value: impl Into<FlagValue>) -> bool {
        let key = key.into();
        let value = value.into();
        let shown = value.to_string();
        if !self.state.flags.set(key.clone(), value) {
            return false;
        }
        log::debug!("flag {key} = {shown}");
        self.record(format!("flag.set {key} {shown}"));
        true
    }

    pub fn clear_flag(&mut self, key: &str) -> bool {
        let removed = self.state.flags.remove(key);
        if removed {
            self.record(format!("flag.clear {key}"));
        }
        removed
    }

    // Inventory

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn has_item(&self, id: &str) -> bool {
        self.inventory.has(id)
    }

    /// Adds an item unless one with the same id is carried already.
    pub fn add_item(&mut self, item: Item) -> bool {
        let id = item.id.clone();
        let label = item.label().to_string();
        if !self.inventory.add(item) {
            log::debug!("item {id} already in inventory");
            return false;
        }
        self.record(format!("inventory.add {id}"));
        self.present_inventory();
        self.show_notification(format!("Added to inventory: {label}"));
        true
    }

    pub fn remove_item(&mut self, id: &str) -> Option<Item> {
        let item = self.inventory.remove(id)?;
        self.record(format!("inventory.remove {id}"));
        self.present_inventory();
        Some(item)
    }

    /// Registers what happens when the player uses an item.
    pub fn on_item_use(&mut self, id: impl Into<ItemId>, hook: impl Fn(&mut Game) + 'static) {
        self.item_hooks.insert(id.into(), Rc::new(hook));
    }

    pub fn use_item(&mut self, id: &str) -> bool {
        let Some(item) = self.inventory.get(id) else {
            log::warn!("use_item: {id} is not in the inventory");
            return false;
        };
        let label = item.label().to_string();
        self.record(format!("inventory.use {id}"));
        match self.item_hooks.get(id).cloned() {
            Some(hook) => hook(self),
            None => self.show_notification(format!("You look at the {label}.")),
        }
        true
    }

    pub fn inventory_visible(&self) -> bool {
        self.inventory_open
    }

    fn present_inventory(&self) {
        let labels: Vec<String> = self
            .inventory
            .items()
            .iter()
            .map(|item| item.label().to_string())
            .collect();
        self.presenter.inventory_changed(&labels);
    }

    // Quests

    pub fn quests(&self) -> &QuestLog {
        &self.state.quests
    }

    pub fn add_quest(&mut self, quest: Quest) -> bool {
        let id = quest.id.clone();
        let label = quest.label().to_string();
        if !self.state.quests.add(quest) {
            log::debug!("quest {id} already known");
            return false;
        }
        self.record(format!("quest.add {id}"));
        self.present_quests();
        self.show_notification(format!("New Quest: {label}"));
        true
    }

    /// Adds a quest whose completion runs `on_complete`.
    pub fn add_quest_with(
        &mut self,
        quest: Quest,
        on_complete: impl FnOnce(&mut Game) + 'static,
    ) -> bool {
        let id = quest.id.clone();
        if !self.add_quest(quest) {
            return false;
        }
        self.quest_hooks.insert(id, Box::new(on_complete));
        true
    }

    pub fn complete_quest(&mut self, id: &str) -> bool {
        let Some(quest) = self.state.quests.complete(id) else {
            log::warn!("complete_quest: {id} is not an active quest");
            return false;
        };
        self.record(format!("quest.complete {id}"));
        self.present_quests();
        self.show_notification(format!("Quest Completed: {}", quest.label()));
        if let Some(hook) = self.quest_hooks.remove(id) {
            hook(self);
        }
        true
    }

    pub fn update_quest_progress(&mut self, id: &str, step: impl Into<String>) -> bool {
        let step = step.into();
        if !self.state.quests.update_progress(id, step.clone()) {
            return false;
        }
        self.record(format!("quest.progress {id} {step}"));
        true
    }

    fn present_quests(&self) {
        let active: Vec<String> = self
            .state
            .quests
            .active_quests
            .iter()
            .map(|quest| quest.label().to_string())
            .collect();
        self.presenter.quests_changed(&active);
    }

    // Story progress

    pub fn story_part(&self) -> u32 {
        self.state.story_part
    }

    pub fn set_story_part(&mut self, part: u32) {
        self.state.story_part = part;
        self.record(format!("story.part {part}"));
    }

    pub fn clock(&self) -> &GameClock {
        &self.state.clock
    }

    /// Moves the in-game clock forward; returns how many days rolled over.
    pub fn advance_time(&mut self, minutes: u32) -> u32 {
        let days = self.state.clock.advance(minutes);
        let shown = self.state.clock.to_string();
        self.record(format!("clock.advance {minutes} {shown}"));
        self.presenter.clock_changed(&shown);
        days
    }

    pub fn add_evidence(&mut self, record: EvidenceRecord) -> bool {
        let id = record.id.clone();
        if !self.state.add_evidence(record) {
            return false;
        }
        self.record(format!("evidence.add {id}"));
        true
    }

    pub fn show_notification(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("notification: {message}");
        self.presenter
            .notification(&message, self.config.notification_ms);
        self.record(format!("notify {message}"));
    }

    // Dialogue

    pub fn is_dialogue_active(&self) -> bool {
        self.dialogue.is_active()
    }

    pub fn start_dialogue(&mut self, lines: Vec<DialogueLine>) {
        self.begin_dialogue(lines, None);
    }

    /// Starts a dialogue and runs `on_complete` once its last line has been
    /// advanced past. Interrupting the dialogue drops the callback.
    pub fn start_dialogue_then(
        &mut self,
        lines: Vec<DialogueLine>,
        on_complete: impl FnOnce(&mut Game) + 'static,
    ) {
        self.begin_dialogue(lines, Some(Box::new(on_complete)));
    }

    /// Same speaker for every line.
    pub fn show_dialogue<I, S>(&mut self, lines: I, speaker: &str)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.start_dialogue(crate::dialogue::monologue(speaker, lines));
    }

    pub fn advance_dialogue(&mut self) -> bool {
        if !self.dialogue.is_active() {
            return false;
        }
        let step = self.dialogue.advance(&self.config.default_speaker);
        self.present_dialogue_step(step);
        true
    }

    /// Interrupts the running dialogue without running its completion.
    pub fn end_dialogue(&mut self) -> bool {
        self.dialogue_callback = None;
        if !self.dialogue.end() {
            return false;
        }
        self.record("dialogue.end");
        self.presenter.dialogue_closed();
        true
    }

    fn begin_dialogue(&mut self, lines: Vec<DialogueLine>, on_complete: Option<Callback>) {
        if self.dialogue.is_active() {
            self.record("dialogue.interrupted");
        }
        self.dialogue_callback = None;
        let count = lines.len();
        let step = self.dialogue.start(lines, &self.config.default_speaker);
        self.dialogue_callback = on_complete;
        self.record(format!("dialogue.start {count}"));
        self.present_dialogue_step(step);
    }

    fn present_dialogue_step(&mut self, step: DialogueStep) {
        match step {
            DialogueStep::Line(mut view) => {
                if view.portrait.is_none() {
                    view.portrait = self.config.portrait_for(&view.speaker).map(str::to_string);
                }
                self.record(format!("dialogue.line {} {}", view.index, view.speaker));
                self.presenter.dialogue_line(&view);
                let token = self.dialogue.line_token();
                let action = self
                    .dialogue
                    .current_line()
                    .and_then(|line| line.action.clone());
                if let Some(action) = action {
                    action(self);
                }
                if self.config.dialogue.auto_advance && self.dialogue.line_token() == token {
                    let delay = self.config.line_display_ms(&view.text);
                    self.scene_timeout(delay, move |game| {
                        if game.dialogue.line_token() == token {
                            game.advance_dialogue();
                        }
                    });
                }
            }
            DialogueStep::Finished => {
                self.record("dialogue.complete");
                self.presenter.dialogue_closed();
                if let Some(callback) = self.dialogue_callback.take() {
                    callback(self);
                }
            }
            DialogueStep::Idle => {}
        }
    }

    // Timers

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn scene_scope(&self) -> ScopeId {
        self.scene_scope
    }

    /// Wait bound to the current scene; leaving the scene drops it.
    pub fn scene_timeout(
        &mut self,
        delay_ms: u64,
        callback: impl FnOnce(&mut Game) + 'static,
    ) -> Option<TimerHandle> {
        self.timeout_in(self.scene_scope, delay_ms, callback)
    }

    /// Repeats every `interval_ms` in the current scene until the callback
    /// breaks or the scene is left.
    pub fn scene_interval(
        &mut self,
        interval_ms: u64,
        callback: impl FnMut(&mut Game) -> ControlFlow<()> + 'static,
    ) -> Option<TimerHandle> {
        self.scheduler.schedule_repeat(
            self.scene_scope,
            self.now_ms,
            interval_ms,
            Task::Every(Box::new(callback)),
        )
    }

    /// Wait that survives scene changes.
    pub fn engine_timeout(
        &mut self,
        delay_ms: u64,
        callback: impl FnOnce(&mut Game) + 'static,
    ) -> Option<TimerHandle> {
        self.timeout_in(ScopeId::ENGINE, delay_ms, callback)
    }

    pub fn timeout_in(
        &mut self,
        scope: ScopeId,
        delay_ms: u64,
        callback: impl FnOnce(&mut Game) + 'static,
    ) -> Option<TimerHandle> {
        self.scheduler
            .schedule_once(scope, self.now_ms, delay_ms, Task::Once(Box::new(callback)))
    }

    pub fn open_scope(&mut self) -> ScopeId {
        self.scheduler.open_scope()
    }

    pub fn cancel_scope(&mut self, scope: ScopeId) -> usize {
        self.scheduler.cancel_scope(scope)
    }

    pub fn cancel_timer(&mut self, handle: TimerHandle) -> bool {
        self.scheduler.cancel(handle)
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.len()
    }

    pub fn pending_in(&self, scope: ScopeId) -> usize {
        self.scheduler.pending_in(scope)
    }

    /// Moves the virtual clock forward by `ms`, running every timer that
    /// comes due on the way. Returns how many timers fired.
    pub fn advance(&mut self, ms: u64) -> usize {
        if self.advancing {
            log::warn!("advance called from inside a timer; ignoring");
            return 0;
        }
        self.advancing = true;
        let target = self.now_ms.saturating_add(ms);
        let mut fired = 0;
        while let Some(timer) = self.scheduler.pop_due(target) {
            self.now_ms = self.now_ms.max(timer.due_ms);
            fired += 1;
            match timer.callback {
                Task::Once(callback) => callback(self),
                Task::Every(mut callback) => {
                    if callback(self).is_continue() {
                        self.scheduler.rearm(timer.handle, Task::Every(callback));
                    }
                }
            }
        }
        self.now_ms = target;
        self.advancing = false;
        fired
    }

    /// Runs timers until nothing is pending or `limit_ms` of virtual time has
    /// passed. Returns the virtual time spent.
    pub fn run_until_idle(&mut self, limit_ms: u64) -> u64 {
        if self.advancing {
            log::warn!("run_until_idle called from inside a timer; ignoring");
            return 0;
        }
        let start = self.now_ms;
        let deadline = start.saturating_add(limit_ms);
        while let Some(due) = self.scheduler.next_due() {
            if due > deadline {
                break;
            }
            let step = due.saturating_sub(self.now_ms);
            self.advance(step);
        }
        self.now_ms - start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::{PresentationEvent, RecordingPresenter};
    use std::cell::Cell;

    fn game() -> (Game, RecordingPresenter) {
        let presenter = RecordingPresenter::new();
        let game = Game::new(EngineConfig::default()).with_presenter(Rc::new(presenter.clone()));
        (game, presenter)
    }

    #[test]
    fn unset_flags_are_falsy_and_writes_are_idempotent() {
        let (mut game, _) = game();
        assert!(!game.is_flag_set("usb_analyzed"));
        assert!(game.set_flag("usb_analyzed", true));
        assert!(!game.set_flag("usb_analyzed", true));
        assert!(game.is_flag_set("usb_analyzed"));
        assert!(game.set_flag("usb_analyzed", false));
        assert!(!game.is_flag_set("usb_analyzed"));
        assert_eq!(
            game.events(),
            ["flag.set usb_analyzed true", "flag.set usb_analyzed false"]
        );
    }

    #[test]
    fn inventory_and_quests_notify() {
        let (mut game, presenter) = game();
        assert!(game.add_item(Item::new("usb_stick", "USB Stick")));
        assert!(!game.add_item(Item::new("usb_stick", "USB Stick")));
        assert!(game.add_quest(Quest::new("decode_message", "Decipher the Message")));
        assert!(game.complete_quest("decode_message"));
        assert!(!game.add_quest(Quest::new("decode_message", "Again")));

        let notes: Vec<String> = presenter
            .events()
            .into_iter()
            .filter_map(|event| match event {
                PresentationEvent::Notification { message, .. } => Some(message),
                _ => None,
            })
            .collect();
        assert_eq!(
            notes,
            [
                "Added to inventory: USB Stick",
                "New Quest: Decipher the Message",
                "Quest Completed: Decipher the Message",
            ]
        );
    }

    #[test]
    fn quest_completion_hook_runs_once() {
        let (mut game, _) = game();
        game.add_quest_with(Quest::new("find_allies", "Find Technical Allies"), |game| {
            game.set_flag("allies_found", true);
        });
        assert!(game.complete_quest("find_allies"));
        assert!(game.is_flag_set("allies_found"));
        assert!(!game.complete_quest("find_allies"));
    }

    #[test]
    fn using_an_item_without_hook_describes_it() {
        let (mut game, presenter) = game();
        game.add_item(Item::new("flipper_zero", "Flipper Zero"));
        presenter.clear();
        assert!(game.use_item("flipper_zero"));
        assert!(!game.use_item("night_vision"));
        assert_eq!(
            presenter.events(),
            [PresentationEvent::Notification {
                message: "You look at the Flipper Zero.".to_string(),
                duration_ms: 3000,
            }]
        );

        game.on_item_use("flipper_zero", |game| {
            game.set_flag("flipper_used", true);
        });
        game.use_item("flipper_zero");
        assert!(game.is_flag_set("flipper_used"));
    }

    #[test]
    fn dialogue_completion_fires_once_and_interruption_drops_it() {
        let (mut game, _) = game();
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        game.start_dialogue_then(
            vec![DialogueLine::new("Eva", "Ryan."), DialogueLine::narration("...")],
            move |_| counter.set(counter.get() + 1),
        );
        assert!(game.advance_dialogue());
        assert!(game.advance_dialogue());
        assert!(!game.advance_dialogue());
        assert_eq!(fired.get(), 1);

        let counter = fired.clone();
        game.start_dialogue_then(vec![DialogueLine::new("Eva", "Wait.")], move |_| {
            counter.set(counter.get() + 10)
        });
        game.start_dialogue(vec![DialogueLine::new("Ryan", "Never mind.")]);
        game.advance_dialogue();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn empty_dialogue_completes_immediately() {
        let (mut game, _) = game();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        game.start_dialogue_then(Vec::new(), move |_| flag.set(true));
        assert!(fired.get());
        assert!(!game.is_dialogue_active());
    }

    #[test]
    fn dialogue_portraits_fall_back_to_speaker_map() {
        let mut config = EngineConfig::default();
        config.portraits.insert(
            "eva".to_string(),
            "assets/images/characters/eva_southpark.svg".to_string(),
        );
        let presenter = RecordingPresenter::new();
        let mut game = Game::new(config).with_presenter(Rc::new(presenter.clone()));
        game.start_dialogue(vec![DialogueLine::new("Eva", "Hello.")]);
        let Some(PresentationEvent::DialogueLine { line }) = presenter.events().pop() else {
            panic!("expected a dialogue line");
        };
        assert_eq!(
            line.portrait.as_deref(),
            Some("assets/images/characters/eva_southpark.svg")
        );
    }

    #[test]
    fn line_actions_run_when_shown() {
        let (mut game, _) = game();
        game.start_dialogue(vec![
            DialogueLine::new("Ryan", "Let me check."),
            DialogueLine::narration("*The screen flickers.*")
                .with_action(Rc::new(|game: &mut Game| {
                    game.set_flag("screen_flicker", true);
                })),
        ]);
        assert!(!game.is_flag_set("screen_flicker"));
        game.advance_dialogue();
        assert!(game.is_flag_set("screen_flicker"));
    }

    #[test]
    fn auto_advance_paces_lines() {
        let mut config = EngineConfig::default();
        config.dialogue.auto_advance = true;
        let mut game = Game::new(config);
        game.start_dialogue(vec![
            DialogueLine::new("Ryan", "abc"),
            DialogueLine::new("Ryan", "de"),
        ]);
        game.advance(3 * 30 + 1500 - 1);
        assert_eq!(
            game.dialogue.current_line().map(|line| line.text.as_str()),
            Some("abc")
        );
        game.advance(1);
        assert_eq!(
            game.dialogue.current_line().map(|line| line.text.as_str()),
            Some("de")
        );
        game.advance(2 * 30 + 1500);
        assert!(!game.is_dialogue_active());
    }

    #[test]
    fn manual_advance_makes_pending_auto_advance_stale() {
        let mut config = EngineConfig::default();
        config.dialogue.auto_advance = true;
        let mut game = Game::new(config);
        game.start_dialogue(vec![
            DialogueLine::new("Ryan", "one"),
            DialogueLine::new("Ryan", "two"),
            DialogueLine::new("Ryan", "three"),
        ]);
        game.advance(1000);
        game.advance_dialogue();
        // the first line's timer fires now but must not skip "two"
        game.advance(600);
        assert_eq!(
            game.dialogue.current_line().map(|line| line.text.as_str()),
            Some("two")
        );
    }

    #[test]
    fn timers_fire_in_order_and_intervals_stop_on_break() {
        let (mut game, _) = game();
        game.scene_timeout(200, |game| game.record("b"));
        game.engine_timeout(100, |game| game.record("a"));
        let mut ticks = 0;
        game.scene_interval(50, move |game| {
            ticks += 1;
            game.record(format!("tick {ticks}"));
            if ticks == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(game.advance(1000), 5);
        // "a" was scheduled before the interval, so it wins the tie at 100 ms
        assert_eq!(game.events(), ["tick 1", "a", "tick 2", "tick 3", "b"]);
        assert_eq!(game.now_ms(), 1000);
        assert_eq!(game.pending_timers(), 0);
    }

    #[test]
    fn run_until_idle_stops_at_limit() {
        let (mut game, _) = game();
        game.scene_timeout(300, |game| {
            game.scene_timeout(300, |game| game.record("second"));
        });
        assert_eq!(game.run_until_idle(10_000), 600);
        assert_eq!(game.events(), ["second"]);

        game.scene_timeout(5000, |game| game.record("late"));
        assert_eq!(game.run_until_idle(1000), 0);
        assert_eq!(game.pending_timers(), 1);
    }

    #[test]
    fn draining_from_inside_a_timer_is_ignored() {
        let (mut game, _) = game();
        game.scene_timeout(50, |game| {
            let spent = game.run_until_idle(1000);
            game.record(format!("inner drain {spent}"));
        });
        game.scene_timeout(100, |game| game.record("later"));
        assert_eq!(game.advance(200), 2);
        assert_eq!(game.events(), ["inner drain 0", "later"]);
        assert_eq!(game.now_ms(), 200);
    }

    #[test]
    fn clock_advances_across_midnight() {
        let mut config = EngineConfig::default();
        config.default_time = "23:30".parse().expect("valid time");
        let mut game = Game::new(config);
        assert_eq!(game.advance_time(45), 1);
        assert_eq!(game.clock().to_string(), "Day 2 00:15");
    }
}
