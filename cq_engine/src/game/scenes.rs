use std::ops::ControlFlow;
use std::rc::Rc;

use cq_state::SceneId;

use super::Game;
use crate::characters::{CharacterLayer, CharacterView, DEFAULT_CHARACTER_SCALE};
use crate::error::EngineError;
use crate::hotspot::{ClickOutcome, Hotspot};
use crate::player::Player;
use crate::presenter::FadeDirection;
use crate::scene::{Scene, SceneView, Transition};

impl Game {
    pub fn register_scene(&mut self, scene: impl Scene + 'static) {
        let id = scene.descriptor().id.clone();
        if self.scenes.register(Rc::new(scene)) {
            log::warn!("scene {id} registered twice; keeping the newer one");
        }
        log::debug!("scene registered: {id}");
    }

    pub fn current_scene(&self) -> Option<&SceneId> {
        self.current_scene.as_ref()
    }

    pub fn is_scene_loading(&self) -> bool {
        self.scene_loading
    }

    pub fn has_scene(&self, id: &str) -> bool {
        self.scenes.contains(id)
    }

    /// Leaves the current scene and enters `id`.
    ///
    /// Leaving always cancels the scene's timers, runs its exit hook, ends
    /// any dialogue, closes overlays and removes characters. With
    /// [`Transition::Fade`] the new scene appears after the fade-out and the
    /// load counts as in progress until the fade-in finishes; requests made
    /// meanwhile are refused.
    pub fn load_scene(&mut self, id: &str, transition: Transition) -> Result<(), EngineError> {
        let Some(scene) = self.scenes.get(id) else {
            log::error!("scene not found: {id}");
            self.record(format!("scene.missing {id}"));
            return Err(EngineError::UnknownScene(SceneId::new(id)));
        };
        if self.scene_loading {
            log::warn!("scene load already in progress, ignoring request for {id}");
            return Err(EngineError::SceneLoadInProgress(SceneId::new(id)));
        }
        self.scene_loading = true;
        self.record(format!("scene.load {id}"));
        self.leave_current_scene();

        match transition {
            Transition::Fade => {
                let fade_ms = self.config.transition_ms;
                self.presenter.scene_fade(FadeDirection::Out, fade_ms);
                self.engine_timeout(fade_ms, move |game| game.enter_scene(scene, transition));
            }
            Transition::Instant => self.enter_scene(scene, transition),
        }
        Ok(())
    }

    fn leave_current_scene(&mut self) {
        let dropped = self.scheduler.cancel_scope(self.scene_scope);
        if dropped > 0 {
            log::debug!("dropped {dropped} scene timers");
        }
        // waits requested during a fade belong to the incoming scene
        self.scene_scope = self.scheduler.open_scope();
        if let Some(current) = self.current_scene.clone() {
            if let Some(scene) = self.scenes.get(current.as_str()) {
                scene.on_exit(self);
            }
            self.record(format!("scene.exit {current}"));
        }
        self.end_dialogue();
        self.close_overlays();
        if self.characters.clear() > 0 {
            self.presenter.characters_cleared();
        }
    }

    fn enter_scene(&mut self, scene: Rc<dyn Scene>, transition: Transition) {
        let descriptor = scene.descriptor();
        let id = descriptor.id.clone();
        self.current_scene = Some(id.clone());
        self.player.enter_scene(
            descriptor.player_start,
            descriptor.hide_player,
            descriptor.idle_thoughts.clone(),
        );
        let view = SceneView::new(descriptor, self.player.position());
        self.presenter.scene_shown(&view);
        self.record(format!("scene.enter {id}"));
        log::debug!("entering scene {id}");
        self.arm_idle_thoughts();
        scene.on_enter(self);

        match transition {
            Transition::Fade => {
                let fade_ms = self.config.transition_ms;
                self.presenter.scene_fade(FadeDirection::In, fade_ms);
                self.engine_timeout(fade_ms, move |game| game.finish_scene_load(&id));
            }
            Transition::Instant => self.finish_scene_load(&id),
        }
    }

    fn finish_scene_load(&mut self, id: &SceneId) {
        self.scene_loading = false;
        log::debug!("scene loaded: {id}");
    }

    // Hotspots

    /// Clicks a visible hotspot of the current scene.
    pub fn click_hotspot(&mut self, id: &str) -> ClickOutcome {
        if self.dialogue.is_active() || self.is_puzzle_active() {
            return ClickOutcome::Blocked;
        }
        let hotspot = self
            .current_scene
            .as_ref()
            .and_then(|current| self.scenes.get(current.as_str()))
            .and_then(|scene| scene.descriptor().find_hotspot(id).cloned())
            .filter(|hotspot| hotspot.visible);
        let Some(hotspot) = hotspot else {
            log::warn!("no visible hotspot {id} in the current scene");
            return ClickOutcome::UnknownHotspot;
        };
        self.record(format!("hotspot.click {id}"));

        if let Some(enabled) = &hotspot.enabled {
            if !enabled.evaluate(self) {
                if let Some(message) = &hotspot.disabled_message {
                    self.player_think(message.clone());
                }
                return ClickOutcome::Disabled;
            }
        }
        if let Some(condition) = &hotspot.condition {
            if !condition.evaluate(self) {
                if let Some(message) = &hotspot.fail_message {
                    self.player_think(message.clone());
                }
                return ClickOutcome::ConditionFailed;
            }
        }
        if !hotspot.skip_walk {
            let (x, y) = hotspot.rect.walk_target();
            self.player.walk_to(x, y);
            self.presenter.player_moved(x, y);
        }
        self.activate_hotspot(hotspot);
        ClickOutcome::Activated
    }

    fn activate_hotspot(&mut self, hotspot: Hotspot) {
        if let Some(look) = &hotspot.look_message {
            let message = look.resolve(self);
            self.player_think(message);
        }
        if let Some(action) = &hotspot.action {
            action(self);
        }
        if let Some(target) = hotspot.target_scene {
            let delay = self.config.scene_change_delay_ms;
            self.scene_timeout(delay, move |game| {
                // refusals are logged by load_scene
                let _ = game.load_scene(target.as_str(), Transition::Fade);
            });
        }
        if let Some(item) = hotspot.item {
            self.add_item(item);
        }
        if let Some(lines) = hotspot.dialogue {
            self.start_dialogue(lines);
        }
        if let Some(puzzle) = hotspot.puzzle {
            self.show_puzzle(puzzle);
        }
    }

    // Player

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Shows a thought bubble for the configured time. Ignored while the
    /// player is already thinking.
    pub fn player_think(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        let Some(token) = self.player.begin_thought() else {
            log::debug!("already thinking, dropping thought: {text}");
            return false;
        };
        self.record(format!("player.think {text}"));
        self.presenter.player_thought(&text);
        let duration = self.config.thought_ms;
        self.engine_timeout(duration, move |game| {
            game.player.end_thought(token);
        });
        true
    }

    fn arm_idle_thoughts(&mut self) {
        let interval = self.config.idle_thought_interval_ms;
        if interval == 0 || !self.player.has_idle_thoughts() {
            return;
        }
        self.scene_interval(interval, |game| {
            if !game.player.is_thinking() && !game.dialogue.is_active() {
                if let Some(thought) = game.player.next_idle_thought() {
                    game.player_think(thought);
                }
            }
            ControlFlow::Continue(())
        });
    }

    // Characters

    pub fn characters(&self) -> &CharacterLayer {
        &self.characters
    }

    /// Places an NPC sprite on the current scene. Characters are removed
    /// when the scene is left.
    pub fn show_character(
        &mut self,
        name: &str,
        x: f32,
        y: f32,
        scale: Option<f32>,
    ) -> Option<CharacterView> {
        if name.is_empty() {
            log::error!("show_character: a character name is required");
            return None;
        }
        let view = self
            .characters
            .show(name, x, y, scale.unwrap_or(DEFAULT_CHARACTER_SCALE));
        self.record(format!("character.show {}", view.id));
        self.presenter.character_shown(&view);
        Some(view)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use cq_state::Item;

    use super::*;
    use crate::config::EngineConfig;
    use crate::dialogue::DialogueLine;
    use crate::hotspot::{Condition, Rect};
    use crate::presenter::{PresentationEvent, RecordingPresenter};
    use crate::puzzle::{PuzzleConfig, SubmitOutcome};
    use crate::scene::{SceneDescriptor, ScriptedScene};

    fn lab() -> ScriptedScene {
        ScriptedScene::new(
            SceneDescriptor::new("lab", "Lab")
                .idle_thoughts(["So many cables."])
                .hotspot(
                    Hotspot::new("bench", "SDR Bench", Rect::new(10.0, 50.0, 20.0, 20.0))
                        .look("My trusty SDR bench."),
                )
                .hotspot(
                    Hotspot::new("door", "Door", Rect::new(80.0, 30.0, 10.0, 60.0))
                        .requires(Condition::has_item("key"), Some("It's locked."))
                        .leads_to("garden"),
                )
                .hotspot(
                    Hotspot::new("drawer", "Drawer", Rect::new(40.0, 60.0, 10.0, 10.0))
                        .enabled_when(Condition::not_flag("drawer_empty"), Some("Empty now."))
                        .gives(Item::new("key", "Key"))
                        .action(|game| {
                            game.set_flag("drawer_empty", true);
                        }),
                )
                .hotspot(Hotspot::new("vent", "Vent", Rect::default()).hidden()),
        )
        .on_enter(|game| {
            game.show_character("eva", 60.0, 80.0, None);
            game.scene_timeout(10_000, |game| { game.set_flag("lab_timer", true); });
        })
    }

    fn garden() -> ScriptedScene {
        ScriptedScene::new(SceneDescriptor::new("garden", "Garden").player_start(20.0, 85.0))
    }

    fn game() -> (Game, RecordingPresenter) {
        let presenter = RecordingPresenter::new();
        let mut game =
            Game::new(EngineConfig::default()).with_presenter(Rc::new(presenter.clone()));
        game.register_scene(lab());
        game.register_scene(garden());
        (game, presenter)
    }

    #[test]
    fn fade_load_swaps_after_fade_out_and_unlocks_after_fade_in() {
        let (mut game, _) = game();
        game.load_scene("lab", Transition::Fade).expect("lab exists");
        assert!(game.is_scene_loading());
        assert!(game.current_scene().is_none());
        assert!(matches!(
            game.load_scene("garden", Transition::Fade),
            Err(EngineError::SceneLoadInProgress(_))
        ));

        game.advance(500);
        assert_eq!(game.current_scene().map(SceneId::as_str), Some("lab"));
        assert!(game.is_scene_loading());
        game.advance(500);
        assert!(!game.is_scene_loading());
    }

    #[test]
    fn unknown_scene_is_an_error() {
        let (mut game, _) = game();
        assert!(matches!(
            game.load_scene("attic", Transition::Instant),
            Err(EngineError::UnknownScene(_))
        ));
        assert!(!game.is_scene_loading());
    }

    #[test]
    fn leaving_cancels_scene_timers_and_characters() {
        let (mut game, presenter) = game();
        game.load_scene("lab", Transition::Instant).expect("lab exists");
        assert_eq!(game.characters().characters().len(), 1);
        let lab_scope = game.scene_scope();
        assert!(game.pending_in(lab_scope) > 0);

        game.start_dialogue(vec![DialogueLine::new("Eva", "Stay.")]);
        game.load_scene("garden", Transition::Instant).expect("garden exists");
        assert_eq!(game.pending_in(lab_scope), 0);
        assert!(game.characters().is_empty());
        assert!(!game.is_dialogue_active());
        assert_eq!(game.player().position().x, 20.0);

        game.advance(20_000);
        assert!(!game.is_flag_set("lab_timer"));
        assert!(presenter
            .events()
            .contains(&PresentationEvent::CharactersCleared));
    }

    #[test]
    fn exit_hook_runs_on_leave() {
        let (mut game, _) = game();
        let exits = Rc::new(Cell::new(0));
        let counter = exits.clone();
        game.register_scene(
            ScriptedScene::new(SceneDescriptor::new("hall", "Hall"))
                .on_exit(move |_| counter.set(counter.get() + 1)),
        );
        game.load_scene("hall", Transition::Instant).expect("hall exists");
        game.load_scene("garden", Transition::Instant).expect("garden exists");
        assert_eq!(exits.get(), 1);
    }

    #[test]
    fn hotspot_gates_and_pickups() {
        let (mut game, _) = game();
        game.load_scene("lab", Transition::Instant).expect("lab exists");

        assert_eq!(game.click_hotspot("door"), ClickOutcome::ConditionFailed);
        assert!(game.events().iter().any(|event| event == "player.think It's locked."));
        game.advance(4000);

        assert_eq!(game.click_hotspot("drawer"), ClickOutcome::Activated);
        assert!(game.has_item("key"));
        assert_eq!(game.click_hotspot("drawer"), ClickOutcome::Disabled);
        assert_eq!(game.click_hotspot("vent"), ClickOutcome::UnknownHotspot);

        assert_eq!(game.click_hotspot("door"), ClickOutcome::Activated);
        assert_eq!(game.player().position().x, 85.0);
        game.advance(300);
        assert!(game.is_scene_loading());
        game.advance(1000);
        assert_eq!(game.current_scene().map(SceneId::as_str), Some("garden"));
    }

    #[test]
    fn clicks_are_blocked_during_dialogue() {
        let (mut game, _) = game();
        game.load_scene("lab", Transition::Instant).expect("lab exists");
        game.start_dialogue(vec![DialogueLine::new("Ryan", "Hmm.")]);
        assert_eq!(game.click_hotspot("bench"), ClickOutcome::Blocked);
    }

    #[test]
    fn thoughts_do_not_overlap_and_idle_thoughts_repeat() {
        let (mut game, _) = game();
        game.load_scene("lab", Transition::Instant).expect("lab exists");
        assert!(game.player_think("First."));
        assert!(!game.player_think("Second."));
        game.advance(4000);
        assert!(!game.player().is_thinking());

        game.advance(11_000);
        assert!(game
            .events()
            .iter()
            .any(|event| event == "player.think So many cables."));
    }

    #[test]
    fn character_needs_a_name() {
        let (mut game, _) = game();
        assert!(game.show_character("", 0.0, 0.0, None).is_none());
        let view = game
            .show_character("volkov", 70.0, 80.0, Some(0.4))
            .expect("named character");
        assert_eq!(view.scale, 0.4);
    }

    #[test]
    fn waits_requested_during_a_fade_belong_to_the_incoming_scene() {
        let (mut game, _) = game();
        game.load_scene("lab", Transition::Fade).expect("lab exists");
        assert!(game.scene_timeout(100, |game| game.record("fade wait")).is_some());

        let solved = Rc::new(Cell::new(false));
        let flag = solved.clone();
        game.show_puzzle(
            PuzzleConfig::new("panel", "Panel")
                .answer("open")
                .on_success(move |_| flag.set(true)),
        );
        game.submit_puzzle_answer("open");
        game.advance(60_000);

        assert!(solved.get());
        assert!(!game.is_puzzle_active());
        assert!(game.events().iter().any(|event| event == "fade wait"));
        assert_eq!(game.click_hotspot("bench"), ClickOutcome::Activated);
    }

    #[test]
    fn hotspot_opens_its_puzzle_after_the_other_effects() {
        let (mut game, _) = game();
        game.register_scene(ScriptedScene::new(
            SceneDescriptor::new("server_room", "Server Room").hotspot(
                Hotspot::new("console", "Console", Rect::new(40.0, 40.0, 10.0, 10.0))
                    .look("A login prompt, blinking.")
                    .puzzle(
                        PuzzleConfig::new("root_login", "Root Login")
                            .rot1("the relay keys are in the safe"),
                    ),
            ),
        ));
        game.load_scene("server_room", Transition::Instant).expect("server room exists");

        assert_eq!(game.click_hotspot("console"), ClickOutcome::Activated);
        assert!(game
            .events()
            .iter()
            .any(|event| event == "player.think A login prompt, blinking."));
        assert_eq!(game.puzzle().map(|puzzle| puzzle.kind().label()), Some("rot1"));
        assert_eq!(game.click_hotspot("console"), ClickOutcome::Blocked);
        assert_eq!(game.tune_puzzle(1.0), None);

        assert_eq!(
            game.submit_puzzle_answer("THE RELAY KEYS ARE IN"),
            SubmitOutcome::Solved
        );
        assert!(game.is_puzzle_solved("root_login"));
    }
}
