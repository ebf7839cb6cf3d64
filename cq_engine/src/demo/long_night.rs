use super::ScriptStep;
use crate::dialogue::DialogueLine;
use crate::game::Game;
use crate::hotspot::{Hotspot, Rect};
use crate::scene::{SceneDescriptor, ScriptedScene, Transition};
use crate::sequence::SectionSequence;

pub(super) const ENTRY_SCENE: &str = "long_night";

const STORY_PART_NIGHT: u32 = 19;
const STORY_PART_DEBRIEF: u32 = 20;
const SEQUENCE_START_MS: u64 = 800;
const DEBRIEF_DELAY_MS: u64 = 5000;

/// Flags set once the whole night has played out.
pub const COMPLETION_FLAGS: [&str; 4] = [
    "long_night_complete",
    "press_sent",
    "news_broken",
    "bnd_called",
];

pub(super) fn install(game: &mut Game) {
    game.register_scene(
        ScriptedScene::new(
            SceneDescriptor::new(ENTRY_SCENE, "The Long Night")
                .background("assets/images/scenes/long_night.svg")
                .background_color("#05070d")
                .hide_player(),
        )
        .on_enter(|game| {
            game.set_story_part(STORY_PART_NIGHT);
            game.set_flag("visited_long_night", true);
            game.scene_timeout(SEQUENCE_START_MS, |game| night_sequence().start(game));
        }),
    );
    game.register_scene(
        ScriptedScene::new(
            SceneDescriptor::new("debrief", "Debrief")
                .background("assets/images/scenes/debrief.svg")
                .player_start(30.0, 85.0)
                .hotspot(
                    Hotspot::new("newspaper", "Morning Paper", Rect::new(40.0, 60.0, 15.0, 10.0))
                        .look_with(|game| {
                            if game.is_flag_set("news_broken") {
                                "Front page. They ran the whole story.".to_string()
                            } else {
                                "Nothing about us. Yet.".to_string()
                            }
                        }),
                ),
        )
        .on_enter(|game| {
            if game.is_flag_set("long_night_complete") {
                game.show_dialogue(
                    ["Nobody slept.", "But it's out there now, and it can't be taken back."],
                    "Ryan",
                );
            }
        }),
    );
}

fn night_sequence() -> SectionSequence {
    SectionSequence::new(vec![
        vec![
            DialogueLine::narration("02:10. The relay goes dark."),
            DialogueLine::new("Eva", "They've noticed. We have maybe an hour."),
            DialogueLine::new("Ryan", "Then we send everything now."),
        ],
        vec![
            DialogueLine::new("Ryan", "Package is encrypted. Sending to the press contact."),
            DialogueLine::new("Eva", "Confirmed. They have it."),
        ],
        vec![
            DialogueLine::narration("05:30. The first headline goes live."),
            DialogueLine::new("Eva", "I'm calling the BND. It's their problem now."),
        ],
    ])
    .then(|game| {
        for flag in COMPLETION_FLAGS {
            game.set_flag(flag, true);
        }
        game.set_story_part(STORY_PART_DEBRIEF);
        game.scene_timeout(DEBRIEF_DELAY_MS, |game| {
            if let Err(err) = game.load_scene("debrief", Transition::Fade) {
                log::error!("could not start the debrief: {err}");
            }
        });
    })
}

pub(super) fn script() -> Vec<ScriptStep> {
    let mut steps = vec![
        ScriptStep::Enter {
            scene: ENTRY_SCENE.to_string(),
            instant: false,
        },
        ScriptStep::Wait { ms: 500 + SEQUENCE_START_MS },
    ];
    for _ in 0..night_sequence().len() {
        steps.push(ScriptStep::SkipDialogue);
        steps.push(ScriptStep::Wait { ms: 250 + 1200 });
    }
    steps.push(ScriptStep::Wait {
        ms: DEBRIEF_DELAY_MS + 1000,
    });
    steps.push(ScriptStep::SkipDialogue);
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::demo::{run_script, Story};

    fn game() -> Game {
        let mut game = Game::new(EngineConfig::default());
        Story::LongNight.install(&mut game);
        game.load_scene(ENTRY_SCENE, Transition::Instant)
            .expect("long night is registered");
        game
    }

    #[test]
    fn entering_marks_the_night() {
        let game = game();
        assert_eq!(game.story_part(), STORY_PART_NIGHT);
        assert!(game.is_flag_set("visited_long_night"));
        assert!(!game.is_dialogue_active());
    }

    #[test]
    fn sequence_starts_after_a_short_delay() {
        let mut game = game();
        game.advance(SEQUENCE_START_MS - 1);
        assert!(!game.is_dialogue_active());
        game.advance(1);
        assert!(game.is_dialogue_active());
    }

    #[test]
    fn leaving_early_skips_the_ending() {
        let mut game = game();
        game.advance(SEQUENCE_START_MS);
        game.load_scene("debrief", Transition::Instant)
            .expect("debrief is registered");
        game.advance(60_000);
        assert!(!game.is_flag_set("long_night_complete"));
        assert_eq!(game.story_part(), STORY_PART_NIGHT);
    }

    #[test]
    fn full_night_ends_in_the_debrief() {
        let mut game = Game::new(EngineConfig::default());
        Story::LongNight.install(&mut game);
        run_script(&mut game, &script()).expect("script runs");

        for flag in COMPLETION_FLAGS {
            assert!(game.is_flag_set(flag), "{flag} should be set");
        }
        assert_eq!(game.story_part(), STORY_PART_DEBRIEF);
        assert_eq!(game.current_scene().map(|id| id.as_str()), Some("debrief"));
        assert!(!game.is_scene_loading());
    }
}
