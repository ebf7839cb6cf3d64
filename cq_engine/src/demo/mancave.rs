use cq_state::{EvidenceRecord, Item, Quest};

use super::ScriptStep;
use crate::chat::{ChatKind, ChatMessage, ConversationConfig};
use crate::dialogue::{monologue, DialogueLine};
use crate::evidence::EvidenceDocument;
use crate::game::{Game, Key};
use crate::hotspot::{Condition, Hotspot, Rect};
use crate::puzzle::{FailureKind, FrequencyDial, PuzzleConfig};
use crate::scene::{SceneDescriptor, ScriptedScene};

pub(super) const ENTRY_SCENE: &str = "mancave";

const EVA_CHAT: &str = "eva_signal";
const MESSAGE_DELAY_MS: u64 = 1500;

pub(super) fn install(game: &mut Game) {
    game.register_scene(ScriptedScene::new(mancave()));
    game.register_scene(
        ScriptedScene::new(garden()).on_enter(|game| {
            if game.set_flag("visited_garden", true) {
                game.show_dialogue(
                    [
                        "Cold air. Good for thinking.",
                        "The antenna mast is still standing, at least.",
                    ],
                    "Ryan",
                );
            }
        }),
    );
    game.on_item_use("usb_stick", |game| {
        game.player_think("Not plugging this into anything that touches the internet.");
    });
}

fn mancave() -> SceneDescriptor {
    SceneDescriptor::new(ENTRY_SCENE, "Ryan's Mancave")
        .background("assets/images/scenes/mancave.svg")
        .player_start(50.0, 85.0)
        .idle_thoughts([
            "The radios are quiet tonight.",
            "I should really label these cables.",
            "Coffee. Then decoding.",
        ])
        .hotspot(
            Hotspot::new("sstv-terminal", "SSTV Terminal", Rect::new(10.0, 40.0, 15.0, 20.0))
                .look("The SSTV receiver is still decoding something.")
                .action(decode_transmission),
        )
        .hotspot(
            Hotspot::new("drawer", "Desk Drawer", Rect::new(30.0, 62.0, 10.0, 10.0))
                .enabled_when(
                    Condition::Not(Box::new(Condition::has_item("usb_stick"))),
                    Some("Nothing else in there."),
                )
                .look("Someone taped a USB stick under the drawer.")
                .gives(
                    Item::new("usb_stick", "USB Stick")
                        .with_description("Unlabelled. Found taped inside the desk drawer."),
                ),
        )
        .hotspot(
            Hotspot::new("airgapped-laptop", "Air-gapped Laptop", Rect::new(45.0, 45.0, 12.0, 12.0))
                .requires(
                    Condition::has_item("usb_stick"),
                    Some("I need something to analyze first."),
                )
                .action(analyze_usb),
        )
        .hotspot(
            Hotspot::new("laptop", "Laptop", Rect::new(60.0, 45.0, 12.0, 12.0))
                .action(open_eva_chat),
        )
        .hotspot(
            Hotspot::new("safe", "Wall Safe", Rect::new(75.0, 40.0, 10.0, 15.0))
                .requires(
                    Condition::flag("sstv_decoded"),
                    Some("I don't know the combination. Yet."),
                )
                .action(|game| game.show_puzzle(safe_puzzle())),
        )
        .hotspot(
            Hotspot::new("door", "Back Door", Rect::new(90.0, 30.0, 10.0, 60.0))
                .requires(
                    Condition::flag("usb_analyzed"),
                    Some("I should check that USB stick before I go anywhere."),
                )
                .leads_to("garden"),
        )
}

fn garden() -> SceneDescriptor {
    SceneDescriptor::new("garden", "Back Garden")
        .background("assets/images/scenes/garden.svg")
        .player_start(20.0, 85.0)
        .idle_thoughts(["The mast creaks in the wind."])
        .hotspot(
            Hotspot::new("antenna", "Antenna Mast", Rect::new(55.0, 5.0, 8.0, 70.0))
                .look_with(|game| {
                    if game.is_puzzle_solved("safe_code") {
                        "Tuned to the frequency from the safe log.".to_string()
                    } else {
                        "A tall mast. Tuned to nothing in particular.".to_string()
                    }
                }),
        )
        .hotspot(
            Hotspot::new("transceiver", "Transceiver", Rect::new(30.0, 55.0, 12.0, 10.0))
                .requires(
                    Condition::has_item("frequency_log"),
                    Some("No idea where to listen. The log from the safe would help."),
                )
                .puzzle(relay_tuning()),
        )
        .hotspot(
            Hotspot::new("back-door", "Back Door", Rect::new(0.0, 30.0, 10.0, 60.0))
                .skip_walk()
                .leads_to(ENTRY_SCENE),
        )
}

fn decode_transmission(game: &mut Game) {
    if !game.set_flag("sstv_decoded", true) {
        return;
    }
    game.add_quest(
        Quest::new("decode_message", "Decipher the Message")
            .with_description("The SSTV burst carried a string of numbers.")
            .with_hint("The wall safe takes four digits."),
    );
    game.start_dialogue(vec![
        DialogueLine::new("Ryan", "That is not a normal slow-scan picture."),
        DialogueLine::new("Ryan", "Four digits, repeated: 1... 3... 3... 7."),
        DialogueLine::narration("The image dissolves into static."),
    ]);
}

fn analyze_usb(game: &mut Game) {
    let readme = EvidenceDocument::text(
        "usb_readme",
        "README.txt",
        "If you are reading this, the relay station is compromised.\n\n\
         Do not trust the frequency plan in the public logs.\n\n\
         Talk to Eva. She knows who sent the burst.",
    )
    .by("Unknown")
    .dated("2026-02-11");
    game.show_document_then(readme, |game| {
        game.set_flag("usb_analyzed", true);
        game.add_evidence(
            EvidenceRecord::new("usb_readme", "USB README")
                .with_description("Warning about the compromised relay station."),
        );
        game.update_quest_progress("decode_message", "Read the README on the USB stick");
    });
}

fn open_eva_chat(game: &mut Game) {
    let config = ConversationConfig::new(EVA_CHAT, ChatKind::Signal, "Eva")
        .subtitle("Safety number verified")
        .message(ChatMessage::new("Eva", "You awake?").at("22:41"))
        .on_reply(|game, message| {
            log::info!("Ryan replied to Eva: {}", message.text);
            if game.set_flag("replied_to_eva", true) {
                game.send_messages_with_delay(
                    EVA_CHAT,
                    vec![ChatMessage::new("Eva", "Good. Bring the stick. Tell *nobody*.")],
                    MESSAGE_DELAY_MS,
                );
            }
        });
    game.show_conversation(config);

    if game.set_flag("eva_briefed", true) {
        game.send_messages_with_delay(
            EVA_CHAT,
            vec![
                ChatMessage::new("Eva", "I caught the same burst on 14.230."),
                ChatMessage::new("Eva", "Someone is using our net to talk. Check https://example.org/relay"),
            ],
            MESSAGE_DELAY_MS,
        );
    }
}

fn safe_puzzle() -> PuzzleConfig {
    PuzzleConfig::new("safe_code", "Wall Safe")
        .description("A four digit keypad. The display blinks patiently.")
        .answer("1337")
        .numeric()
        .max_attempts(3)
        .placeholder("####")
        .hint("The SSTV burst repeated the same four digits.")
        .completes_quest("decode_message")
        .on_success(|game| {
            game.add_item(
                Item::new("frequency_log", "Frequency Log")
                    .with_description("Handwritten list of relay frequencies."),
            );
            game.show_character("eva", 80.0, 85.0, None);
            game.start_dialogue(monologue(
                "Eva",
                ["You opened it. Then you've seen the log.", "We go tonight."],
            ));
        })
        .on_failure(|game, kind| match kind {
            FailureKind::Wrong { .. } => {
                game.player_think("Not that one.");
            }
            FailureKind::Exhausted => {
                game.player_think("Locked out. I'll try again later.");
            }
        })
}

fn relay_tuning() -> PuzzleConfig {
    PuzzleConfig::new("relay_frequency", "Relay Transceiver")
        .description("The log lists the relay net on 145.8 MHz. Tune in and lock it.")
        .frequency(FrequencyDial::new(145.8))
        .hint("Watch the signal meter; it peaks on the right frequency.")
        .on_success(|game| {
            game.player_think("There it is. The relay net, loud and clear.");
        })
}

pub(super) fn script() -> Vec<ScriptStep> {
    let click = |hotspot: &str| ScriptStep::Click {
        hotspot: hotspot.to_string(),
    };
    vec![
        ScriptStep::Enter {
            scene: ENTRY_SCENE.to_string(),
            instant: false,
        },
        ScriptStep::Wait { ms: 1000 },
        click("safe"),
        click("sstv-terminal"),
        ScriptStep::SkipDialogue,
        click("drawer"),
        click("airgapped-laptop"),
        ScriptStep::NextPage,
        ScriptStep::Key { key: Key::Escape },
        click("laptop"),
        ScriptStep::Wait {
            ms: 2 * MESSAGE_DELAY_MS,
        },
        ScriptStep::Reply {
            text: "On my way.".to_string(),
        },
        ScriptStep::Wait {
            ms: MESSAGE_DELAY_MS,
        },
        ScriptStep::Key { key: Key::Escape },
        click("safe"),
        ScriptStep::Answer {
            text: "0000".to_string(),
        },
        ScriptStep::Answer {
            text: "1337".to_string(),
        },
        ScriptStep::Wait { ms: 1500 },
        ScriptStep::SkipDialogue,
        ScriptStep::Save,
        click("door"),
        ScriptStep::Wait { ms: 1300 },
        ScriptStep::SkipDialogue,
        click("transceiver"),
        ScriptStep::Tune { delta_mhz: 45.8 },
        ScriptStep::Answer {
            text: String::new(),
        },
        ScriptStep::Wait { ms: 1500 },
    ]
}
