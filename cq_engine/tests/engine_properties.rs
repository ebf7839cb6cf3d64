use std::cell::RefCell;
use std::rc::Rc;

use cq_engine::evidence::DocumentContent;
use cq_engine::hotspot::{Condition, Hotspot, Rect};
use cq_engine::puzzle::{answer_matches, PuzzleState};
use cq_engine::{
    ChatKind, ChatMessage, ClickOutcome, ConversationConfig, DialogueLine, DocumentKind,
    EngineConfig, EvidenceDocument, Game, Key, PresentationEvent, PuzzleConfig,
    RecordingPresenter, SceneDescriptor, ScriptedScene, SubmitOutcome, Transition,
};

fn game_with_scenes() -> Game {
    let mut game = Game::new(EngineConfig::default());
    game.register_scene(
        ScriptedScene::new(
            SceneDescriptor::new("office", "Office")
                .idle_thoughts(["Quiet in here."])
                .hotspot(
                    Hotspot::new("desk", "Desk", Rect::new(10.0, 50.0, 20.0, 20.0))
                        .look("Papers."),
                ),
        )
        .on_enter(|game| {
            game.show_character("eva", 70.0, 85.0, None);
            game.scene_timeout(10_000, |game| {
                game.set_flag("office_timer_fired", true);
            });
        }),
    );
    game.register_scene(ScriptedScene::new(SceneDescriptor::new("street", "Street")));
    game
}

#[test]
fn flags_are_idempotent_and_unset_keys_are_falsy() {
    let mut game = Game::new(EngineConfig::default());
    assert!(!game.is_flag_set("never_written"));
    assert!(game.flag("never_written").is_none());

    assert!(game.set_flag("met_eva", true));
    let events_after_first = game.events().len();
    assert!(!game.set_flag("met_eva", true));
    assert_eq!(game.events().len(), events_after_first);
    assert!(game.is_flag_set("met_eva"));

    game.set_flag("coffee_count", 0);
    assert!(!game.is_flag_set("coffee_count"));
    assert!(Condition::not_flag("coffee_count").evaluate(&game));
}

#[test]
fn puzzle_answers_are_normalized() {
    let answers = vec!["Relay7".to_string(), "backup".to_string()];
    assert!(answer_matches("  relay7 ", &answers, false));
    assert!(answer_matches("BACKUP", &answers, false));
    assert!(answer_matches("Relay7", &answers, true));
    assert!(!answer_matches("relay7", &answers, true));
    assert!(!answer_matches("relay", &answers, false));
}

#[test]
fn puzzle_exhausts_after_max_attempts() {
    let failures = Rc::new(RefCell::new(Vec::new()));
    let seen = failures.clone();
    let mut game = game_with_scenes();
    game.load_scene("office", Transition::Instant).expect("office exists");
    game.show_puzzle(
        PuzzleConfig::new("vault", "Vault")
            .answer("4242")
            .max_attempts(2)
            .on_failure(move |_, kind| seen.borrow_mut().push(kind)),
    );

    assert!(matches!(
        game.submit_puzzle_answer("1111"),
        SubmitOutcome::Wrong { remaining: Some(1) }
    ));
    assert_eq!(game.submit_puzzle_answer("2222"), SubmitOutcome::Exhausted);
    assert_eq!(game.puzzle().map(|puzzle| puzzle.state()), Some(PuzzleState::Exhausted));
    // the correct answer no longer counts
    assert_eq!(game.submit_puzzle_answer("4242"), SubmitOutcome::Rejected);
    assert_eq!(game.puzzle().map(|puzzle| puzzle.attempts()), Some(2));
    assert_eq!(game.click_hotspot("desk"), ClickOutcome::Blocked);

    game.advance(2000);
    assert!(!game.is_puzzle_active());
    assert!(!game.is_puzzle_solved("vault"));
    assert_eq!(failures.borrow().len(), 2);
}

#[test]
fn document_pages_stay_in_bounds() {
    let mut game = Game::new(EngineConfig::default());
    let report = EvidenceDocument::new(
        "relay_report",
        DocumentKind::Report,
        "Relay Report",
        DocumentContent::Pages(vec![
            "Page one".to_string(),
            "Page two".to_string(),
            "Page three".to_string(),
        ]),
    );
    game.show_document(report);
    assert_eq!(game.evidence().current_page(), 1);
    assert!(game.previous_page().is_none());
    assert!(game.next_page().is_some());
    assert!(game.next_page().is_some());
    assert!(game.next_page().is_none());
    assert_eq!(game.evidence().current_page(), 3);
    assert!(game.previous_page().is_some());
    assert_eq!(game.evidence().current_page(), 2);

    let email = EvidenceDocument::new(
        "paged_email",
        DocumentKind::Email,
        "Email",
        DocumentContent::Pages(vec!["a".to_string(), "b".to_string()]),
    );
    game.show_document(email);
    assert_eq!(game.evidence().total_pages(), 1);
    assert!(game.next_page().is_none());
}

#[test]
fn only_one_conversation_is_open_and_close_runs_first() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let conversation = |id: &'static str| {
        let closed = order.clone();
        let opened = order.clone();
        ConversationConfig::new(id, ChatKind::Meshtastic, id)
            .message(ChatMessage::new(id, "hello"))
            .on_open(move |_| opened.borrow_mut().push(format!("open {id}")))
            .on_close(move |_| closed.borrow_mut().push(format!("close {id}")))
    };

    let mut game = Game::new(EngineConfig::default());
    game.show_conversation(conversation("mesh_a"));
    game.show_conversation(conversation("mesh_b"));
    assert_eq!(
        *order.borrow(),
        ["open mesh_a", "close mesh_a", "open mesh_b"]
    );
    assert!(game.chat().is_showing("mesh_b"));
    assert!(!game.chat().is_showing("mesh_a"));
    assert!(game.has_viewed_conversation("mesh_a"));

    assert!(game.handle_key(Key::Escape));
    assert!(!game.chat().is_open());
    assert_eq!(order.borrow().last().map(String::as_str), Some("close mesh_b"));
}

#[test]
fn leaving_a_scene_cleans_up_after_it() {
    let presenter = RecordingPresenter::new();
    let mut game = game_with_scenes().with_presenter(Rc::new(presenter.clone()));
    game.load_scene("office", Transition::Instant).expect("office exists");
    let office_scope = game.scene_scope();
    assert!(game.pending_in(office_scope) > 0);
    assert_eq!(game.characters().characters().len(), 1);

    game.start_dialogue(vec![DialogueLine::new("Eva", "Stay a moment.")]);
    game.show_document(EvidenceDocument::text("memo", "Memo", "Burn after reading."));
    game.show_puzzle(PuzzleConfig::new("lock", "Lock").answer("1"));

    game.load_scene("street", Transition::Fade).expect("street exists");
    assert_eq!(game.pending_in(office_scope), 0);
    assert!(game.characters().is_empty());
    assert!(!game.is_dialogue_active());
    assert!(!game.evidence().is_open());
    assert!(!game.is_puzzle_active());

    game.advance(20_000);
    assert_eq!(game.current_scene().map(|id| id.as_str()), Some("street"));
    assert!(!game.is_flag_set("office_timer_fired"));
    assert!(presenter
        .events()
        .iter()
        .any(|event| matches!(event, PresentationEvent::CharactersCleared)));
}

#[test]
fn on_read_fires_only_for_the_first_view() {
    let reads = Rc::new(RefCell::new(0));
    let mut game = Game::new(EngineConfig::default());
    for _ in 0..3 {
        let counter = reads.clone();
        game.show_document_then(
            EvidenceDocument::text("readme", "README", "Trust no relay."),
            move |_| *counter.borrow_mut() += 1,
        );
        game.close_document();
    }
    game.show_document(EvidenceDocument::text("notes", "Notes", "14.230 MHz"));

    assert_eq!(*reads.borrow(), 1);
    let history: Vec<&str> = game
        .viewed_documents()
        .iter()
        .map(|id| id.as_str())
        .collect();
    assert_eq!(history, ["readme", "notes"]);
}
