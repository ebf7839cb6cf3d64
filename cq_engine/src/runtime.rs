use std::{fs, path::Path, rc::Rc};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cq_state::{DirectoryStorage, MemoryStorage, SaveStorage};
use serde::Serialize;

use crate::cli::PlayArgs;
use crate::config::EngineConfig;
use crate::demo::{self, ScriptStep, Story};
use crate::game::Game;
use crate::presenter::{Presenter, RecordingPresenter};

#[derive(Serialize)]
struct EventLog<'a> {
    story: Story,
    elapsed_ms: u64,
    events: &'a [String],
}

#[derive(Serialize)]
struct RunReport<'a> {
    generated_at: DateTime<Utc>,
    story: Story,
    steps: usize,
    elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    scene: Option<&'a str>,
    story_part: u32,
    clock: String,
    flags: Vec<&'a str>,
    inventory: Vec<&'a str>,
    active_quests: Vec<&'a str>,
    completed_quests: Vec<&'a str>,
    pending_timers: usize,
}

pub fn execute(args: PlayArgs) -> Result<()> {
    let PlayArgs {
        story,
        script,
        config,
        save_dir,
        resume,
        settle_ms,
        event_log_json,
        presentation_log_json,
        report_json,
    } = args;

    let config = match config.as_ref() {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let steps = match script.as_ref() {
        Some(path) => load_script(path)?,
        None => story.script(),
    };
    let storage: Box<dyn SaveStorage> = match save_dir {
        Some(dir) => Box::new(DirectoryStorage::new(dir)),
        None => Box::new(MemoryStorage::new()),
    };

    let recorder = presentation_log_json
        .as_ref()
        .map(|_| Rc::new(RecordingPresenter::new()));
    let mut game = Game::new(config).with_storage(storage);
    if let Some(recorder) = recorder.as_ref() {
        game = game.with_presenter(recorder.clone() as Rc<dyn Presenter>);
    }
    story.install(&mut game);
    log::info!("installed story {story:?}, {} script steps", steps.len());

    if resume {
        game.load_game().context("resuming from the save slot")?;
        let settle = game.config().transition_ms * 2;
        game.advance(settle);
    }
    demo::run_script(&mut game, &steps).context("playing the input script")?;
    if settle_ms > 0 {
        game.advance(settle_ms);
    }

    println!(
        "{story:?}: {} steps in {} ms of game time, ended in {}",
        steps.len(),
        game.now_ms(),
        game.current_scene()
            .map(|scene| scene.as_str())
            .unwrap_or("<no scene>")
    );
    println!("Clock: {} | story part {}", game.clock(), game.story_part());

    if let Some(path) = event_log_json.as_ref() {
        let log = EventLog {
            story,
            elapsed_ms: game.now_ms(),
            events: game.events(),
        };
        write_json(path, &log, "engine event log")?;
    }

    if let (Some(path), Some(recorder)) = (presentation_log_json.as_ref(), recorder) {
        write_json(path, &recorder.events(), "presentation log")?;
    }

    if let Some(path) = report_json.as_ref() {
        let report = build_report(&game, story, steps.len());
        write_json(path, &report, "run report")?;
    }

    Ok(())
}

pub fn print_script(story: Story) -> Result<()> {
    let json = serde_json::to_string_pretty(&story.script())
        .context("serializing input script to JSON")?;
    println!("{json}");
    Ok(())
}

fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading input script {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing input script {}", path.display()))
}

fn build_report(game: &Game, story: Story, steps: usize) -> RunReport<'_> {
    let state = game.state();
    RunReport {
        generated_at: Utc::now(),
        story,
        steps,
        elapsed_ms: game.now_ms(),
        scene: game.current_scene().map(|scene| scene.as_str()),
        story_part: state.story_part,
        clock: state.clock.to_string(),
        flags: state.flags.set_keys().map(|key| key.as_str()).collect(),
        inventory: game
            .inventory()
            .items()
            .iter()
            .map(|item| item.id.as_str())
            .collect(),
        active_quests: state
            .quests
            .active_quests
            .iter()
            .map(|quest| quest.id.as_str())
            .collect(),
        completed_quests: state
            .quests
            .quests_completed
            .iter()
            .map(|quest| quest.as_str())
            .collect(),
        pending_timers: game.pending_timers(),
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, what: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serializing {what} to JSON"))?;
    fs::write(path, json).with_context(|| format!("writing {what} to {}", path.display()))?;
    println!("Saved {what} to {}", path.display());
    Ok(())
}
