use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use cq_state::{
    BramSave, DirectoryStorage, FlagValue, SaveData, SaveStorage, DEFAULT_SAVE_KEY,
};
use serde::Serialize;

/// Inspect and patch CyberQuest save slots on disk.
#[derive(Parser, Debug)]
#[command(about = "Inspect and edit CyberQuest save slots", version)]
struct Args {
    /// Directory holding `<slot>.json` save files
    #[arg(long, default_value = "saves")]
    save_dir: PathBuf,

    /// Save slot key
    #[arg(long, default_value = DEFAULT_SAVE_KEY)]
    slot: String,

    /// List every slot in the save directory and exit
    #[arg(long)]
    list: bool,

    /// Replace the slot with a Brammelquest save file before applying edits
    #[arg(long, value_name = "PATH")]
    import_bram: Option<PathBuf>,

    /// Set a flag, `KEY` alone means `KEY=true` (repeatable)
    #[arg(long, value_name = "KEY[=VALUE]")]
    set_flag: Vec<String>,

    /// Remove a flag from the slot (repeatable)
    #[arg(long, value_name = "KEY")]
    clear_flag: Vec<String>,

    /// Overwrite the story part marker
    #[arg(long)]
    story_part: Option<u32>,

    /// Move an active quest to the completed list (repeatable)
    #[arg(long, value_name = "QUEST")]
    complete_quest: Vec<String>,

    /// Path to write a JSON summary of the slot after edits
    #[arg(long)]
    json_report: Option<PathBuf>,

    /// Print every flag instead of only the set ones
    #[arg(long)]
    verbose: bool,
}

#[derive(Serialize)]
struct SlotReport<'a> {
    slot: &'a str,
    existed: bool,
    modified: bool,
    save: &'a SaveData,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut storage = DirectoryStorage::new(&args.save_dir);

    if args.list {
        if args.has_edits() {
            bail!("--list cannot be combined with edit flags");
        }
        let keys = storage
            .keys()
            .with_context(|| format!("listing save slots in {}", args.save_dir.display()))?;
        if keys.is_empty() {
            println!("No save slots in {}", args.save_dir.display());
        }
        for key in keys {
            println!("{key}");
        }
        return Ok(());
    }

    let raw = storage
        .read(&args.slot)
        .with_context(|| format!("reading save slot {}", args.slot))?;
    let existed = raw.is_some();
    let mut save = match raw {
        Some(raw) => SaveData::from_json(&raw)
            .with_context(|| format!("parsing save slot {}", args.slot))?,
        None => {
            log::info!("slot {} does not exist yet; starting from defaults", args.slot);
            SaveData::default()
        }
    };

    let imported = match args.import_bram.as_ref() {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading Brammelquest save {}", path.display()))?;
            let bram = BramSave::from_json(&raw)
                .with_context(|| format!("parsing Brammelquest save {}", path.display()))?;
            log::info!("importing Brammelquest save at scene {}", bram.scene);
            save = bram.into_save_data();
            true
        }
        None => false,
    };

    let modified = apply_edits(&args, &mut save)? || imported;
    if modified {
        save.timestamp = Some(Utc::now());
        let json = save
            .to_json_pretty()
            .context("serializing save slot to JSON")?;
        storage
            .write(&args.slot, &json)
            .with_context(|| format!("writing save slot {}", args.slot))?;
        println!("Updated slot {} in {}", args.slot, args.save_dir.display());
    }

    describe_slot(&args.slot, &save, args.verbose);

    if let Some(path) = args.json_report.as_ref() {
        let report = SlotReport {
            slot: &args.slot,
            existed,
            modified,
            save: &save,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let json =
            serde_json::to_string_pretty(&report).context("serializing slot report to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("writing slot report to {}", path.display()))?;
        println!("Saved slot report to {}", path.display());
    }

    Ok(())
}

impl Args {
    fn has_edits(&self) -> bool {
        self.import_bram.is_some()
            || !self.set_flag.is_empty()
            || !self.clear_flag.is_empty()
            || self.story_part.is_some()
            || !self.complete_quest.is_empty()
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn apply_edits(args: &Args, save: &mut SaveData) -> Result<bool> {
    let state = &mut save.game_state;
    let mut modified = false;

    for assignment in &args.set_flag {
        let (key, value) = parse_flag_assignment(assignment)?;
        if state.flags.set(key.as_str(), value.clone()) {
            log::debug!("flag.set {key} {value}");
            modified = true;
        }
    }

    for key in &args.clear_flag {
        if state.flags.remove(key) {
            log::debug!("flag.clear {key}");
            modified = true;
        } else {
            log::warn!("flag {key} was not present in slot {}", args.slot);
        }
    }

    if let Some(part) = args.story_part {
        if state.story_part != part {
            state.story_part = part;
            modified = true;
        }
    }

    for quest in &args.complete_quest {
        match state.quests.complete(quest) {
            Some(done) => {
                log::debug!("quest.complete {}", done.id);
                modified = true;
            }
            None => bail!("quest {quest} is not active in slot {}", args.slot),
        }
    }

    Ok(modified)
}

fn parse_flag_assignment(assignment: &str) -> Result<(String, FlagValue)> {
    let (key, value) = match assignment.split_once('=') {
        Some((key, raw)) => (key.trim(), FlagValue::parse_literal(raw)),
        None => (assignment.trim(), FlagValue::Bool(true)),
    };
    if key.is_empty() {
        bail!("--set-flag expects KEY or KEY=VALUE, got {assignment:?}");
    }
    Ok((key.to_string(), value))
}

fn describe_slot(slot: &str, save: &SaveData, verbose: bool) {
    let state = &save.game_state;
    println!("Slot: {slot}");
    println!(
        "Scene: {}",
        save.current_scene
            .as_ref()
            .map(|scene| scene.as_str())
            .unwrap_or("(none)")
    );
    println!(
        "Story part: {} | {}",
        state.story_part, state.clock
    );
    if let Some(timestamp) = save.timestamp {
        println!("Saved at: {}", timestamp.to_rfc3339());
    }

    if !save.inventory.is_empty() {
        println!("\nInventory:");
        for item in save.inventory.items() {
            println!("  - {} ({})", item.label(), item.id);
        }
    }

    if !state.quests.active_quests.is_empty() {
        println!("\nActive quests:");
        for quest in &state.quests.active_quests {
            if quest.progress.is_empty() {
                println!("  - {} [{}]", quest.label(), quest.id);
            } else {
                println!(
                    "  - {} [{}] steps: {}",
                    quest.label(),
                    quest.id,
                    quest.progress.join(", ")
                );
            }
        }
    }
    if !state.quests.quests_completed.is_empty() {
        let done: Vec<&str> = state
            .quests
            .quests_completed
            .iter()
            .map(|id| id.as_str())
            .collect();
        println!("\nCompleted quests: {}", done.join(", "));
    }

    if verbose {
        if !state.flags.is_empty() {
            println!("\nFlags:");
            for (key, value) in state.flags.iter() {
                println!("  {key} = {value}");
            }
        }
    } else {
        let set: Vec<&str> = state.flags.set_keys().map(|key| key.as_str()).collect();
        if !set.is_empty() {
            println!("\nFlags set: {}", set.join(", "));
        }
    }

    if !state.evidence.is_empty() {
        println!("\nEvidence:");
        for record in &state.evidence {
            println!("  - {} ({})", record.name, record.id);
        }
    }
}
