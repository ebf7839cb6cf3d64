use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use crate::demo::Story;

#[derive(Parser, Debug)]
#[command(
    about = "Headless CyberQuest engine host that plays a story on a virtual clock",
    version
)]
pub struct Args {
    /// Built-in story to install
    #[arg(long, value_enum, default_value_t = Story::Mancave)]
    pub story: Story,

    /// JSON input script to play instead of the story's built-in one
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Print the story's built-in input script as JSON and exit
    #[arg(long)]
    pub print_script: bool,

    /// Engine config JSON; omitted fields keep their defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for save slots (in-memory saves when omitted)
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// Restore the save slot before playing the script
    #[arg(long)]
    pub resume: bool,

    /// Extra virtual milliseconds to run once the script is done
    #[arg(long, default_value_t = 0)]
    pub settle_ms: u64,

    /// Path to write the engine event log as JSON
    #[arg(long)]
    pub event_log_json: Option<PathBuf>,

    /// Path to write everything the presenter was asked to show as JSON
    #[arg(long)]
    pub presentation_log_json: Option<PathBuf>,

    /// Path to write a JSON summary of the final game state
    #[arg(long)]
    pub report_json: Option<PathBuf>,

    /// Log engine internals at debug level
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug)]
pub enum Command {
    Play(PlayArgs),
    PrintScript(Story),
}

#[derive(Debug)]
pub struct PlayArgs {
    pub story: Story,
    pub script: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub save_dir: Option<PathBuf>,
    pub resume: bool,
    pub settle_ms: u64,
    pub event_log_json: Option<PathBuf>,
    pub presentation_log_json: Option<PathBuf>,
    pub report_json: Option<PathBuf>,
}

pub fn parse() -> Result<(Command, bool)> {
    let args = Args::parse();
    let verbose = args.verbose;
    Ok((args.into_command()?, verbose))
}

impl Args {
    pub fn into_command(self) -> Result<Command> {
        if self.print_script {
            if self.script.is_some() {
                bail!("--print-script cannot be combined with --script");
            }
            return Ok(Command::PrintScript(self.story));
        }
        if self.resume && self.save_dir.is_none() {
            bail!("--resume requires --save-dir");
        }

        Ok(Command::Play(PlayArgs {
            story: self.story,
            script: self.script,
            config: self.config,
            save_dir: self.save_dir,
            resume: self.resume,
            settle_ms: self.settle_ms,
            event_log_json: self.event_log_json,
            presentation_log_json: self.presentation_log_json,
            report_json: self.report_json,
        }))
    }
}
