use anyhow::Result;
use cq_engine::cli::{self, Command};
use cq_engine::runtime;

fn main() -> Result<()> {
    let (command, verbose) = cli::parse()?;
    init_logging(verbose);

    match command {
        Command::Play(args) => runtime::execute(args),
        Command::PrintScript(story) => runtime::print_script(story),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
