use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::logger;

use self::{play::PlayArg, simulate::SimulateArg};

mod play;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
    /// Write log records to this file
    #[clap(long, global = true)]
    log_file: Option<PathBuf>,
    /// Most verbose level written to the log file
    #[clap(long, global = true, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play in the terminal
    Play(#[clap(flatten)] PlayArg),
    /// Run a headless game driven by random input and report the result as JSON
    Simulate(#[clap(flatten)] SimulateArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    if let Some(path) = &args.log_file {
        logger::init(path, args.log_level)?;
    }
    match args.mode.unwrap_or(Mode::Play(PlayArg::default())) {
        Mode::Play(arg) => play::run(&arg)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
    }
    Ok(())
}
