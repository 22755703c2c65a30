use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use chrono::{DateTime, Local};
use log::info;
use rand::{Rng as _, SeedableRng as _, seq::IndexedRandom as _};
use rand_pcg::Pcg32;
use serde::Serialize;
use stackfall_engine::{Command, Difficulty, GameEvent, GameSession, PieceSeed, SessionSnapshot};

use crate::util;

const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);

/// Moves the bot picks from, with relative weights.
const BOT_MOVES: &[(&str, u32)] = &[
    ("left", 6),
    ("right", 6),
    ("rotate", 4),
    ("soft-drop-on", 2),
    ("soft-drop-off", 2),
    ("hard-drop", 2),
    ("hold", 1),
];

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Difficulty preset
    #[clap(long, default_value = "normal")]
    difficulty: Difficulty,
    /// Seed for the piece sequence (32 hex digits); random when omitted
    #[clap(long)]
    seed: Option<PieceSeed>,
    /// Seed for the bot's input choices; random when omitted
    #[clap(long)]
    bot_seed: Option<u64>,
    /// Maximum number of frames to simulate
    #[clap(long, default_value_t = 36_000)]
    frames: u64,
    /// Simulated frames per second
    #[clap(long, default_value_t = 60.0)]
    fps: f64,
    /// Chance per frame that the bot issues a command
    #[clap(long, default_value_t = 0.2)]
    input_rate: f64,
    /// Output file path for the JSON report (stdout when omitted)
    #[clap(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    recorded_at: DateTime<Local>,
    seed: PieceSeed,
    bot_seed: u64,
    difficulty: Difficulty,
    fps: f64,
    #[serde(flatten)]
    outcome: SimulationOutcome,
}

#[derive(Debug, Serialize)]
struct SimulationOutcome {
    frames: u64,
    commands_accepted: u64,
    commands_rejected: u64,
    line_clears: usize,
    snapshot: SessionSnapshot,
}

#[derive(Debug, Clone, Copy)]
struct SimulationConfig {
    difficulty: Difficulty,
    frames: u64,
    frame_time: Duration,
    input_rate: f64,
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        difficulty,
        seed,
        bot_seed,
        frames,
        fps,
        input_rate,
        output,
    } = arg;

    anyhow::ensure!(*fps > 0.0, "--fps must be positive, got {fps}");
    anyhow::ensure!(
        (0.0..=1.0).contains(input_rate),
        "--input-rate must be between 0 and 1, got {input_rate}"
    );

    let seed = seed.unwrap_or_else(|| rand::rng().random());
    let bot_seed = bot_seed.unwrap_or_else(|| rand::rng().random());
    let config = SimulationConfig {
        difficulty: *difficulty,
        frames: *frames,
        frame_time: Duration::from_secs_f64(1.0 / fps),
        input_rate: *input_rate,
    };

    info!("simulating {frames} frames at {fps} fps, seed {seed}, bot seed {bot_seed}");
    let outcome = simulate(GameSession::with_seed(seed), bot_seed, config)?;
    info!(
        "simulation finished after {} frames with score {}",
        outcome.frames,
        outcome.snapshot.stats.score()
    );

    let report = SimulationReport {
        recorded_at: Local::now(),
        seed,
        bot_seed,
        difficulty: *difficulty,
        fps: *fps,
        outcome,
    };
    util::save_json(&report, output.as_deref())
}

fn bot_command(rng: &mut Pcg32) -> anyhow::Result<Command> {
    let (word, _) = BOT_MOVES.choose_weighted(rng, |(_, weight)| *weight)?;
    word.parse()
        .with_context(|| format!("Invalid bot command: {word}"))
}

/// Runs the session until game over or until the frame limit.
fn simulate(
    mut session: GameSession,
    bot_seed: u64,
    config: SimulationConfig,
) -> anyhow::Result<SimulationOutcome> {
    let mut bot = Pcg32::seed_from_u64(bot_seed);
    session.select_difficulty(config.difficulty)?;
    session.start()?;

    let mut commands_accepted = 0;
    let mut commands_rejected = 0;
    let mut line_clears = 0;
    let mut countdown_elapsed = Duration::ZERO;
    let mut frames = 0;

    while frames < config.frames && !session.state().is_game_over() {
        frames += 1;
        if session.state().is_countdown() {
            countdown_elapsed += config.frame_time;
            if countdown_elapsed >= COUNTDOWN_INTERVAL {
                countdown_elapsed -= COUNTDOWN_INTERVAL;
                session.tick_countdown()?;
            }
        } else if bot.random_bool(config.input_rate) {
            match session.apply(bot_command(&mut bot)?) {
                Ok(()) => commands_accepted += 1,
                Err(_) => commands_rejected += 1,
            }
        }
        session.advance_time(config.frame_time);
        line_clears += session
            .drain_events()
            .iter()
            .filter(|event| matches!(event, GameEvent::LinesCleared { .. }))
            .count();
    }

    Ok(SimulationOutcome {
        frames,
        commands_accepted,
        commands_rejected,
        line_clears,
        snapshot: session.snapshot(),
    })
}
