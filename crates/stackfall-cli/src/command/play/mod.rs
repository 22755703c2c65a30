use ratatui_runtime::Runtime;
use stackfall_engine::{Difficulty, GameSession, PieceSeed};

use self::app::PlayApp;

mod app;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Difficulty highlighted in the start menu
    #[clap(long)]
    difficulty: Option<Difficulty>,
    /// Seed for the piece sequence (32 hex digits); random when omitted
    #[clap(long)]
    seed: Option<PieceSeed>,
    /// Frames per second for gravity updates and rendering
    #[clap(long, default_value_t = 60.0)]
    fps: f64,
}

impl Default for PlayArg {
    fn default() -> Self {
        Self {
            difficulty: None,
            seed: None,
            fps: 60.0,
        }
    }
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        difficulty,
        seed,
        fps,
    } = arg;

    anyhow::ensure!(*fps > 0.0, "--fps must be positive, got {fps}");
    let session = seed.map_or_else(GameSession::new, GameSession::with_seed);
    let mut app = PlayApp::new(session, difficulty.unwrap_or(Difficulty::Normal), *fps);
    Runtime::new().run(&mut app)?;

    let stats = app.session().stats();
    println!(
        "score {} | best {} | lines {} | pieces {}",
        stats.score(),
        app.session().best_score(),
        stats.total_cleared_lines(),
        stats.completed_pieces()
    );
    Ok(())
}
