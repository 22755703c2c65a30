use std::time::Duration;

use serde::Serialize;

use crate::core::{
    field::Field,
    piece::{Piece, PieceKind},
};

use super::{
    difficulty::Difficulty,
    session::{CountdownStep, GameSession, SessionState},
    stats::GameStats,
};

/// Read-only view of a session, taken once per frame by front ends.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub countdown: Option<CountdownStep>,
    pub difficulty: Option<Difficulty>,
    pub field: Field,
    pub active: Piece,
    /// Landing placement of the active piece.
    pub ghost: Piece,
    pub ghost_row: i32,
    pub next: PieceKind,
    pub held: Option<PieceKind>,
    pub hold_available: bool,
    pub stats: GameStats,
    pub best_score: u64,
    pub elapsed_ms: u64,
    pub paused_ms: u64,
    pub drop_interval_ms: u64,
    pub pieces_per_minute: f64,
    pub danger_zone: bool,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl SessionSnapshot {
    #[must_use]
    pub fn capture(session: &GameSession) -> Self {
        let ghost = session.ghost_piece();
        let elapsed = session.elapsed();
        Self {
            state: session.state(),
            countdown: session.countdown(),
            difficulty: session.difficulty(),
            field: session.field().clone(),
            active: *session.active_piece(),
            ghost,
            ghost_row: ghost.position().y(),
            next: session.next_piece(),
            held: session.held_piece(),
            hold_available: session.hold_available(),
            stats: session.stats().clone(),
            best_score: session.best_score(),
            elapsed_ms: millis(elapsed),
            paused_ms: millis(session.total_paused()),
            drop_interval_ms: millis(session.effective_drop_interval()),
            pieces_per_minute: session.stats().pieces_per_minute(elapsed),
            danger_zone: session.field().is_in_danger_zone(),
        }
    }
}
