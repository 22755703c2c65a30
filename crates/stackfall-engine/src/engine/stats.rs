use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::piece::PieceKind;

use super::difficulty::DifficultyParams;

/// Points per cleared line, before the combo bonus.
const LINE_CLEAR_POINTS: u32 = 100;
/// Bonus per combo step beyond the first consecutive clear.
const COMBO_BONUS_POINTS: u32 = 50;

/// Score and counters of a single session.
///
/// # Scoring
///
/// Every locked piece awards its base value scaled by the difficulty
/// multiplier. A lock that clears lines also extends the combo and awards
/// `lines * 100 + (combo - 1) * 50`, scaled the same way. A lock that clears
/// nothing breaks the combo.
///
/// # Example
///
/// ```
/// use stackfall_engine::{DifficultyParams, GameStats, PieceKind};
///
/// let params = DifficultyParams::default();
/// let mut stats = GameStats::new();
/// let points = stats.record_lock(PieceKind::I, 1, &params);
///
/// assert_eq!(points, 150);
/// assert_eq!(stats.combo(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    score: u64,
    total_cleared_lines: usize,
    combo: u32,
    max_combo: u32,
    completed_pieces: usize,
    piece_counter: [usize; PieceKind::LEN],
    line_cleared_counter: [usize; 5],
}

impl GameStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            total_cleared_lines: 0,
            combo: 0,
            max_combo: 0,
            completed_pieces: 0,
            piece_counter: [0; PieceKind::LEN],
            line_cleared_counter: [0; 5],
        }
    }

    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub const fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    /// Number of consecutive clearing locks up to and including the last one.
    #[must_use]
    pub const fn combo(&self) -> u32 {
        self.combo
    }

    #[must_use]
    pub const fn max_combo(&self) -> u32 {
        self.max_combo
    }

    #[must_use]
    pub const fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    /// Locked pieces per kind, indexed by [`PieceKind::index`].
    #[must_use]
    pub const fn piece_counter(&self) -> &[usize; PieceKind::LEN] {
        &self.piece_counter
    }

    #[must_use]
    pub const fn piece_count(&self, kind: PieceKind) -> usize {
        self.piece_counter[kind.index()]
    }

    /// Returns a histogram of locks by number of lines cleared.
    ///
    /// Index 0 counts locks that cleared nothing, index 4 counts four-line clears.
    #[must_use]
    pub const fn line_cleared_counter(&self) -> &[usize; 5] {
        &self.line_cleared_counter
    }

    /// Locked pieces per minute over `elapsed` play time.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn pieces_per_minute(&self, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.completed_pieces as f64 * 60.0 / secs
    }

    /// Updates the counters for a locked piece and returns the points awarded.
    pub fn record_lock(
        &mut self,
        kind: PieceKind,
        cleared_lines: usize,
        params: &DifficultyParams,
    ) -> u64 {
        self.completed_pieces += 1;
        self.piece_counter[kind.index()] += 1;
        if let Some(count) = self.line_cleared_counter.get_mut(cleared_lines) {
            *count += 1;
        }

        let mut points = params.apply_multiplier(kind.base_score());
        if cleared_lines > 0 {
            self.total_cleared_lines += cleared_lines;
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
            let combo_bonus = (self.combo - 1) * COMBO_BONUS_POINTS;
            let lines = u32::try_from(cleared_lines).unwrap_or(u32::MAX);
            let clear_points = lines
                .saturating_mul(LINE_CLEAR_POINTS)
                .saturating_add(combo_bonus);
            points += params.apply_multiplier(clear_points);
        } else {
            self.combo = 0;
        }
        self.score += points;
        points
    }
}
