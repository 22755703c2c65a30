use std::time::Duration;

use log::{debug, info};
use serde::Serialize;

use crate::{
    CommandError,
    core::{
        field::Field,
        piece::{Piece, PieceKind},
    },
};

use super::{
    command::Command,
    difficulty::{Difficulty, DifficultyParams},
    event::GameEvent,
    gravity::{Gravity, PlayClock},
    piece_generator::{PieceGenerator, PieceSeed},
    snapshot::SessionSnapshot,
    stats::GameStats,
};

/// Phase of a session.
///
/// ```text
/// NotStarted -> Countdown -> Playing <-> Paused
///                               |
///                               v
///                            GameOver --restart--> NotStarted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    Countdown,
    Playing,
    Paused,
    GameOver,
}

/// Value shown by the pre-game countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownStep {
    Number(u8),
    Ready,
}

impl CountdownStep {
    const FIRST: Self = CountdownStep::Number(3);

    /// The step shown after this one, or `None` when play begins.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            CountdownStep::Number(n) if n > 1 => Some(CountdownStep::Number(n - 1)),
            CountdownStep::Number(_) => Some(CountdownStep::Ready),
            CountdownStep::Ready => None,
        }
    }
}

/// A single game, from difficulty selection to game over and restart.
///
/// The session owns all game state and never schedules anything itself.
/// The front end drives it with:
///
/// - [`GameSession::advance_time`] once per frame, with the real frame time
/// - [`GameSession::tick_countdown`] once per second while counting down
/// - the player commands, either directly or through [`GameSession::apply`]
///
/// Commands return `Err` when they have no effect; the session is left
/// unchanged in that case.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use stackfall_engine::{GameSession, SessionState};
///
/// let mut session = GameSession::new();
/// session.start().unwrap();
/// while session.state() == SessionState::Countdown {
///     session.tick_countdown().unwrap();
/// }
///
/// assert!(session.try_move_left().is_ok());
/// session.advance_time(Duration::from_millis(16));
/// session.hard_drop().unwrap();
/// assert_eq!(session.stats().completed_pieces(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct GameSession {
    field: Field,
    active: Piece,
    generator: PieceGenerator,
    seed: PieceSeed,
    stats: GameStats,
    difficulty: Option<Difficulty>,
    params: DifficultyParams,
    state: SessionState,
    countdown: Option<CountdownStep>,
    clock: PlayClock,
    gravity: Gravity,
    hold_available: bool,
    best_score: u64,
    events: Vec<GameEvent>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    /// Creates a session with a random seed and the default difficulty parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Like [`Self::new`], but with a specific seed for a reproducible piece sequence.
    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        let mut generator = PieceGenerator::with_seed(seed);
        let active = Piece::new(generator.pop_next());
        Self {
            field: Field::EMPTY,
            active,
            generator,
            seed,
            stats: GameStats::new(),
            difficulty: None,
            params: DifficultyParams::default(),
            state: SessionState::NotStarted,
            countdown: None,
            clock: PlayClock::default(),
            gravity: Gravity::default(),
            hold_available: true,
            best_score: 0,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn countdown(&self) -> Option<CountdownStep> {
        self.countdown
    }

    #[must_use]
    pub fn field(&self) -> &Field {
        &self.field
    }

    #[must_use]
    pub fn active_piece(&self) -> &Piece {
        &self.active
    }

    /// Where the active piece would land if hard dropped.
    #[must_use]
    pub fn ghost_piece(&self) -> Piece {
        self.active.simulate_drop_position(&self.field)
    }

    #[must_use]
    pub fn next_piece(&self) -> PieceKind {
        self.generator.peek_next()
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<PieceKind> {
        self.generator.held_piece()
    }

    #[must_use]
    pub fn hold_available(&self) -> bool {
        self.hold_available
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Highest score reached by this session or any session before a restart.
    #[must_use]
    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    /// The selected preset, or `None` when running with the default parameters.
    #[must_use]
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    #[must_use]
    pub fn params(&self) -> &DifficultyParams {
        &self.params
    }

    /// Seed of the current piece sequence.
    #[must_use]
    pub fn seed(&self) -> PieceSeed {
        self.seed
    }

    /// Play time since the countdown finished, excluding pauses.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed_play()
    }

    #[must_use]
    pub fn total_paused(&self) -> Duration {
        self.clock.total_paused()
    }

    #[must_use]
    pub fn is_soft_drop(&self) -> bool {
        self.gravity.is_soft_drop()
    }

    /// Gravity interval for the current play time, ignoring soft drop.
    #[must_use]
    pub fn drop_interval(&self) -> Duration {
        self.params.drop_interval(self.elapsed())
    }

    /// Gravity interval actually in use, with soft drop applied.
    #[must_use]
    pub fn effective_drop_interval(&self) -> Duration {
        self.gravity.effective_interval(self.drop_interval())
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(self)
    }

    /// Removes and returns the events queued since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn apply(&mut self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::Start => self.start(),
            Command::TogglePause => self.toggle_pause(),
            Command::MoveLeft => self.try_move_left(),
            Command::MoveRight => self.try_move_right(),
            Command::SoftDrop(active) => self.set_soft_drop(active),
            Command::Rotate => self.try_rotate(),
            Command::HardDrop => self.hard_drop(),
            Command::Hold => self.try_hold(),
            Command::SelectDifficulty(difficulty) => self.select_difficulty(difficulty),
            Command::Restart => self.restart(),
        }
    }

    /// Chooses the difficulty preset. Only allowed before a session starts or after it ends.
    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> Result<(), CommandError> {
        if !matches!(
            self.state,
            SessionState::NotStarted | SessionState::GameOver
        ) {
            return Err(CommandError::SessionInProgress);
        }
        debug!("difficulty set to {difficulty}");
        self.difficulty = Some(difficulty);
        self.params = difficulty.params();
        Ok(())
    }

    /// Begins the countdown, resetting the statistics.
    pub fn start(&mut self) -> Result<(), CommandError> {
        if !self.state.is_not_started() {
            return Err(CommandError::AlreadyStarted);
        }
        self.stats = GameStats::new();
        self.state = SessionState::Countdown;
        self.countdown = Some(CountdownStep::FIRST);
        self.events.push(GameEvent::CountdownTick(CountdownStep::FIRST));
        debug!("countdown started");
        Ok(())
    }

    /// Advances the countdown by one second. The tick after "ready" starts play.
    pub fn tick_countdown(&mut self) -> Result<(), CommandError> {
        let Some(step) = self.countdown.filter(|_| self.state.is_countdown()) else {
            return Err(CommandError::NotCountingDown);
        };
        if let Some(next) = step.next() {
            self.countdown = Some(next);
            self.events.push(GameEvent::CountdownTick(next));
            return Ok(());
        }
        self.countdown = None;
        self.state = SessionState::Playing;
        self.clock.start();
        self.gravity.reset();
        self.events.push(GameEvent::Started);
        debug!("session started with {:?}", self.params);
        Ok(())
    }

    pub fn toggle_pause(&mut self) -> Result<(), CommandError> {
        match self.state {
            SessionState::Playing => {
                self.state = SessionState::Paused;
                self.clock.pause();
                self.events.push(GameEvent::Paused);
                debug!("paused");
            }
            SessionState::Paused => {
                self.state = SessionState::Playing;
                self.clock.resume();
                self.events.push(GameEvent::Resumed);
                debug!("resumed");
            }
            _ => return Err(CommandError::NotPlaying),
        }
        Ok(())
    }

    pub fn try_move_left(&mut self) -> Result<(), CommandError> {
        self.try_move(self.active.left())
    }

    pub fn try_move_right(&mut self) -> Result<(), CommandError> {
        self.try_move(self.active.right())
    }

    fn try_move(&mut self, piece: Piece) -> Result<(), CommandError> {
        self.ensure_playing()?;
        if self.field.is_colliding(&piece) {
            return Err(CommandError::Blocked);
        }
        self.active = piece;
        self.events.push(GameEvent::Moved);
        Ok(())
    }

    /// Presses or releases soft drop.
    ///
    /// Pressing is only accepted during play; releasing is always accepted.
    pub fn set_soft_drop(&mut self, active: bool) -> Result<(), CommandError> {
        if active {
            self.ensure_playing()?;
        }
        self.gravity.set_soft_drop(active);
        Ok(())
    }

    pub fn try_rotate(&mut self) -> Result<(), CommandError> {
        self.ensure_playing()?;
        let piece = self
            .active
            .kicked_rotation(&self.field)
            .ok_or(CommandError::Blocked)?;
        self.active = piece;
        self.events.push(GameEvent::Rotated);
        Ok(())
    }

    /// Drops the active piece to its landing row and locks it immediately.
    pub fn hard_drop(&mut self) -> Result<(), CommandError> {
        self.ensure_playing()?;
        self.active = self.ghost_piece();
        self.gravity.reset();
        self.lock_active_piece();
        Ok(())
    }

    /// Exchanges the active piece with the hold slot. Allowed once per piece.
    pub fn try_hold(&mut self) -> Result<(), CommandError> {
        self.ensure_playing()?;
        if !self.hold_available {
            return Err(CommandError::HoldUnavailable);
        }
        let replacement = self.generator.swap_hold(self.active.kind());
        self.hold_available = false;
        self.events.push(GameEvent::Held);
        self.spawn(replacement);
        Ok(())
    }

    /// Resets a finished session for another game.
    ///
    /// The difficulty and best score are kept; the piece sequence continues
    /// from a seed derived from the previous one.
    pub fn restart(&mut self) -> Result<(), CommandError> {
        if !self.state.is_game_over() {
            return Err(CommandError::NotGameOver);
        }
        let seed = self.generator.fork_seed();
        let difficulty = self.difficulty;
        let params = self.params;
        let best_score = self.best_score;
        *self = Self::with_seed(seed);
        self.difficulty = difficulty;
        self.params = params;
        self.best_score = best_score;
        self.events.push(GameEvent::Restarted);
        debug!("session restarted");
        Ok(())
    }

    /// Advances session time by one frame.
    ///
    /// During play, frame time feeds the gravity accumulator and at most one
    /// row of descent happens per call.
    pub fn advance_time(&mut self, delta: Duration) {
        self.clock.advance(delta);
        if !self.state.is_playing() {
            return;
        }
        self.gravity.accumulate(delta);
        let interval = self.effective_drop_interval();
        if self.gravity.take_step(interval) {
            self.step_down();
        }
    }

    fn ensure_playing(&self) -> Result<(), CommandError> {
        if self.state.is_playing() {
            Ok(())
        } else {
            Err(CommandError::NotPlaying)
        }
    }

    fn step_down(&mut self) {
        let piece = self.active.down();
        if self.field.is_colliding(&piece) {
            self.lock_active_piece();
        } else {
            self.active = piece;
        }
    }

    fn lock_active_piece(&mut self) {
        let piece = self.active;
        self.field.lock_piece(&piece);
        let cleared = self.field.clear_lines();
        let points = self
            .stats
            .record_lock(piece.kind(), cleared.len(), &self.params);
        self.best_score = self.best_score.max(self.stats.score());
        self.events.push(GameEvent::PieceLocked {
            kind: piece.kind(),
            points,
        });
        if !cleared.is_empty() {
            debug!(
                "cleared rows {:?} (combo {})",
                cleared.as_slice(),
                self.stats.combo()
            );
            self.events.push(GameEvent::LinesCleared {
                rows: cleared,
                combo: self.stats.combo(),
            });
        }
        self.hold_available = true;
        let kind = self.generator.pop_next();
        self.spawn(kind);
    }

    fn spawn(&mut self, kind: PieceKind) {
        self.active = Piece::new(kind);
        if self.field.is_colliding(&self.active) {
            self.game_over();
        }
    }

    fn game_over(&mut self) {
        self.state = SessionState::GameOver;
        self.clock.stop();
        self.gravity.set_soft_drop(false);
        let score = self.stats.score();
        self.events.push(GameEvent::GameOver { score });
        info!(
            "game over: score {score}, lines {}, pieces {}",
            self.stats.total_cleared_lines(),
            self.stats.completed_pieces()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::piece::{PiecePosition, PieceRotation};

    const SEED: PieceSeed = PieceSeed::from_bytes([
        0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77,
        0x88,
    ]);

    const fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn playing_session() -> GameSession {
        let mut session = GameSession::with_seed(SEED);
        session.start().unwrap();
        for _ in 0..4 {
            session.tick_countdown().unwrap();
        }
        assert!(session.state().is_playing());
        session.drain_events();
        session
    }

    fn place(session: &mut GameSession, kind: PieceKind, rotation: u8, x: i32, y: i32) {
        let mut piece =
            Piece::from_parts(kind, PieceRotation::default(), PiecePosition::new(x, y));
        for _ in 0..rotation {
            piece = piece.rotated_clockwise();
        }
        assert!(!session.field.is_colliding(&piece));
        session.active = piece;
    }

    /// Field whose column 4 is filled, so every spawn collides.
    fn blocked_spawn_field() -> Field {
        Field::from_rows(&["....O....."; 20]).unwrap()
    }

    mod phases {
        use super::*;

        #[test]
        fn test_countdown_sequence() {
            let mut session = GameSession::with_seed(SEED);
            assert!(session.state().is_not_started());
            session.start().unwrap();
            assert!(session.state().is_countdown());

            let mut shown = vec![session.countdown().unwrap()];
            for _ in 0..3 {
                session.tick_countdown().unwrap();
                shown.push(session.countdown().unwrap());
            }
            assert_eq!(
                shown,
                vec![
                    CountdownStep::Number(3),
                    CountdownStep::Number(2),
                    CountdownStep::Number(1),
                    CountdownStep::Ready,
                ]
            );

            session.tick_countdown().unwrap();
            assert!(session.state().is_playing());
            assert_eq!(session.countdown(), None);
            assert_eq!(
                session.tick_countdown(),
                Err(CommandError::NotCountingDown)
            );

            let events = session.drain_events();
            assert_eq!(events.first(), Some(&GameEvent::CountdownTick(CountdownStep::Number(3))));
            assert_eq!(events.last(), Some(&GameEvent::Started));
        }

        #[test]
        fn test_start_only_once() {
            let mut session = GameSession::with_seed(SEED);
            session.start().unwrap();
            assert_eq!(session.start(), Err(CommandError::AlreadyStarted));
        }

        #[test]
        fn test_tick_before_start_is_rejected() {
            let mut session = GameSession::with_seed(SEED);
            assert_eq!(
                session.tick_countdown(),
                Err(CommandError::NotCountingDown)
            );
        }

        #[test]
        fn test_commands_rejected_before_play() {
            let mut session = GameSession::with_seed(SEED);
            let piece = *session.active_piece();
            assert_eq!(session.try_move_left(), Err(CommandError::NotPlaying));
            assert_eq!(session.try_rotate(), Err(CommandError::NotPlaying));
            assert_eq!(session.try_hold(), Err(CommandError::NotPlaying));
            assert_eq!(session.hard_drop(), Err(CommandError::NotPlaying));
            assert_eq!(session.set_soft_drop(true), Err(CommandError::NotPlaying));
            assert_eq!(session.toggle_pause(), Err(CommandError::NotPlaying));

            session.start().unwrap();
            session.advance_time(ms(5000));
            assert_eq!(*session.active_piece(), piece);
            assert_eq!(session.elapsed(), Duration::ZERO);
        }

        #[test]
        fn test_toggle_pause_twice() {
            let mut session = playing_session();
            session.advance_time(ms(120));
            let accumulated = session.gravity.accumulated();
            let piece = *session.active_piece();

            session.toggle_pause().unwrap();
            assert!(session.state().is_paused());
            session.advance_time(ms(1000));
            assert_eq!(session.try_move_left(), Err(CommandError::NotPlaying));
            session.toggle_pause().unwrap();

            assert!(session.state().is_playing());
            assert_eq!(session.total_paused(), ms(1000));
            assert_eq!(session.elapsed(), ms(120));
            assert_eq!(session.gravity.accumulated(), accumulated);
            assert_eq!(*session.active_piece(), piece);
            assert_eq!(
                session.drain_events(),
                vec![GameEvent::Paused, GameEvent::Resumed]
            );
        }

        #[test]
        fn test_select_difficulty() {
            let mut session = GameSession::with_seed(SEED);
            assert_eq!(session.difficulty(), None);
            assert_eq!(session.drop_interval(), ms(300));

            session.select_difficulty(Difficulty::Facil).unwrap();
            assert_eq!(session.difficulty(), Some(Difficulty::Facil));
            assert_eq!(session.drop_interval(), ms(500));

            session.start().unwrap();
            assert_eq!(
                session.select_difficulty(Difficulty::Imposible),
                Err(CommandError::SessionInProgress)
            );
            assert_eq!(session.difficulty(), Some(Difficulty::Facil));
        }

        #[test]
        fn test_drop_interval_follows_play_time() {
            let mut session = playing_session();
            session.clock.advance(Duration::from_secs(30));
            assert_eq!(session.drop_interval(), ms(275));
            session.set_soft_drop(true).unwrap();
            assert_eq!(session.effective_drop_interval(), ms(20));
        }
    }

    mod movement {
        use super::*;

        #[test]
        fn test_move_until_wall() {
            let mut session = playing_session();
            place(&mut session, PieceKind::T, 0, 3, 5);
            for _ in 0..3 {
                session.try_move_left().unwrap();
            }
            assert_eq!(session.active_piece().position(), PiecePosition::new(0, 5));
            assert_eq!(session.try_move_left(), Err(CommandError::Blocked));
            assert_eq!(session.active_piece().position(), PiecePosition::new(0, 5));
            assert_eq!(session.drain_events(), vec![GameEvent::Moved; 3]);

            session.try_move_right().unwrap();
            assert_eq!(session.active_piece().position(), PiecePosition::new(1, 5));
        }

        #[test]
        fn test_rotate_o_piece_reports_success() {
            let mut session = playing_session();
            place(&mut session, PieceKind::O, 0, 3, 5);
            let piece = *session.active_piece();
            session.try_rotate().unwrap();
            assert_eq!(*session.active_piece(), piece);
            assert_eq!(session.drain_events(), vec![GameEvent::Rotated]);
        }

        #[test]
        fn test_rotate_blocked() {
            let mut session = playing_session();
            let mut rows = vec![".........."; 10];
            rows.extend(["IIIII.IIII"; 10]);
            session.field = Field::from_rows(&rows).unwrap();
            place(&mut session, PieceKind::I, 1, 3, 12);
            assert_eq!(session.try_rotate(), Err(CommandError::Blocked));
        }

        #[test]
        fn test_gravity_descends_at_interval() {
            let mut session = playing_session();
            place(&mut session, PieceKind::T, 0, 3, 0);
            session.advance_time(ms(299));
            assert_eq!(session.active_piece().position().y(), 0);
            session.advance_time(ms(1));
            assert_eq!(session.active_piece().position().y(), 1);
        }

        #[test]
        fn test_gravity_one_row_per_frame() {
            let mut session = playing_session();
            place(&mut session, PieceKind::T, 0, 3, 0);
            session.advance_time(ms(1000));
            assert_eq!(session.active_piece().position().y(), 1);
            session.advance_time(Duration::ZERO);
            assert_eq!(session.active_piece().position().y(), 2);
        }

        #[test]
        fn test_soft_drop_uses_fast_interval() {
            let mut session = playing_session();
            place(&mut session, PieceKind::T, 0, 3, 0);
            session.set_soft_drop(true).unwrap();
            session.advance_time(ms(20));
            assert_eq!(session.active_piece().position().y(), 1);

            session.set_soft_drop(false).unwrap();
            session.advance_time(ms(20));
            assert_eq!(session.active_piece().position().y(), 1);
        }

        #[test]
        fn test_ghost_piece() {
            let mut session = playing_session();
            place(&mut session, PieceKind::T, 0, 3, -1);
            assert_eq!(session.ghost_piece().position(), PiecePosition::new(3, 18));
            assert_eq!(session.snapshot().ghost_row, 18);
        }
    }

    mod locking {
        use super::*;

        #[test]
        fn test_hard_drop_locks_and_spawns() {
            let mut session = playing_session();
            place(&mut session, PieceKind::T, 0, 3, -1);
            let next = session.next_piece();
            session.advance_time(ms(100));

            session.hard_drop().unwrap();
            assert_eq!(session.field().occupied_count(), 4);
            assert_eq!(session.stats().completed_pieces(), 1);
            assert_eq!(session.stats().piece_count(PieceKind::T), 1);
            assert_eq!(session.stats().score(), 40);
            assert_eq!(session.active_piece().kind(), next);
            assert_eq!(
                session.active_piece().position(),
                PiecePosition::SPAWN_POSITION
            );
            assert_eq!(session.gravity.accumulated(), Duration::ZERO);
            assert_eq!(
                session.drain_events(),
                vec![GameEvent::PieceLocked {
                    kind: PieceKind::T,
                    points: 40
                }]
            );
        }

        #[test]
        fn test_gravity_locks_resting_piece() {
            let mut session = playing_session();
            place(&mut session, PieceKind::O, 0, 3, 17);
            session.advance_time(ms(300));
            assert_eq!(session.stats().completed_pieces(), 1);
            assert_eq!(session.field().cell(4, 19), Some(crate::Cell::Occupied(PieceKind::O)));
        }

        #[test]
        fn test_single_line_clear_base_difficulty() {
            let mut session = playing_session();
            session.field = Field::from_rows(&["....OOOOOO"]).unwrap();
            place(&mut session, PieceKind::I, 0, 0, -1);

            session.hard_drop().unwrap();
            assert_eq!(session.stats().score(), 150);
            assert_eq!(session.stats().combo(), 1);
            assert_eq!(session.stats().total_cleared_lines(), 1);
            assert_eq!(session.field().occupied_count(), 0);

            let events = session.drain_events();
            let cleared = events.iter().find_map(|event| match event {
                GameEvent::LinesCleared { rows, combo } => Some((rows.as_slice().to_vec(), *combo)),
                _ => None,
            });
            assert_eq!(cleared, Some((vec![19], 1)));
        }

        #[test]
        fn test_consecutive_clears_at_normal_difficulty() {
            let mut session = GameSession::with_seed(SEED);
            session.select_difficulty(Difficulty::Normal).unwrap();
            session.start().unwrap();
            for _ in 0..4 {
                session.tick_countdown().unwrap();
            }

            session.field = Field::from_rows(&["....OOOOOO"]).unwrap();
            place(&mut session, PieceKind::I, 0, 0, -1);
            session.hard_drop().unwrap();
            assert_eq!(session.stats().score(), 150);

            // Vertical I into the gap at column 1 clears the two bottom rows
            session.field = Field::from_rows(&["O.OOOOOOOO", "O.OOOOOOOO"]).unwrap();
            place(&mut session, PieceKind::I, 1, -1, -1);
            session.hard_drop().unwrap();
            assert_eq!(session.stats().combo(), 2);
            assert_eq!(session.stats().score(), 150 + 50 + 250);
            assert_eq!(session.stats().line_cleared_counter(), &[0, 1, 1, 0, 0]);
        }

        #[test]
        fn test_non_clearing_lock_breaks_combo() {
            let mut session = playing_session();
            session.field = Field::from_rows(&["....OOOOOO"]).unwrap();
            place(&mut session, PieceKind::I, 0, 0, -1);
            session.hard_drop().unwrap();
            assert_eq!(session.stats().combo(), 1);

            place(&mut session, PieceKind::O, 0, 3, -1);
            session.hard_drop().unwrap();
            assert_eq!(session.stats().combo(), 0);
            assert_eq!(session.stats().max_combo(), 1);
        }

        #[test]
        fn test_spawn_collision_ends_game() {
            let mut session = playing_session();
            session.field = blocked_spawn_field();
            place(&mut session, PieceKind::T, 0, 0, -1);

            session.hard_drop().unwrap();
            assert!(session.state().is_game_over());
            let score = session.stats().score();
            assert_eq!(score, 40);
            assert_eq!(session.best_score(), 40);

            let elapsed = session.elapsed();
            session.advance_time(ms(5000));
            assert_eq!(session.elapsed(), elapsed);
            assert_eq!(session.stats().score(), score);
            assert_eq!(session.hard_drop(), Err(CommandError::NotPlaying));
            assert_eq!(session.toggle_pause(), Err(CommandError::NotPlaying));
            assert_eq!(session.stats().score(), score);
            assert!(
                session
                    .drain_events()
                    .contains(&GameEvent::GameOver { score: 40 })
            );
        }
    }

    mod hold {
        use super::*;

        #[test]
        fn test_first_hold_promotes_next() {
            let mut session = playing_session();
            place(&mut session, PieceKind::T, 0, 3, 5);
            let next = session.next_piece();

            session.try_hold().unwrap();
            assert_eq!(session.held_piece(), Some(PieceKind::T));
            assert_eq!(session.active_piece().kind(), next);
            assert_eq!(
                session.active_piece().position(),
                PiecePosition::SPAWN_POSITION
            );
            assert!(!session.hold_available());
        }

        #[test]
        fn test_hold_twice_without_lock() {
            let mut session = playing_session();
            session.try_hold().unwrap();
            let active = *session.active_piece();
            let held = session.held_piece();
            let next = session.next_piece();

            assert_eq!(session.try_hold(), Err(CommandError::HoldUnavailable));
            assert_eq!(*session.active_piece(), active);
            assert_eq!(session.held_piece(), held);
            assert_eq!(session.next_piece(), next);
        }

        #[test]
        fn test_hold_swaps_after_lock() {
            let mut session = playing_session();
            place(&mut session, PieceKind::T, 0, 3, -1);
            session.try_hold().unwrap();
            session.hard_drop().unwrap();
            assert!(session.hold_available());

            place(&mut session, PieceKind::I, 0, 3, -1);
            let next = session.next_piece();
            session.try_hold().unwrap();
            assert_eq!(session.active_piece().kind(), PieceKind::T);
            assert_eq!(session.held_piece(), Some(PieceKind::I));
            assert_eq!(session.next_piece(), next);
        }

        #[test]
        fn test_hold_into_blocked_spawn_ends_game() {
            let mut session = playing_session();
            session.field = blocked_spawn_field();
            place(&mut session, PieceKind::T, 0, 0, 5);
            session.try_hold().unwrap();
            assert!(session.state().is_game_over());
        }
    }

    mod restart {
        use super::*;

        fn finished_session() -> GameSession {
            let mut session = GameSession::with_seed(SEED);
            session.select_difficulty(Difficulty::Dificil).unwrap();
            session.start().unwrap();
            for _ in 0..4 {
                session.tick_countdown().unwrap();
            }
            session.field = blocked_spawn_field();
            place(&mut session, PieceKind::I, 1, -2, -1);
            session.hard_drop().unwrap();
            assert!(session.state().is_game_over());
            session
        }

        #[test]
        fn test_restart_only_after_game_over() {
            let mut session = playing_session();
            assert_eq!(session.restart(), Err(CommandError::NotGameOver));
        }

        #[test]
        fn test_restart_keeps_difficulty_and_best_score() {
            let mut session = finished_session();
            let best = session.best_score();
            assert_eq!(best, 75);

            session.restart().unwrap();
            assert!(session.state().is_not_started());
            assert_eq!(session.difficulty(), Some(Difficulty::Dificil));
            assert_eq!(session.best_score(), best);
            assert_eq!(session.stats().score(), 0);
            assert_eq!(session.field().occupied_count(), 0);
            assert_eq!(session.held_piece(), None);
            assert_eq!(session.drain_events(), vec![GameEvent::Restarted]);
            session.start().unwrap();
        }

        #[test]
        fn test_restart_is_reproducible() {
            let mut session1 = finished_session();
            let mut session2 = finished_session();
            session1.restart().unwrap();
            session2.restart().unwrap();
            assert_eq!(session1.seed(), session2.seed());
            assert_eq!(session1.active_piece(), session2.active_piece());
        }

        #[test]
        fn test_difficulty_change_after_game_over() {
            let mut session = finished_session();
            session.select_difficulty(Difficulty::Facil).unwrap();
            session.restart().unwrap();
            assert_eq!(session.difficulty(), Some(Difficulty::Facil));
        }
    }

    #[test]
    fn test_apply_commands() {
        let mut session = GameSession::with_seed(SEED);
        for word in ["difficulty normal", "start"] {
            session.apply(word.parse().unwrap()).unwrap();
        }
        for _ in 0..4 {
            session.tick_countdown().unwrap();
        }
        place(&mut session, PieceKind::T, 0, 3, 5);
        session.apply(Command::MoveRight).unwrap();
        session.apply(Command::Rotate).unwrap();
        session.apply(Command::TogglePause).unwrap();
        assert_eq!(session.apply(Command::Hold), Err(CommandError::NotPlaying));
        session.apply(Command::TogglePause).unwrap();
        session.apply(Command::HardDrop).unwrap();
        assert_eq!(session.stats().completed_pieces(), 1);
    }

    #[test]
    fn test_snapshot_serialization() {
        let mut session = playing_session();
        place(&mut session, PieceKind::T, 0, 3, -1);
        session.advance_time(ms(50));

        let value = serde_json::to_value(session.snapshot()).unwrap();
        assert_eq!(value["state"], "playing");
        assert_eq!(value["active"], "T#0@3,-1");
        assert_eq!(value["ghost_row"], 18);
        assert_eq!(value["elapsed_ms"], 50);
        assert_eq!(value["drop_interval_ms"], 300);
        assert_eq!(value["danger_zone"], false);
        assert_eq!(value["field"].as_array().unwrap().len(), Field::HEIGHT);
        assert_eq!(value["stats"]["score"], 0);
    }
}
