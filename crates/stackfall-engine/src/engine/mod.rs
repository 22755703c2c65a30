//! Game rules and session state.
//!
//! This module builds the playable game on top of the core field and piece types:
//!
//! - [`GameSession`] - One game from difficulty selection to game over, with countdown,
//!   pause, gravity, hold and scoring
//! - [`Command`] - Player commands, parseable from short words
//! - [`GameEvent`] - Notifications queued by the session for front ends
//! - [`GameStats`] - Score, combo and per-piece counters
//! - [`Difficulty`] / [`DifficultyParams`] - Speed and score presets
//! - [`PieceGenerator`] / [`PieceSeed`] - Seeded uniform randomizer with the hold slot
//! - [`SessionSnapshot`] - Serializable per-frame view of a session
//!
//! # Game Flow
//!
//! 1. Optionally select a difficulty
//! 2. `start()` and call `tick_countdown()` once per second until play begins
//! 3. Call `advance_time()` every frame; gravity moves the active piece down
//! 4. Apply player commands between frames
//! 5. Each lock clears full rows, scores, and spawns the next piece
//! 6. The session ends when a new piece collides at spawn; `restart()` resets it
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use stackfall_engine::{Command, GameEvent, GameSession};
//!
//! let mut session = GameSession::new();
//! session.apply("difficulty normal".parse().unwrap()).unwrap();
//! session.apply(Command::Start).unwrap();
//! for _ in 0..4 {
//!     session.tick_countdown().unwrap();
//! }
//!
//! session.advance_time(Duration::from_millis(16));
//! session.apply(Command::HardDrop).unwrap();
//!
//! let locked = session
//!     .drain_events()
//!     .into_iter()
//!     .any(|event| matches!(event, GameEvent::PieceLocked { .. }));
//! assert!(locked);
//! ```

pub use self::{
    command::*, difficulty::*, event::*, gravity::FAST_DROP_INTERVAL, piece_generator::*,
    session::*, snapshot::*, stats::*,
};

mod command;
mod difficulty;
mod event;
mod gravity;
mod piece_generator;
mod session;
mod snapshot;
mod stats;
