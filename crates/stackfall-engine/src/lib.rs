pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Reason a command had no effect.
///
/// Rejected commands leave the session unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum CommandError {
    #[display("session is not in play")]
    NotPlaying,
    #[display("session has already started")]
    AlreadyStarted,
    #[display("countdown is not running")]
    NotCountingDown,
    #[display("piece is blocked")]
    Blocked,
    #[display("hold already used for this piece")]
    HoldUnavailable,
    #[display("session is not over")]
    NotGameOver,
    #[display("difficulty can only change before or between sessions")]
    SessionInProgress,
}
