use crate::core::{field::ClearedRows, piece::PieceKind};

use super::session::CountdownStep;

/// Notable state changes, queued for front ends that react to them
/// (sound cues, particle effects, status lines).
///
/// Drained with [`GameSession::drain_events`](super::GameSession::drain_events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The countdown shows a new step.
    CountdownTick(CountdownStep),
    /// The countdown finished and play began.
    Started,
    Paused,
    Resumed,
    /// The active piece moved one column.
    Moved,
    /// The active piece rotated. Also emitted for the O piece, whose shape does not change.
    Rotated,
    /// The active piece was exchanged with the hold slot.
    Held,
    /// A piece locked into the field.
    PieceLocked { kind: PieceKind, points: u64 },
    /// Full rows were removed, given by their index before removal.
    LinesCleared { rows: ClearedRows, combo: u32 },
    GameOver { score: u64 },
    Restarted,
}
