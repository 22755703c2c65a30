use std::time::Duration;

use crossterm::event::Event as CrosstermEvent;

/// Events processed by TUI applications.
#[derive(Debug, Clone, derive_more::IsVariant, derive_more::From)]
pub(super) enum TuiEvent {
    /// Update timing (based on `tick_interval`), with the time since the previous tick.
    Tick(Duration),
    /// Timer expiry (based on `timer_interval`).
    Timer,
    /// Screen render timing (based on `render_mode`).
    Render,
    /// Terminal events such as key input, focus changes, and resize.
    Crossterm(CrosstermEvent),
}
