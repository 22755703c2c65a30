use std::time::Duration;

use crossterm::event::Event;
use ratatui::Frame;

use crate::Runtime;

/// Trait for TUI applications.
///
/// Applications executed by `Runtime::run()` must implement this trait.
pub trait App {
    /// Initializes the application.
    ///
    /// Called at the start of `Runtime::run()`, before the terminal is set up.
    /// Use this to configure tick rate, render mode and terminal features.
    fn init(&mut self, runtime: &mut Runtime);

    /// Returns whether the application should exit.
    fn should_exit(&self) -> bool;

    /// Handles terminal events (key input, focus, resize, etc.).
    fn handle_event(&mut self, runtime: &mut Runtime, event: Event);

    /// Draws the screen (called on each `Event::Render`).
    fn draw(&self, frame: &mut Frame);

    /// Updates application state (called on each tick).
    ///
    /// `delta` is the real time elapsed since the previous tick.
    fn update(&mut self, runtime: &mut Runtime, delta: Duration);

    /// Called each time the timer set with [`Runtime::set_timer_interval`] fires.
    fn on_timer(&mut self, _runtime: &mut Runtime) {}
}
