use std::{
    io::{self, Write as _},
    time::Duration,
};

use crossterm::{
    event::{
        DisableFocusChange, EnableFocusChange, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use log::debug;

use crate::{
    App,
    event::TuiEvent,
    event_loop::{EventLoop, RenderMode},
};

/// Optional terminal features requested by the application.
#[derive(Debug, Default, Clone, Copy)]
struct Features {
    focus_change: bool,
    key_release: bool,
}

/// TUI application runtime.
///
/// Manages the event loop and executes applications that implement the `App` trait.
#[derive(Default, Debug)]
pub struct Runtime {
    events: EventLoop,
    requested: Features,
    enabled: Features,
}

impl Runtime {
    /// Creates a new Runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tick rate (Hz, ticks per second).
    pub fn set_tick_rate(&mut self, rate: Option<f64>) {
        self.set_tick_interval(rate.map(|rate| Duration::from_secs_f64(1.0 / rate)));
    }

    /// Sets the tick interval.
    pub fn set_tick_interval(&mut self, interval: Option<Duration>) {
        self.events.set_tick_interval(interval);
    }

    /// Sets the timer interval, starting a new period from now.
    ///
    /// Pass `None` to stop the timer.
    pub fn set_timer_interval(&mut self, interval: Option<Duration>) {
        self.events.set_timer_interval(interval);
    }

    /// Restarts the current timer period from now.
    pub fn reset_timer(&mut self) {
        self.events.reset_timer();
    }

    /// Sets the render mode.
    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.events.set_render_mode(mode);
    }

    /// Requests `FocusGained` / `FocusLost` events.
    ///
    /// Takes effect when `run()` sets up the terminal.
    pub fn request_focus_change(&mut self, enable: bool) {
        self.requested.focus_change = enable;
    }

    /// Requests key release events, where the terminal supports them.
    ///
    /// Takes effect when `run()` sets up the terminal; check
    /// [`Self::key_release_enabled`] to see whether it did.
    pub fn request_key_release(&mut self, enable: bool) {
        self.requested.key_release = enable;
    }

    /// Returns whether the terminal reports key release events.
    #[must_use]
    pub fn key_release_enabled(&self) -> bool {
        self.enabled.key_release
    }

    /// Runs the application.
    ///
    /// 1. Calls `app.init()` for initialization
    /// 2. Enables the requested terminal features
    /// 3. Runs the event loop until `app.should_exit()` returns true
    ///    - `Event::Tick`: calls `app.update()`
    ///    - `Event::Timer`: calls `app.on_timer()`
    ///    - `Event::Render`: calls `app.draw()`
    ///    - `Event::Crossterm`: calls `app.handle_event()`
    pub fn run<A>(mut self, app: &mut A) -> io::Result<()>
    where
        A: App,
    {
        app.init(&mut self);

        ratatui::run(|terminal| {
            self.enable_features()?;
            let result = (|| -> io::Result<()> {
                while !app.should_exit() {
                    match self.events.next()? {
                        TuiEvent::Tick(delta) => {
                            app.update(&mut self, delta);
                        }
                        TuiEvent::Timer => {
                            app.on_timer(&mut self);
                        }
                        TuiEvent::Render => {
                            terminal.draw(|f| app.draw(f))?;
                        }
                        TuiEvent::Crossterm(event) => {
                            app.handle_event(&mut self, event);
                        }
                    }
                }
                Ok(())
            })();
            self.disable_features()?;
            result
        })
    }

    fn enable_features(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        if self.requested.focus_change {
            execute!(stdout, EnableFocusChange)?;
            self.enabled.focus_change = true;
        }
        if self.requested.key_release {
            if supports_keyboard_enhancement()? {
                execute!(
                    stdout,
                    PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
                )?;
                self.enabled.key_release = true;
            } else {
                debug!("terminal does not report key release events");
            }
        }
        stdout.flush()
    }

    fn disable_features(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        if self.enabled.key_release {
            execute!(stdout, PopKeyboardEnhancementFlags)?;
        }
        if self.enabled.focus_change {
            execute!(stdout, DisableFocusChange)?;
        }
        self.enabled = Features::default();
        stdout.flush()
    }
}
