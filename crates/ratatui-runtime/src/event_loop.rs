use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::event;

use crate::event::TuiEvent;

/// Longest delta reported by a single tick.
///
/// Gaps longer than this (the first tick, a suspended terminal) are clamped.
const MAX_TICK_DELTA: Duration = Duration::from_millis(250);

/// Rendering trigger mode.
#[derive(Debug, Clone, Copy, Default)]
pub enum RenderMode {
    /// Render at fixed intervals.
    Interval(Duration),
    /// Render after state changes (tick, timer or crossterm event).
    #[default]
    OnDirty,
    /// Render after state changes, but with minimum interval between renders.
    ///
    /// If events occur faster than the interval, they are batched into one render.
    Throttled(Duration),
}

impl RenderMode {
    /// Creates `Interval` mode from frame rate (FPS).
    #[must_use]
    pub fn interval_from_rate(rate: f64) -> Self {
        Self::Interval(Duration::from_secs_f64(1.0 / rate))
    }

    /// Creates `Throttled` mode from frame rate (FPS).
    #[must_use]
    pub fn throttled_from_rate(rate: f64) -> Self {
        Self::Throttled(Duration::from_secs_f64(1.0 / rate))
    }
}

/// Event loop state management.
///
/// Manages tick, timer and render intervals and returns the next event via `next()`.
/// If an interval is not set, that event type will not be generated.
#[derive(Debug)]
pub(super) struct EventLoop {
    tick_interval: Option<Duration>,
    timer_interval: Option<Duration>,
    render_mode: RenderMode,
    last_tick: Instant,
    last_timer: Instant,
    last_render: Instant,
    dirty: bool,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    /// Creates a new `EventLoop`.
    ///
    /// Tick and timer intervals are unset, and render mode defaults to `OnDirty`.
    pub fn new() -> Self {
        let now = Instant::now();
        let past_time = now.checked_sub(Duration::from_secs(86400)).unwrap_or(now);
        Self {
            tick_interval: None,
            timer_interval: None,
            render_mode: RenderMode::default(),
            last_tick: past_time,
            last_timer: now,
            last_render: past_time,
            dirty: true, // Initial render is required on startup
        }
    }

    /// Sets the tick interval.
    ///
    /// Pass `None` to disable tick events.
    pub(super) fn set_tick_interval(&mut self, interval: Option<Duration>) {
        self.tick_interval = interval;
    }

    /// Sets the timer interval and restarts the timer from now.
    ///
    /// Pass `None` to disable timer events.
    pub(super) fn set_timer_interval(&mut self, interval: Option<Duration>) {
        self.timer_interval = interval;
        self.reset_timer();
    }

    /// Restarts the current timer period from now.
    pub(super) fn reset_timer(&mut self) {
        self.last_timer = Instant::now();
    }

    /// Sets the render mode.
    pub(super) fn set_render_mode(&mut self, render_mode: RenderMode) {
        self.render_mode = render_mode;
    }

    /// Returns the next event.
    ///
    /// Blocks until a tick/timer/render time is reached or a crossterm event occurs.
    /// If nothing is scheduled, only waits for crossterm events.
    pub(super) fn next(&mut self) -> io::Result<TuiEvent> {
        loop {
            let now = Instant::now();
            if let Some(tick_interval) = self.tick_interval
                && now.duration_since(self.last_tick) >= tick_interval
            {
                let delta = now.duration_since(self.last_tick).min(MAX_TICK_DELTA);
                self.last_tick = now;
                self.dirty = true;
                return Ok(TuiEvent::Tick(delta));
            }

            if let Some(timer_interval) = self.timer_interval
                && now.duration_since(self.last_timer) >= timer_interval
            {
                self.last_timer = now;
                self.dirty = true;
                return Ok(TuiEvent::Timer);
            }

            let do_render = match self.render_mode {
                RenderMode::Interval(interval) => now.duration_since(self.last_render) >= interval,
                RenderMode::OnDirty => self.dirty,
                RenderMode::Throttled(interval) => {
                    self.dirty && now.duration_since(self.last_render) >= interval
                }
            };
            if do_render {
                self.last_render = now;
                self.dirty = false;
                return Ok(TuiEvent::Render);
            }

            if let Some(timeout) = self.compute_timeout(now)
                && !event::poll(timeout)?
            {
                continue;
            }

            self.dirty = true;
            return Ok(event::read()?.into());
        }
    }

    fn compute_timeout(&self, now: Instant) -> Option<Duration> {
        let next_tick_at = self.tick_interval.map(|interval| self.last_tick + interval);
        let next_timer_at = self
            .timer_interval
            .map(|interval| self.last_timer + interval);
        let next_render_at = match self.render_mode {
            RenderMode::Interval(interval) => Some(self.last_render + interval),
            RenderMode::OnDirty => self.dirty.then_some(now),
            RenderMode::Throttled(interval) => self.dirty.then(|| self.last_render + interval),
        };
        let next_timeout_at = [next_tick_at, next_timer_at, next_render_at]
            .into_iter()
            .flatten()
            .min()?;
        Some(next_timeout_at.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_loop(now: Instant) -> EventLoop {
        EventLoop {
            tick_interval: None,
            timer_interval: None,
            render_mode: RenderMode::OnDirty,
            last_tick: now,
            last_timer: now,
            last_render: now,
            dirty: false,
        }
    }

    #[test]
    fn test_no_timeout_when_nothing_scheduled() {
        let now = Instant::now();
        assert_eq!(idle_loop(now).compute_timeout(now), None);
    }

    #[test]
    fn test_dirty_renders_immediately() {
        let now = Instant::now();
        let events = EventLoop {
            dirty: true,
            ..idle_loop(now)
        };
        assert_eq!(events.compute_timeout(now), Some(Duration::ZERO));
    }

    #[test]
    fn test_timeout_waits_for_earliest_deadline() {
        let now = Instant::now();
        let events = EventLoop {
            tick_interval: Some(Duration::from_millis(16)),
            timer_interval: Some(Duration::from_secs(1)),
            ..idle_loop(now)
        };
        assert_eq!(events.compute_timeout(now), Some(Duration::from_millis(16)));
    }

    #[test]
    fn test_timer_deadline_counts_from_last_fire() {
        let start = Instant::now();
        let now = start + Duration::from_millis(400);
        let events = EventLoop {
            timer_interval: Some(Duration::from_secs(1)),
            ..idle_loop(start)
        };
        assert_eq!(events.compute_timeout(now), Some(Duration::from_millis(600)));
    }

    #[test]
    fn test_throttled_render_waits_for_interval() {
        let start = Instant::now();
        let now = start + Duration::from_millis(5);
        let events = EventLoop {
            render_mode: RenderMode::Throttled(Duration::from_millis(20)),
            dirty: true,
            ..idle_loop(start)
        };
        assert_eq!(events.compute_timeout(now), Some(Duration::from_millis(15)));
    }
}
