use std::time::Duration;

/// Drop interval used while soft drop is held.
pub const FAST_DROP_INTERVAL: Duration = Duration::from_millis(20);

/// Time accumulator driving automatic descent.
///
/// Frame time is added with [`Gravity::accumulate`]; each call to
/// [`Gravity::take_step`] consumes one interval if enough time has built up.
/// Leftover time carries over to the next frame.
#[derive(Debug, Clone, Default)]
pub struct Gravity {
    accumulated: Duration,
    soft_drop: bool,
}

impl Gravity {
    #[must_use]
    pub fn is_soft_drop(&self) -> bool {
        self.soft_drop
    }

    pub fn set_soft_drop(&mut self, active: bool) {
        self.soft_drop = active;
    }

    #[must_use]
    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    /// Returns the fast-drop interval while soft drop is held, `computed` otherwise.
    #[must_use]
    pub fn effective_interval(&self, computed: Duration) -> Duration {
        if self.soft_drop {
            FAST_DROP_INTERVAL
        } else {
            computed
        }
    }

    pub fn accumulate(&mut self, delta: Duration) {
        self.accumulated += delta;
    }

    /// Consumes one `interval` from the accumulator, returning `true` if a step is due.
    pub fn take_step(&mut self, interval: Duration) -> bool {
        if self.accumulated >= interval {
            self.accumulated -= interval;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}

/// Session clock measuring unpaused play time.
///
/// The clock only moves when the session advances it, so tests and replays
/// are independent of wall-clock time.
#[derive(Debug, Clone, Default)]
pub struct PlayClock {
    now: Duration,
    started_at: Option<Duration>,
    pause_started_at: Option<Duration>,
    total_paused: Duration,
    stopped_at: Option<Duration>,
}

impl PlayClock {
    pub fn advance(&mut self, delta: Duration) {
        self.now += delta;
    }

    /// Marks the start of play, discarding any previous measurement.
    pub fn start(&mut self) {
        self.started_at = Some(self.now);
        self.pause_started_at = None;
        self.total_paused = Duration::ZERO;
        self.stopped_at = None;
    }

    pub fn pause(&mut self) {
        if self.pause_started_at.is_none() {
            self.pause_started_at = Some(self.now);
        }
    }

    pub fn resume(&mut self) {
        if let Some(paused_at) = self.pause_started_at.take() {
            self.total_paused += self.now - paused_at;
        }
    }

    /// Freezes the elapsed play time.
    pub fn stop(&mut self) {
        self.resume();
        self.stopped_at = Some(self.now);
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.pause_started_at.is_some()
    }

    /// Time spent paused, including the pause in progress.
    #[must_use]
    pub fn total_paused(&self) -> Duration {
        let ongoing = self
            .pause_started_at
            .map_or(Duration::ZERO, |paused_at| self.now - paused_at);
        self.total_paused + ongoing
    }

    /// Play time since [`PlayClock::start`], excluding pauses.
    #[must_use]
    pub fn elapsed_play(&self) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        let end = self
            .stopped_at
            .or(self.pause_started_at)
            .unwrap_or(self.now);
        (end - started_at).saturating_sub(self.total_paused)
    }
}
