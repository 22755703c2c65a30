use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

/// Play time after which the drop interval shrinks by one step.
const SPEED_STEP: Duration = Duration::from_secs(30);

/// Speed and scoring parameters of a session.
///
/// Chosen once before a session starts and never changed while it runs.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use stackfall_engine::DifficultyParams;
///
/// let params = DifficultyParams::default();
/// assert_eq!(params.drop_interval(Duration::ZERO), Duration::from_millis(300));
/// assert_eq!(params.drop_interval(Duration::from_secs(65)), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParams {
    pub base_interval_ms: u64,
    pub min_interval_ms: u64,
    /// Interval reduction applied for every 30 seconds of play.
    pub decrease_per_step_ms: u64,
    pub score_multiplier: f64,
}

impl Default for DifficultyParams {
    fn default() -> Self {
        Self {
            base_interval_ms: 300,
            min_interval_ms: 20,
            decrease_per_step_ms: 25,
            score_multiplier: 1.0,
        }
    }
}

impl DifficultyParams {
    /// Time between gravity steps after `elapsed` of unpaused play.
    #[must_use]
    pub fn drop_interval(&self, elapsed: Duration) -> Duration {
        let steps = elapsed.as_secs() / SPEED_STEP.as_secs();
        let ms = self
            .base_interval_ms
            .saturating_sub(steps.saturating_mul(self.decrease_per_step_ms))
            .max(self.min_interval_ms);
        Duration::from_millis(ms)
    }

    /// Scales `points` by the score multiplier, rounding down.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn apply_multiplier(&self, points: u32) -> u64 {
        (f64::from(points) * self.score_multiplier).floor() as u64
    }
}

/// Named difficulty presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Facil,
    Normal,
    Dificil,
    Imposible,
}

impl Difficulty {
    pub const ALL: [Self; 4] = [
        Difficulty::Facil,
        Difficulty::Normal,
        Difficulty::Dificil,
        Difficulty::Imposible,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Difficulty::Facil => "facil",
            Difficulty::Normal => "normal",
            Difficulty::Dificil => "dificil",
            Difficulty::Imposible => "imposible",
        }
    }

    #[must_use]
    pub const fn params(self) -> DifficultyParams {
        let (base_interval_ms, min_interval_ms, score_multiplier) = match self {
            Difficulty::Facil => (500, 60, 0.8),
            Difficulty::Normal => (400, 50, 1.0),
            Difficulty::Dificil => (200, 30, 1.5),
            Difficulty::Imposible => (100, 10, 2.0),
        };
        DifficultyParams {
            base_interval_ms,
            min_interval_ms,
            decrease_per_step_ms: 20,
            score_multiplier,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("unknown difficulty '{name}' (expected facil, normal, dificil or imposible)")]
pub struct ParseDifficultyError {
    name: String,
}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseDifficultyError { name: s.to_owned() })
    }
}
