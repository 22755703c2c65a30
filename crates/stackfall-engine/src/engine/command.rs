use std::str::FromStr;

use super::difficulty::{Difficulty, ParseDifficultyError};

/// A player command, applied with [`GameSession::apply`](super::GameSession::apply).
///
/// Commands can be parsed from short words, which is how front ends and
/// scripted runs feed input to a session:
///
/// ```
/// use stackfall_engine::{Command, Difficulty};
///
/// assert_eq!("left".parse::<Command>().unwrap(), Command::MoveLeft);
/// assert_eq!(
///     "difficulty dificil".parse::<Command>().unwrap(),
///     Command::SelectDifficulty(Difficulty::Dificil),
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    TogglePause,
    MoveLeft,
    MoveRight,
    /// Press (`true`) or release (`false`) soft drop.
    SoftDrop(bool),
    Rotate,
    HardDrop,
    Hold,
    SelectDifficulty(Difficulty),
    Restart,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ParseCommandError {
    #[display("unknown command '{_0}'")]
    Unknown(#[error(not(source))] String),
    #[display("missing difficulty name")]
    MissingDifficulty,
    #[display("{_0}")]
    Difficulty(ParseDifficultyError),
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let word = words.next().unwrap_or_default();
        let command = match word {
            "start" => Command::Start,
            "pause" => Command::TogglePause,
            "left" => Command::MoveLeft,
            "right" => Command::MoveRight,
            "soft-drop-on" => Command::SoftDrop(true),
            "soft-drop-off" => Command::SoftDrop(false),
            "rotate" => Command::Rotate,
            "hard-drop" => Command::HardDrop,
            "hold" => Command::Hold,
            "restart" => Command::Restart,
            "difficulty" => {
                let name = words.next().ok_or(ParseCommandError::MissingDifficulty)?;
                let difficulty = name.parse().map_err(ParseCommandError::Difficulty)?;
                Command::SelectDifficulty(difficulty)
            }
            _ => return Err(ParseCommandError::Unknown(s.trim().to_owned())),
        };
        if words.next().is_some() {
            return Err(ParseCommandError::Unknown(s.trim().to_owned()));
        }
        Ok(command)
    }
}
