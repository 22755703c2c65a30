use std::{fmt, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::piece::PieceKind;

/// Supplies piece kinds and keeps the hold slot.
///
/// # Randomizer
///
/// Every new next piece is an independent uniform draw over the seven kinds.
/// There is no bag, so repeats and droughts are possible.
///
/// # Hold
///
/// - The first hold stores the current piece and promotes the next piece
/// - Later holds swap the current piece with the held one without drawing
///
/// # Example
///
/// ```
/// use stackfall_engine::{PieceGenerator, PieceSeed};
///
/// let seed: PieceSeed = "000102030405060708090a0b0c0d0e0f".parse().unwrap();
/// let mut a = PieceGenerator::with_seed(seed);
/// let mut b = PieceGenerator::with_seed(seed);
/// for _ in 0..10 {
///     assert_eq!(a.pop_next(), b.pop_next());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    rng: Pcg32,
    next: PieceKind,
    held: Option<PieceKind>,
}

impl Default for PieceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceGenerator {
    /// Creates a generator with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic piece generation.
    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        let mut rng = Pcg32::from_seed(seed.0);
        let next = rng.random();
        Self {
            rng,
            next,
            held: None,
        }
    }

    /// Takes the next piece and draws a new one in its place.
    pub fn pop_next(&mut self) -> PieceKind {
        let new_next = self.rng.random();
        std::mem::replace(&mut self.next, new_next)
    }

    #[must_use]
    pub fn peek_next(&self) -> PieceKind {
        self.next
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<PieceKind> {
        self.held
    }

    /// Stores `current` in the hold slot and returns the piece that replaces it.
    ///
    /// - If a piece is held: returns the held piece (swap)
    /// - If no piece is held: returns the next piece and draws a new next
    pub fn swap_hold(&mut self, current: PieceKind) -> PieceKind {
        match self.held.replace(current) {
            Some(held) => held,
            None => self.pop_next(),
        }
    }

    /// Derives a fresh seed from this generator's stream.
    ///
    /// Used to reseed a restarted session so a seeded run stays reproducible.
    pub fn fork_seed(&mut self) -> PieceSeed {
        self.rng.random()
    }
}

/// Seed for deterministic piece generation.
///
/// A 128-bit seed for the piece generator's random number generator. It is
/// written as a 32-character hex string both in text and in serialized form.
///
/// # Example
///
/// ```
/// use stackfall_engine::{GameSession, PieceSeed};
/// use rand::Rng as _;
///
/// let seed: PieceSeed = rand::rng().random();
///
/// let session1 = GameSession::with_seed(seed);
/// let session2 = GameSession::with_seed(seed);
/// assert_eq!(session1.next_piece(), session2.next_piece());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ParseSeedError {
    #[display("invalid hex: expected 32 characters, got {_0}")]
    Length(#[error(not(source))] usize),
    #[display("invalid hex: {_0}")]
    Digits(std::num::ParseIntError),
}

impl FromStr for PieceSeed {
    type Err = ParseSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(ParseSeedError::Length(s.len()));
        }
        let num = u128::from_str_radix(s, 16).map_err(ParseSeedError::Digits)?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random `PieceSeed` values using the standard random distribution.
impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}
