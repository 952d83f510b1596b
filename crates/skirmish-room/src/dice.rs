//! Sources of randomness for combat rolls.
//!
//! Rooms never touch a global RNG. Each room actor owns one boxed
//! [`Dice`], handed out by the registry's factory, so tests can script
//! every roll with [`FixedDice`] and servers can seed [`RngDice`] for
//! replayable games.

use std::collections::VecDeque;
use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws a value from an inclusive range.
pub trait Dice: Send {
    /// Returns a value inside `range`. An empty range yields its start.
    fn roll(&mut self, range: RangeInclusive<u32>) -> u32;
}

/// Uniform rolls from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngDice<R> {
    rng: R,
}

impl<R> RngDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDice<StdRng> {
    /// Seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Same seed, same sequence of rolls.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> Dice for RngDice<R> {
    fn roll(&mut self, range: RangeInclusive<u32>) -> u32 {
        if range.is_empty() {
            return *range.start();
        }
        self.rng.random_range(range)
    }
}

/// Scripted rolls, consumed in order.
///
/// Each value is clamped into the requested range. Once the script runs
/// out, rolls fall back to the repeating value if one was set, otherwise
/// to the low end of the range.
#[derive(Debug, Clone, Default)]
pub struct FixedDice {
    script: VecDeque<u32>,
    fallback: Option<u32>,
}

impl FixedDice {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            script: rolls.into_iter().collect(),
            fallback: None,
        }
    }

    /// Every roll returns `value` (clamped).
    pub fn repeating(value: u32) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: Some(value),
        }
    }

    /// Scripted rolls not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Dice for FixedDice {
    fn roll(&mut self, range: RangeInclusive<u32>) -> u32 {
        let (low, high) = (*range.start(), *range.end());
        match self.script.pop_front().or(self.fallback) {
            Some(value) if low <= high => value.clamp(low, high),
            _ => low,
        }
    }
}
