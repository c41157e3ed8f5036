//! Dice rolling oracle.
//!
//! Rule fragments that roll (Sneak Attack, Bless) receive an `Arc<dyn DiceRoller>`
//! so that tests and replays can inject a seeded source.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ErrorSeverity, RulesError};

/// Errors raised by [`DiceRoller::roll`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    #[error("at least one die must be rolled")]
    NoDice,

    #[error("a die needs at least one side, got {0}")]
    NoSides(u32),

    #[error("dice total overflowed rolling {count}d{sides}")]
    Overflow { count: u32, sides: u32 },
}

impl RulesError for DiceError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoDice => "DICE_NO_DICE",
            Self::NoSides(_) => "DICE_NO_SIDES",
            Self::Overflow { .. } => "DICE_OVERFLOW",
        }
    }
}

/// Source of dice rolls.
pub trait DiceRoller: Send + Sync {
    /// Rolls a single die, returning a value in `1..=sides`.
    fn roll_die(&self, sides: u32) -> Result<u32, DiceError>;

    /// Rolls `count` dice of `sides` faces and adds `modifier`.
    fn roll(&self, count: u32, sides: u32, modifier: i32) -> Result<i32, DiceError> {
        if count == 0 {
            return Err(DiceError::NoDice);
        }
        if sides == 0 {
            return Err(DiceError::NoSides(sides));
        }
        let mut total = modifier;
        for _ in 0..count {
            let face = i32::try_from(self.roll_die(sides)?)
                .map_err(|_| DiceError::Overflow { count, sides })?;
            total = total
                .checked_add(face)
                .ok_or(DiceError::Overflow { count, sides })?;
        }
        Ok(total)
    }
}

/// Deterministic PCG-XSH-RR roller.
///
/// Each roll advances a shared 64-bit state, so a fixed seed reproduces the
/// same roll sequence across runs.
#[derive(Debug)]
pub struct SeededDice {
    state: AtomicU64,
}

impl SeededDice {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        Self {
            state: AtomicU64::new(Self::step(seed.wrapping_add(Self::INCREMENT))),
        }
    }

    #[inline]
    fn step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    /// XSH-RR output permutation.
    #[inline]
    fn output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    fn next_u32(&self) -> u32 {
        let previous = self
            .state
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| Some(Self::step(s)))
            .unwrap_or_else(|s| s);
        Self::output(previous)
    }
}

impl DiceRoller for SeededDice {
    fn roll_die(&self, sides: u32) -> Result<u32, DiceError> {
        if sides == 0 {
            return Err(DiceError::NoSides(sides));
        }
        Ok(self.next_u32() % sides + 1)
    }
}

/// Always rolls the same face, clamped to the die size. Handy in tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedDice(pub u32);

impl DiceRoller for FixedDice {
    fn roll_die(&self, sides: u32) -> Result<u32, DiceError> {
        if sides == 0 {
            return Err(DiceError::NoSides(sides));
        }
        Ok(self.0.clamp(1, sides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let a = SeededDice::new(42);
        let b = SeededDice::new(42);
        let rolls_a: Vec<_> = (0..20).map(|_| a.roll(1, 20, 0).unwrap()).collect();
        let rolls_b: Vec<_> = (0..20).map(|_| b.roll(1, 20, 0).unwrap()).collect();
        assert_eq!(rolls_a, rolls_b);
    }

    #[test]
    fn rolls_stay_in_range() {
        let dice = SeededDice::new(7);
        for _ in 0..500 {
            let total = dice.roll(3, 6, 2).unwrap();
            assert!((5..=20).contains(&total), "3d6+2 rolled {total}");
        }
    }

    #[test]
    fn zero_sides_is_rejected() {
        let dice = SeededDice::new(1);
        assert_eq!(dice.roll(1, 0, 0), Err(DiceError::NoSides(0)));
        assert_eq!(dice.roll(2, 0, 0).unwrap_err().error_code(), "DICE_NO_SIDES");
        assert_eq!(dice.roll(0, 6, 0), Err(DiceError::NoDice));
    }

    #[test]
    fn fixed_dice_clamps_to_die() {
        assert_eq!(FixedDice(4).roll(2, 6, 3).unwrap(), 11);
        assert_eq!(FixedDice(9).roll(1, 4, 0).unwrap(), 4);
    }
}
