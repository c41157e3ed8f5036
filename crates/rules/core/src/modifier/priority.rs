//! Priority band conventions.
//!
//! Independently authored modifiers pick a value inside their band so that the
//! relative order of, say, a class feature and a magic item is deterministic
//! without either author knowing about the other. Lower values run first.

pub const PRE_CALCULATION: i32 = 0;
pub const FEATURES: i32 = 100;
pub const STATUS_EFFECTS: i32 = 200;
pub const EQUIPMENT: i32 = 300;
pub const TEMPORARY: i32 = 400;
pub const POST_CALCULATION: i32 = 500;

/// Runs after every conventional band; used by duration trackers so they
/// observe the fully modified event.
pub const CLOCK: i32 = i32::MAX;

/// Named priority ranges.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum PriorityBand {
    /// 0–99: base values, setup.
    PreCalculation,
    /// 100–199: class and race features.
    Features,
    /// 200–299: conditions and status effects.
    StatusEffects,
    /// 300–399: equipment and items.
    Equipment,
    /// 400–499: temporary bonuses (spells, inspiration).
    Temporary,
    /// 500+: caps, clamps, final adjustments.
    PostCalculation,
}

impl PriorityBand {
    /// Lowest priority inside the band.
    pub const fn base(self) -> i32 {
        match self {
            Self::PreCalculation => PRE_CALCULATION,
            Self::Features => FEATURES,
            Self::StatusEffects => STATUS_EFFECTS,
            Self::Equipment => EQUIPMENT,
            Self::Temporary => TEMPORARY,
            Self::PostCalculation => POST_CALCULATION,
        }
    }

    /// Band a priority falls into. Negative priorities count as pre-calculation.
    pub const fn of(priority: i32) -> Self {
        match priority {
            i32::MIN..FEATURES => Self::PreCalculation,
            FEATURES..STATUS_EFFECTS => Self::Features,
            STATUS_EFFECTS..EQUIPMENT => Self::StatusEffects,
            EQUIPMENT..TEMPORARY => Self::Equipment,
            TEMPORARY..POST_CALCULATION => Self::Temporary,
            _ => Self::PostCalculation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_their_ranges() {
        assert_eq!(PriorityBand::of(-5), PriorityBand::PreCalculation);
        assert_eq!(PriorityBand::of(99), PriorityBand::PreCalculation);
        assert_eq!(PriorityBand::of(100), PriorityBand::Features);
        assert_eq!(PriorityBand::of(250), PriorityBand::StatusEffects);
        assert_eq!(PriorityBand::of(399), PriorityBand::Equipment);
        assert_eq!(PriorityBand::of(450), PriorityBand::Temporary);
        assert_eq!(PriorityBand::of(10_000), PriorityBand::PostCalculation);
        assert_eq!(PriorityBand::of(CLOCK), PriorityBand::PostCalculation);
    }

    #[test]
    fn base_round_trips() {
        for band in [
            PriorityBand::PreCalculation,
            PriorityBand::Features,
            PriorityBand::StatusEffects,
            PriorityBand::Equipment,
            PriorityBand::Temporary,
            PriorityBand::PostCalculation,
        ] {
            assert_eq!(PriorityBand::of(band.base()), band);
        }
    }
}
