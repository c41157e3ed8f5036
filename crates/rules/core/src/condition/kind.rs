//! Condition and duration type tags.

/// Status conditions tracked per entity.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ConditionType {
    Blinded,
    Charmed,
    Deafened,
    /// Accumulates levels instead of creating duplicate instances.
    Exhaustion,
    Frightened,
    Grappled,
    Incapacitated,
    Invisible,
    Paralyzed,
    Petrified,
    Poisoned,
    Prone,
    Restrained,
    Stunned,
    Unconscious,
    /// Maintaining a concentration spell. Damage requests a concentration check.
    Concentration,
}

impl ConditionType {
    /// Only Exhaustion stacks.
    pub const fn is_stacking(self) -> bool {
        matches!(self, Self::Exhaustion)
    }
}

/// Clock that governs when a condition ends.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DurationType {
    /// Counted down by round ends.
    Rounds,
    /// Counted down by the bearer's turn starts.
    Turns,
    /// Ends on the first positive damage.
    UntilDamaged,
    /// Ends on a successful save at the end of the bearer's turn.
    SaveEnds,
    /// Ends at the end of the bearer's next turn.
    EndOfNextTurn,
    /// Ends on a short or long rest.
    UntilShortRest,
    /// Ends on a long rest.
    UntilLongRest,
    /// Ends only when removed explicitly.
    Permanent,
}

impl DurationType {
    /// Whether `remaining` is counted down by a clock.
    pub const fn is_counted(self) -> bool {
        matches!(self, Self::Rounds | Self::Turns)
    }
}

/// Why a condition left the manager. Carried in removal notifications.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum RemovalReason {
    /// Counted duration ran out.
    Expired,
    /// Removed by id or type.
    Removed,
    /// Ended by taking damage.
    Damaged,
    /// Ended by a successful saving throw.
    Saved,
    /// End of the bearer's next turn.
    TurnEnded,
    /// Ended by a rest.
    Rested,
    /// Exhaustion reduced to level zero.
    Recovered,
    /// Concentration broken.
    ConcentrationBroken,
}
