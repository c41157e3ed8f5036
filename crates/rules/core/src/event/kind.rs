//! Trigger points rule fragments can observe.

/// Closed set of moments at which the bus dispatches a [`GameEvent`](super::GameEvent).
///
/// Most game actions come in three phases:
/// - `Before*`: declare intent, grant advantage, cancel the action
/// - `On*`: alter the rolled numbers
/// - `After*`: react to the outcome
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EventType {
    // ========================================================================
    // Attack rolls
    // ========================================================================
    BeforeAttackRoll,
    OnAttackRoll,
    AfterAttackRoll,

    // ========================================================================
    // Damage rolls (attacker side)
    // ========================================================================
    BeforeDamageRoll,
    OnDamageRoll,
    AfterDamageRoll,

    // ========================================================================
    // Taking damage (defender side)
    // ========================================================================
    BeforeTakeDamage,
    OnTakeDamage,
    AfterTakeDamage,

    // ========================================================================
    // Saving throws and ability checks
    // ========================================================================
    BeforeSavingThrow,
    OnSavingThrow,
    AfterSavingThrow,
    BeforeAbilityCheck,
    OnAbilityCheck,
    AfterAbilityCheck,

    // ========================================================================
    // Spellcasting
    // ========================================================================
    BeforeSpellCast,
    OnSpellCast,
    AfterSpellCast,

    // ========================================================================
    // Clocks
    // ========================================================================
    OnTurnStart,
    OnTurnEnd,
    OnRoundStart,
    OnRoundEnd,
    OnShortRest,
    OnLongRest,

    // ========================================================================
    // Condition lifecycle (emitted by condition managers)
    // ========================================================================
    OnConditionApplied,
    OnConditionModified,
    OnConditionRemoved,
    OnConcentrationCheck,
}

impl EventType {
    /// Returns true for events that carry a damage amount for the defender.
    pub const fn is_damage_taken(self) -> bool {
        matches!(
            self,
            Self::BeforeTakeDamage | Self::OnTakeDamage | Self::AfterTakeDamage
        )
    }

    /// Returns true for turn, round, and rest boundaries.
    pub const fn is_clock(self) -> bool {
        matches!(
            self,
            Self::OnTurnStart
                | Self::OnTurnEnd
                | Self::OnRoundStart
                | Self::OnRoundEnd
                | Self::OnShortRest
                | Self::OnLongRest
        )
    }

    /// Returns true for notifications produced by condition managers.
    pub const fn is_condition_lifecycle(self) -> bool {
        matches!(
            self,
            Self::OnConditionApplied
                | Self::OnConditionModified
                | Self::OnConditionRemoved
                | Self::OnConcentrationCheck
        )
    }
}
