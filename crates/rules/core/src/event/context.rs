//! Typed keys and values carried in a [`GameEvent`](super::GameEvent) context.
//!
//! The key set is closed so that independently authored fragments agree on
//! spelling. Fragments that need private bookkeeping use [`ContextKey::Custom`].

use std::fmt;

/// Well-known context entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextKey {
    /// Running damage total (int). Additive bonuses add to it, resistances halve it.
    Damage,
    /// Damage type name (string), e.g. `"slashing"`.
    DamageType,
    /// Natural or modified attack roll (int).
    AttackRoll,
    /// Flat bonus accumulated on an attack roll (int).
    AttackBonus,
    /// Accumulated bonus on a saving throw or ability check (int).
    RollBonus,
    /// Attack is a critical hit (bool).
    Critical,
    /// Roll is made with advantage (bool).
    Advantage,
    /// Roll is made with disadvantage (bool).
    Disadvantage,
    /// Attack is a melee attack (bool).
    Melee,
    /// Weapon has the finesse property (bool).
    Finesse,
    /// Attack is a ranged attack (bool).
    Ranged,
    /// An ally of the attacker is adjacent to the target (bool).
    AllyAdjacent,
    /// Difficulty class of a save or check (int).
    SaveDc,
    /// Ability used for a save or check (string), e.g. `"dex"`.
    Ability,
    /// Condition type name in lifecycle notifications (string).
    Condition,
    /// Condition identifier in lifecycle notifications (string).
    ConditionId,
    /// Stacking level in lifecycle notifications (int).
    Level,
    /// Remaining clock ticks in lifecycle notifications (int).
    Remaining,
    /// Why a condition was removed (string), e.g. `"expired"`.
    Reason,
    /// Generic amount, e.g. damage taken in a concentration check (int).
    Amount,
    /// Provenance of a condition (string).
    Source,
    /// Fragment-private entry.
    Custom(&'static str),
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Damage => "damage",
            Self::DamageType => "damage_type",
            Self::AttackRoll => "attack_roll",
            Self::AttackBonus => "attack_bonus",
            Self::RollBonus => "roll_bonus",
            Self::Critical => "critical",
            Self::Advantage => "advantage",
            Self::Disadvantage => "disadvantage",
            Self::Melee => "melee",
            Self::Finesse => "finesse",
            Self::Ranged => "ranged",
            Self::AllyAdjacent => "ally_adjacent",
            Self::SaveDc => "save_dc",
            Self::Ability => "ability",
            Self::Condition => "condition",
            Self::ConditionId => "condition_id",
            Self::Level => "level",
            Self::Remaining => "remaining",
            Self::Reason => "reason",
            Self::Amount => "amount",
            Self::Source => "source",
            Self::Custom(name) => name,
        };
        f.write_str(name)
    }
}

/// Value stored under a [`ContextKey`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextValue {
    Int(i32),
    Str(String),
    Bool(bool),
}

impl ContextValue {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}
