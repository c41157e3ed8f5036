//! Shared rule vocabulary: damage types and saving-throw targets.

/// Damage types.
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
pub enum DamageType {
    Acid,
    Bludgeoning,
    Cold,
    Fire,
    Force,
    Lightning,
    Necrotic,
    Piercing,
    Poison,
    Psychic,
    Radiant,
    Slashing,
    Thunder,
}

impl DamageType {
    /// Bludgeoning, piercing, or slashing.
    pub const fn is_physical(self) -> bool {
        matches!(self, Self::Bludgeoning | Self::Piercing | Self::Slashing)
    }
}

/// Which saving throws an effect entry applies to.
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
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SaveTarget {
    /// Every saving throw.
    All,
    #[strum(to_string = "str", serialize = "strength")]
    Strength,
    #[strum(to_string = "dex", serialize = "dexterity")]
    Dexterity,
    #[strum(to_string = "con", serialize = "constitution")]
    Constitution,
    #[strum(to_string = "int", serialize = "intelligence")]
    Intelligence,
    #[strum(to_string = "wis", serialize = "wisdom")]
    Wisdom,
    #[strum(to_string = "cha", serialize = "charisma")]
    Charisma,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn save_targets_parse_short_and_long_names() {
        assert_eq!(SaveTarget::from_str("dex").unwrap(), SaveTarget::Dexterity);
        assert_eq!(SaveTarget::from_str("Wisdom").unwrap(), SaveTarget::Wisdom);
        assert_eq!(SaveTarget::from_str("all").unwrap(), SaveTarget::All);
        assert_eq!(SaveTarget::Strength.to_string(), "str");
    }

    #[test]
    fn physical_damage_types() {
        assert!(DamageType::Slashing.is_physical());
        assert!(!DamageType::Fire.is_physical());
        assert_eq!(DamageType::from_str("PIERCING").unwrap(), DamageType::Piercing);
    }
}
