//! Character sheet consumed by the feature registry.

use rules_core::EntityId;

/// The slice of a character the rule fragments need.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Character {
    pub id: EntityId,
    pub name: String,
    /// Character level, 1..=20.
    pub level: u8,
    /// Feature names resolved through a [`FeatureRegistry`](crate::FeatureRegistry).
    #[cfg_attr(feature = "serde", serde(default))]
    pub features: Vec<String>,
}

impl Character {
    pub const MAX_LEVEL: u8 = 20;

    pub fn new(id: EntityId, name: impl Into<String>, level: u8) -> Self {
        Self {
            id,
            name: name.into(),
            level: level.clamp(1, Self::MAX_LEVEL),
            features: Vec::new(),
        }
    }

    /// Adds a feature by name (builder pattern).
    #[must_use]
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_clamped() {
        assert_eq!(Character::new(EntityId(1), "a", 0).level, 1);
        assert_eq!(Character::new(EntityId(1), "a", 25).level, 20);
    }

    #[test]
    fn features_builder() {
        let character = Character::new(EntityId(1), "Grog", 5).with_feature("rage");
        assert!(character.has_feature("rage"));
        assert!(!character.has_feature("sneak_attack"));
    }
}
