use std::collections::BTreeMap;
use std::sync::Arc;

use rules_core::{Bus, DamageType, DiceRoller, ErrorSeverity, ModifierSet, RulesConfig, RulesError};
use tracing::{debug, info};

use super::{Bless, Feature, FeatureContext, Rage, Resistance, SneakAttack};
use crate::character::Character;

/// Errors raised while registering or attaching features.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("feature '{0}' is already registered")]
    DuplicateFeature(String),

    #[error("character '{character}' lists unknown feature '{feature}'")]
    UnknownFeature { character: String, feature: String },
}

impl RulesError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateFeature(_) => "REGISTRY_DUPLICATE_FEATURE",
            Self::UnknownFeature { .. } => "REGISTRY_UNKNOWN_FEATURE",
        }
    }
}

/// Named features available to characters.
///
/// Built once at startup and passed by reference; nothing is global.
pub struct FeatureRegistry {
    features: BTreeMap<String, Arc<dyn Feature>>,
    ctx: FeatureContext,
}

impl FeatureRegistry {
    /// Creates an empty registry.
    pub fn new(dice: Arc<dyn DiceRoller>) -> Self {
        Self {
            features: BTreeMap::new(),
            ctx: FeatureContext {
                config: RulesConfig::default(),
                dice,
            },
        }
    }

    /// Creates a registry holding every built-in feature.
    pub fn with_defaults(dice: Arc<dyn DiceRoller>) -> Self {
        let mut registry = Self::new(dice);
        let builtins: [Arc<dyn Feature>; 4] = [
            Arc::new(Rage),
            Arc::new(SneakAttack),
            Arc::new(Bless),
            Arc::new(Resistance::new("fire_resistance", DamageType::Fire)),
        ];
        for feature in builtins {
            registry
                .features
                .insert(feature.name().to_owned(), feature);
        }
        registry
    }

    /// Replaces the rule configuration (builder pattern).
    #[must_use]
    pub fn with_config(mut self, config: RulesConfig) -> Self {
        self.ctx.config = config;
        self
    }

    pub fn config(&self) -> &RulesConfig {
        &self.ctx.config
    }

    pub fn dice(&self) -> &Arc<dyn DiceRoller> {
        &self.ctx.dice
    }

    /// Adds a feature. Names are unique.
    pub fn register(&mut self, feature: Arc<dyn Feature>) -> Result<(), RegistryError> {
        let name = feature.name().to_owned();
        if self.features.contains_key(&name) {
            return Err(RegistryError::DuplicateFeature(name));
        }
        debug!(target: "rules::features", feature = %name, "Feature registered");
        self.features.insert(name, feature);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Feature>> {
        self.features.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Instantiates every feature `character` lists and subscribes the
    /// resulting modifiers on `bus`.
    ///
    /// All names are resolved before anything is subscribed, so an unknown
    /// feature leaves the bus untouched.
    pub fn finalize(&self, character: &Character, bus: &dyn Bus) -> Result<ModifierSet, RegistryError> {
        let features = character
            .features
            .iter()
            .map(|name| {
                self.features
                    .get(name)
                    .ok_or_else(|| RegistryError::UnknownFeature {
                        character: character.name.clone(),
                        feature: name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut set = ModifierSet::new();
        for feature in features {
            for grant in feature.grant(character, &self.ctx) {
                set.register(bus, grant.modifier, &grant.events);
            }
        }

        info!(
            target: "rules::features",
            character = %character.name,
            entity = %character.id,
            features = character.features.len(),
            modifiers = set.len(),
            "Character features finalized"
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_core::{EntityId, EventBus, EventType, FixedDice};

    fn registry() -> FeatureRegistry {
        FeatureRegistry::with_defaults(Arc::new(FixedDice(1)))
    }

    #[test]
    fn defaults_are_registered() {
        let registry = registry();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["bless", "fire_resistance", "rage", "sneak_attack"]
        );
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = registry();
        let err = registry.register(Arc::new(Rage)).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateFeature("rage".into()));
        assert_eq!(err.error_code(), "REGISTRY_DUPLICATE_FEATURE");
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn finalize_subscribes_modifiers() {
        let registry = registry();
        let bus = EventBus::new();
        let character = Character::new(EntityId(1), "Grog", 3)
            .with_feature("rage")
            .with_feature("sneak_attack");

        let set = registry.finalize(&character, &bus).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(bus.listener_count(EventType::OnDamageRoll), 2);
        assert_eq!(bus.listener_count(EventType::OnTakeDamage), 1);
        // Rage clocks: round end and the attack that refreshes it, once per modifier.
        assert_eq!(bus.listener_count(EventType::OnRoundEnd), 2);
        assert_eq!(bus.listener_count(EventType::OnAttackRoll), 2);
    }

    #[test]
    fn unknown_feature_leaves_bus_untouched() {
        let registry = registry();
        let bus = EventBus::new();
        let character = Character::new(EntityId(1), "Scanlan", 3)
            .with_feature("rage")
            .with_feature("bardic_inspiration");

        let err = registry.finalize(&character, &bus).err();
        assert!(matches!(
            err,
            Some(RegistryError::UnknownFeature { ref feature, .. }) if feature == "bardic_inspiration"
        ));
        assert_eq!(bus.total_listener_count(), 0);
    }
}
