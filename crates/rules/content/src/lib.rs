//! Rule fragments built on `rules-core`.
//!
//! - [`FeatureRegistry`]: named features, finalized per character onto a bus
//! - Built-in fragments: Rage, Sneak Attack, Bless, damage resistance
//! - TOML loaders for [`RulesConfig`](rules_core::RulesConfig) and character sheets
//!
//! Fragments only demonstrate the core contracts; they are not a complete
//! rules compendium.

pub mod character;
pub mod features;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use character::Character;
pub use features::{
    Bless, BlessModifier, DamageResistance, Feature, FeatureContext, FeatureRegistry, Grant, Rage,
    RageDamage, RegistryError, Resistance, SneakAttack, SneakAttackModifier,
};

#[cfg(feature = "loaders")]
pub use loaders::{CharacterLoader, ConfigLoader, LoadResult};
