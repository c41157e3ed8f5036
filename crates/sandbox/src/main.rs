//! Rules sandbox entry point.
mod config;
mod encounter;

use std::sync::Arc;

use anyhow::{Context, Result};
use rules_content::{ConfigLoader, FeatureRegistry};
use rules_core::{RulesConfig, SeededDice};
use tracing::info;

use config::SandboxConfig;
use encounter::Encounter;

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SandboxConfig::from_env();
    let rules = match &config.rules_config {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("loading rules config from {}", path.display()))?,
        None => RulesConfig::default(),
    };
    info!(seed = config.seed, rounds = config.rounds, ?rules, "Starting sandbox");

    let registry =
        FeatureRegistry::with_defaults(Arc::new(SeededDice::new(config.seed))).with_config(rules);
    let summary = Encounter::new(&registry)?.run(config.rounds)?;

    info!(rounds = summary.rounds, ogre_hp = summary.ogre_hp, "Encounter finished");
    for (name, hp) in &summary.party {
        info!(combatant = name.as_str(), hp, "Party member");
    }
    Ok(())
}
