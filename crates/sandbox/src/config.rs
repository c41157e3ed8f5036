//! Sandbox configuration read from the environment.
use std::env;
use std::path::PathBuf;

/// Sandbox run settings.
#[derive(Clone, Debug)]
pub struct SandboxConfig {
    /// TOML file holding a `RulesConfig`; built-in defaults when unset.
    pub rules_config: Option<PathBuf>,
    /// Seed for the dice roller.
    pub seed: u64,
    /// Number of combat rounds to play.
    pub rounds: u32,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            rules_config: None,
            seed: 42,
            rounds: 3,
        }
    }
}

impl SandboxConfig {
    /// Construct configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RULES_CONFIG` - Path to a rules TOML file
    /// - `SANDBOX_SEED` - Dice seed (default: 42)
    /// - `SANDBOX_ROUNDS` - Rounds to play, at least 1 (default: 3)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(path) = read_env::<PathBuf>("RULES_CONFIG") {
            config.rules_config = Some(path);
        }
        if let Some(seed) = read_env::<u64>("SANDBOX_SEED") {
            config.seed = seed;
        }
        if let Some(rounds) = read_env::<u32>("SANDBOX_ROUNDS") {
            config.rounds = rounds.max(1);
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
