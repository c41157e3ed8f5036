//! Rules configuration loader.

use std::path::Path;

use rules_core::RulesConfig;

use crate::loaders::{LoadResult, read_file};

/// Loads [`RulesConfig`] from TOML. Missing keys keep their defaults.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> LoadResult<RulesConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<RulesConfig> {
        let config: RulesConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse rules config TOML: {}", e))?;

        anyhow::ensure!(
            config.max_exhaustion_level <= RulesConfig::EXHAUSTION_LEVEL_CAP,
            "max_exhaustion_level {} exceeds the cap of {}",
            config.max_exhaustion_level,
            RulesConfig::EXHAUSTION_LEVEL_CAP
        );
        anyhow::ensure!(
            config.resistance_divisor > 0,
            "resistance_divisor must be positive, got {}",
            config.resistance_divisor
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse("concentration_dc_floor = 12\n").unwrap();
        assert_eq!(config.concentration_dc_floor, 12);
        assert_eq!(config.max_exhaustion_level, 6);
        assert!(config.notify_lifecycle);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(ConfigLoader::parse("max_exhaustion_level = 9\n").is_err());
        assert!(ConfigLoader::parse("resistance_divisor = 0\n").is_err());
        assert!(ConfigLoader::parse("notify_lifecycle = \"yes\"\n").is_err());
    }
}
