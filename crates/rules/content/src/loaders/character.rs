//! Character sheet loader.

use std::path::Path;

use crate::character::Character;
use crate::loaders::{LoadResult, read_file};

/// Loads a [`Character`] from TOML.
///
/// ```toml
/// id = 1
/// name = "Grog"
/// level = 5
/// features = ["rage"]
/// ```
pub struct CharacterLoader;

impl CharacterLoader {
    pub fn load(path: &Path) -> LoadResult<Character> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| e.context(format!("Invalid character sheet {}", path.display())))
    }

    pub fn parse(content: &str) -> LoadResult<Character> {
        let character: Character = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse character TOML: {}", e))?;

        anyhow::ensure!(
            (1..=Character::MAX_LEVEL).contains(&character.level),
            "level {} is outside 1..={}",
            character.level,
            Character::MAX_LEVEL
        );
        Ok(character)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_core::EntityId;

    #[test]
    fn parses_sheet() {
        let character = CharacterLoader::parse(
            r#"
id = 4
name = "Vex"
level = 7
features = ["sneak_attack", "bless"]
"#,
        )
        .unwrap();
        assert_eq!(character.id, EntityId(4));
        assert_eq!(character.level, 7);
        assert!(character.has_feature("bless"));
    }

    #[test]
    fn features_default_to_empty() {
        let character = CharacterLoader::parse("id = 1\nname = \"Pike\"\nlevel = 1\n").unwrap();
        assert!(character.features.is_empty());
    }

    #[test]
    fn rejects_bad_level() {
        assert!(CharacterLoader::parse("id = 1\nname = \"x\"\nlevel = 0\n").is_err());
        assert!(CharacterLoader::parse("id = 1\nname = \"x\"\nlevel = 21\n").is_err());
    }
}
