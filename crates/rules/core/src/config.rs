/// Rule engine constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RulesConfig {
    /// Highest level the stacking condition (Exhaustion) can reach.
    pub max_exhaustion_level: u8,

    /// Whether condition managers forward lifecycle notifications to their bus.
    pub notify_lifecycle: bool,

    /// Minimum DC of the concentration check requested after damage.
    pub concentration_dc_floor: i32,

    /// Divisor used by resistances on the `damage` context value (floor division).
    pub resistance_divisor: i32,
}

impl RulesConfig {
    // ===== fixed rule constants =====
    pub const EXHAUSTION_LEVEL_CAP: u8 = 6;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_CONCENTRATION_DC_FLOOR: i32 = 10;
    pub const DEFAULT_RESISTANCE_DIVISOR: i32 = 2;

    pub fn new() -> Self {
        Self {
            max_exhaustion_level: Self::EXHAUSTION_LEVEL_CAP,
            notify_lifecycle: true,
            concentration_dc_floor: Self::DEFAULT_CONCENTRATION_DC_FLOOR,
            resistance_divisor: Self::DEFAULT_RESISTANCE_DIVISOR,
        }
    }

    /// Concentration save DC for a single damage instance: half the damage,
    /// never below the configured floor.
    pub fn concentration_dc(&self, damage: i32) -> i32 {
        (damage / 2).max(self.concentration_dc_floor)
    }

    /// Applies resistance to a damage value using floor division.
    pub fn resist(&self, damage: i32) -> i32 {
        damage.div_euclid(self.resistance_divisor.max(1))
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concentration_dc_uses_floor_then_half_damage() {
        let config = RulesConfig::default();
        assert_eq!(config.concentration_dc(4), 10);
        assert_eq!(config.concentration_dc(22), 11);
        assert_eq!(config.concentration_dc(35), 17);
    }

    #[test]
    fn resistance_floors_odd_damage() {
        let config = RulesConfig::default();
        assert_eq!(config.resist(7), 3);
        assert_eq!(config.resist(8), 4);
        assert_eq!(config.resist(1), 0);
    }
}
