use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rules_core::modifier::priority;
use rules_core::{
    ContextKey, DiceRoller, DurationHandle, EntityId, EventType, GameEvent, ListenerError,
    Modifier, ModifierSource, SourceKind,
};
use tracing::debug;

use super::{Feature, FeatureContext, Grant, half_level_rounded_up, modifier_id};
use crate::character::Character;

/// Extra damage once per turn with a finesse or ranged weapon.
///
/// Qualifies when the attacker has advantage, or an ally is adjacent to the
/// target and the attacker does not have disadvantage. The once-per-turn flag
/// clears at the start of every turn, so an unused attack stays available for
/// reactions on other creatures' turns.
pub struct SneakAttackModifier {
    id: String,
    source: ModifierSource,
    bearer: EntityId,
    dice_count: u32,
    dice: Arc<dyn DiceRoller>,
    used_this_turn: AtomicBool,
    duration: DurationHandle,
}

impl SneakAttackModifier {
    pub const SIDES: u32 = 6;

    pub fn new(character: &Character, dice: Arc<dyn DiceRoller>) -> Self {
        Self {
            id: modifier_id(SneakAttack::NAME, "damage", character),
            source: ModifierSource::new(
                SourceKind::Feature,
                "Sneak Attack",
                "extra damage once per turn with finesse or ranged weapons",
            ),
            bearer: character.id,
            dice_count: half_level_rounded_up(character.level),
            dice,
            used_this_turn: AtomicBool::new(false),
            duration: DurationHandle::permanent(),
        }
    }

    pub fn dice_count(&self) -> u32 {
        self.dice_count
    }

    pub fn used_this_turn(&self) -> bool {
        self.used_this_turn.load(Ordering::Acquire)
    }

    fn qualifies(&self, event: &GameEvent) -> bool {
        let weapon = event.flag(ContextKey::Finesse) || event.flag(ContextKey::Ranged);
        let advantage = event.flag(ContextKey::Advantage);
        let flanked =
            event.flag(ContextKey::AllyAdjacent) && !event.flag(ContextKey::Disadvantage);

        event.kind() == EventType::OnDamageRoll
            && event.actor() == Some(self.bearer)
            && !self.used_this_turn()
            && weapon
            && (advantage || flanked)
    }
}

impl Modifier for SneakAttackModifier {
    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> &ModifierSource {
        &self.source
    }

    fn priority(&self) -> i32 {
        priority::FEATURES + 10
    }

    fn observe(&self, event: &GameEvent) {
        if event.kind() == EventType::OnTurnStart {
            self.used_this_turn.store(false, Ordering::Release);
        }
    }

    fn condition(&self, event: &GameEvent) -> bool {
        self.qualifies(event)
    }

    fn apply(&self, event: &mut GameEvent) -> Result<(), ListenerError> {
        let count = if event.flag(ContextKey::Critical) {
            self.dice_count * 2
        } else {
            self.dice_count
        };
        let extra = self.dice.roll(count, Self::SIDES, 0)?;
        event.add_int(ContextKey::Damage, extra);
        self.used_this_turn.store(true, Ordering::Release);

        debug!(
            target: "rules::features",
            bearer = %self.bearer,
            dice = count,
            extra,
            "Sneak attack applied"
        );
        Ok(())
    }

    fn duration(&self) -> &DurationHandle {
        &self.duration
    }
}

/// Rogue sneak attack, `ceil(level / 2)`d6.
#[derive(Clone, Copy, Debug, Default)]
pub struct SneakAttack;

impl SneakAttack {
    pub const NAME: &'static str = "sneak_attack";
}

impl Feature for SneakAttack {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn grant(&self, character: &Character, ctx: &FeatureContext) -> Vec<Grant> {
        let modifier = SneakAttackModifier::new(character, Arc::clone(&ctx.dice));
        vec![Grant::new(
            Arc::new(modifier),
            [EventType::OnDamageRoll, EventType::OnTurnStart],
        )]
    }
}
