//! Scripted three-versus-one exchange exercising the rules engine end to end.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use anyhow::{Context, Result};
use rules_content::{Bless, Character, FeatureRegistry};
use rules_core::modifier::priority;
use rules_core::{
    Bus, ConditionManager, ConditionType, ContextKey, DamageType, DiceRoller, DurationType,
    EntityId, EventBus, EventType, FnListener, GameEvent, ModifierSet,
};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug)]
struct Weapon {
    name: &'static str,
    dice: u32,
    sides: u32,
    bonus: i32,
    damage_type: DamageType,
    finesse: bool,
}

struct Combatant {
    character: Character,
    hp: i32,
    armor_class: i32,
    attack_bonus: i32,
    weapon: Weapon,
    conditions: Arc<ConditionManager>,
    modifiers: ModifierSet,
}

impl Combatant {
    fn id(&self) -> EntityId {
        self.character.id
    }

    fn name(&self) -> &str {
        &self.character.name
    }

    fn is_down(&self) -> bool {
        self.hp <= 0
    }
}

/// Final tallies of a run.
#[derive(Debug)]
pub struct Summary {
    pub rounds: u32,
    pub ogre_hp: i32,
    pub party: Vec<(String, i32)>,
}

pub struct Encounter {
    bus: Arc<EventBus>,
    dice: Arc<dyn DiceRoller>,
    party: Vec<Combatant>,
    ogre: Combatant,
    round: u32,
}

impl Encounter {
    const PIKE: usize = 2;

    /// Builds the party, finalizes their features, and has Pike cast Bless.
    pub fn new(registry: &FeatureRegistry) -> Result<Self> {
        let bus = Arc::new(EventBus::new());
        let dice = Arc::clone(registry.dice());

        let spawn = |character: Character, hp, armor_class, attack_bonus, weapon| -> Result<Combatant> {
            let modifiers = registry
                .finalize(&character, bus.as_ref())
                .with_context(|| format!("finalizing {}", character.name))?;
            let conditions = Arc::new(
                ConditionManager::with_bus(character.id, bus.clone())
                    .with_config(registry.config().clone()),
            );
            Ok(Combatant {
                character,
                hp,
                armor_class,
                attack_bonus,
                weapon,
                conditions,
                modifiers,
            })
        };

        let party = vec![
            spawn(
                Character::new(EntityId(1), "Grog", 5).with_feature("rage"),
                55,
                15,
                7,
                Weapon {
                    name: "greataxe",
                    dice: 1,
                    sides: 12,
                    bonus: 4,
                    damage_type: DamageType::Slashing,
                    finesse: false,
                },
            )?,
            spawn(
                Character::new(EntityId(2), "Vex", 5).with_feature("sneak_attack"),
                38,
                16,
                7,
                Weapon {
                    name: "rapier",
                    dice: 1,
                    sides: 8,
                    bonus: 4,
                    damage_type: DamageType::Piercing,
                    finesse: true,
                },
            )?,
            spawn(
                Character::new(EntityId(3), "Pike", 5).with_feature("fire_resistance"),
                40,
                18,
                5,
                Weapon {
                    name: "mace",
                    dice: 1,
                    sides: 6,
                    bonus: 2,
                    damage_type: DamageType::Bludgeoning,
                    finesse: false,
                },
            )?,
        ];
        let ogre = spawn(
            Character::new(EntityId(10), "Ogre", 5),
            59,
            11,
            6,
            Weapon {
                name: "greatclub",
                dice: 2,
                sides: 8,
                bonus: 4,
                damage_type: DamageType::Bludgeoning,
                finesse: false,
            },
        )?;

        let mut encounter = Self {
            bus,
            dice,
            party,
            ogre,
            round: 0,
        };
        encounter.install_concentration_saves();
        encounter.cast_bless()?;
        Ok(encounter)
    }

    /// Resolves concentration checks with a Constitution save routed through
    /// the bus, so save modifiers such as Bless apply.
    ///
    /// The listener lives in the bus it emits to, so it holds only weak
    /// handles to the bus and the managers.
    fn install_concentration_saves(&self) {
        let managers: HashMap<EntityId, Weak<ConditionManager>> = self
            .party
            .iter()
            .chain([&self.ogre])
            .map(|c| (c.id(), Arc::downgrade(&c.conditions)))
            .collect();
        let bus = Arc::downgrade(&self.bus);
        let dice = Arc::clone(&self.dice);

        self.bus.subscribe(
            EventType::OnConcentrationCheck,
            Arc::new(FnListener::new(
                "concentration save",
                priority::POST_CALCULATION,
                move |event: &mut GameEvent| {
                    let Some(manager) = event
                        .actor()
                        .and_then(|actor| managers.get(&actor))
                        .and_then(Weak::upgrade)
                    else {
                        return Ok(());
                    };
                    let Some(bus) = bus.upgrade() else {
                        return Ok(());
                    };
                    let dc = event.get_int(ContextKey::SaveDc).unwrap_or(10);

                    let mut save = GameEvent::new(EventType::OnSavingThrow)
                        .with_actor(manager.entity())
                        .with(ContextKey::Ability, "con")
                        .with(ContextKey::SaveDc, dc)
                        .with(ContextKey::RollBonus, 2);
                    bus.emit(&mut save)?;
                    let bonus = save.get_int(ContextKey::RollBonus).unwrap_or_default();
                    let total = dice.roll(1, 20, bonus)?;

                    if total >= dc {
                        info!(entity = %manager.entity(), total, dc, "Concentration holds");
                    } else {
                        info!(entity = %manager.entity(), total, dc, "Concentration lost");
                        manager.break_concentration();
                    }
                    Ok(())
                },
            )),
        );
    }

    fn cast_bless(&mut self) -> Result<()> {
        let targets: Vec<EntityId> = self.party.iter().map(Combatant::id).collect();
        let pike = &mut self.party[Self::PIKE];

        pike.conditions
            .add_condition(
                ConditionType::Concentration,
                Bless::NAME,
                DurationType::Rounds,
                Bless::ROUNDS,
            )
            .context("starting concentration on bless")?;
        let grant = Bless::cast(&pike.character, targets, Arc::clone(&self.dice));
        pike.modifiers
            .register(self.bus.as_ref(), grant.modifier, &grant.events);
        info!(caster = pike.name(), "Bless cast on the party");
        Ok(())
    }

    /// Plays up to `rounds` rounds, stopping early once the ogre drops.
    pub fn run(mut self, rounds: u32) -> Result<Summary> {
        while self.round < rounds && !self.ogre.is_down() {
            self.play_round()?;
        }

        Ok(Summary {
            rounds: self.round,
            ogre_hp: self.ogre.hp,
            party: self
                .party
                .iter()
                .map(|c| (c.character.name.clone(), c.hp))
                .collect(),
        })
    }

    fn play_round(&mut self) -> Result<()> {
        self.round += 1;
        info!(round = self.round, "Round begins");
        let bus = Arc::clone(&self.bus);
        let dice = Arc::clone(&self.dice);

        for index in 0..self.party.len() {
            if self.ogre.is_down() {
                break;
            }
            let hero = &self.party[index];
            if !start_turn(bus.as_ref(), hero)? {
                end_turn(bus.as_ref(), hero)?;
                continue;
            }

            let hit = resolve_attack(bus.as_ref(), dice.as_ref(), hero, &mut self.ogre, true)?;
            if hit && self.round == 1 {
                match hero.name() {
                    "Grog" => {
                        self.ogre.conditions.add_condition(
                            ConditionType::Prone,
                            "Grog's shove",
                            DurationType::Permanent,
                            0,
                        )?;
                    }
                    "Vex" => {
                        self.ogre.conditions.add_condition(
                            ConditionType::Poisoned,
                            "poisoned rapier",
                            DurationType::Rounds,
                            1,
                        )?;
                    }
                    _ => {}
                }
            }
            end_turn(bus.as_ref(), hero)?;
        }

        if !self.ogre.is_down() && start_turn(bus.as_ref(), &self.ogre)? {
            if !self
                .ogre
                .conditions
                .remove_condition_by_type(ConditionType::Prone)
                .is_empty()
            {
                info!("Ogre stands up");
            }
            let pike = &mut self.party[Self::PIKE];
            resolve_attack(bus.as_ref(), dice.as_ref(), &self.ogre, pike, false)?;
        }
        end_turn(bus.as_ref(), &self.ogre)?;

        bus.emit(&mut GameEvent::new(EventType::OnRoundEnd).with_actor(EntityId::SYSTEM))?;
        for combatant in self.party.iter_mut().chain([&mut self.ogre]) {
            let expired = combatant.conditions.process_round_end();
            let pruned = combatant.modifiers.prune(bus.as_ref());
            debug!(
                combatant = combatant.character.name.as_str(),
                expired = expired.len(),
                pruned = pruned.len(),
                "Round end bookkeeping"
            );
        }
        Ok(())
    }
}

/// Returns false when the combatant cannot act this turn.
fn start_turn(bus: &dyn Bus, combatant: &Combatant) -> Result<bool> {
    bus.emit(&mut GameEvent::new(EventType::OnTurnStart).with_actor(combatant.id()))?;
    combatant.conditions.process_turn_start();
    let effect = combatant.conditions.get_active_effects();
    if combatant.is_down() || effect.incapacitated() || effect.cant_act() {
        info!(combatant = combatant.name(), "Cannot act");
        return Ok(false);
    }
    Ok(true)
}

fn end_turn(bus: &dyn Bus, combatant: &Combatant) -> Result<()> {
    bus.emit(&mut GameEvent::new(EventType::OnTurnEnd).with_actor(combatant.id()))?;
    combatant.conditions.process_turn_end(&HashMap::new());
    Ok(())
}

/// One weapon attack through the attack, damage, and take-damage events.
/// Returns whether it hit.
fn resolve_attack(
    bus: &dyn Bus,
    dice: &dyn DiceRoller,
    attacker: &Combatant,
    defender: &mut Combatant,
    ally_adjacent: bool,
) -> Result<bool> {
    let own = attacker.conditions.get_active_effects();
    let theirs = defender.conditions.get_active_effects();
    let advantage = own.attack_advantage() || theirs.defense_advantage();
    let disadvantage = own.attack_disadvantage() || theirs.defense_disadvantage();

    let first = dice.roll(1, 20, 0)?;
    let natural = match (advantage, disadvantage) {
        (true, false) => first.max(dice.roll(1, 20, 0)?),
        (false, true) => first.min(dice.roll(1, 20, 0)?),
        _ => first,
    };

    let mut attack = GameEvent::new(EventType::OnAttackRoll)
        .with_actor(attacker.id())
        .with_target(defender.id())
        .with(ContextKey::AttackRoll, natural)
        .with(ContextKey::AttackBonus, attacker.attack_bonus)
        .with(ContextKey::Melee, true)
        .with(ContextKey::Advantage, advantage)
        .with(ContextKey::Disadvantage, disadvantage);
    bus.emit(&mut attack)?;
    if attack.is_cancelled() {
        return Ok(false);
    }

    let total = natural
        + attack.get_int(ContextKey::AttackBonus).unwrap_or_default()
        + attack.get_int(ContextKey::RollBonus).unwrap_or_default();
    let critical = natural == 20;
    let hit = critical || (natural != 1 && total >= defender.armor_class);
    info!(
        attacker = attacker.name(),
        defender = defender.name(),
        weapon = attacker.weapon.name,
        natural,
        total,
        hit,
        "Attack roll"
    );
    if !hit {
        return Ok(false);
    }

    let weapon = attacker.weapon;
    let count = if critical { weapon.dice * 2 } else { weapon.dice };
    let mut damage = GameEvent::new(EventType::OnDamageRoll)
        .with_actor(attacker.id())
        .with_target(defender.id())
        .with(ContextKey::Damage, dice.roll(count, weapon.sides, weapon.bonus)?)
        .with(ContextKey::DamageType, weapon.damage_type.as_ref())
        .with(ContextKey::Melee, true)
        .with(ContextKey::Finesse, weapon.finesse)
        .with(ContextKey::Advantage, advantage)
        .with(ContextKey::Disadvantage, disadvantage)
        .with(ContextKey::AllyAdjacent, ally_adjacent)
        .with(ContextKey::Critical, critical);
    bus.emit(&mut damage)?;

    let mut taken = GameEvent::new(EventType::OnTakeDamage)
        .with_actor(attacker.id())
        .with_target(defender.id())
        .with(
            ContextKey::Damage,
            damage.get_int(ContextKey::Damage).unwrap_or_default(),
        )
        .with(ContextKey::DamageType, weapon.damage_type.as_ref());
    bus.emit(&mut taken)?;

    let amount = taken.get_int(ContextKey::Damage).unwrap_or_default().max(0);
    defender.hp -= amount;
    info!(
        defender = defender.name(),
        amount,
        hp = defender.hp,
        modifiers = damage.modifiers().len() + taken.modifiers().len(),
        "Damage dealt"
    );
    defender.conditions.process_damage(amount);

    if defender.is_down() && !defender.conditions.has_condition(ConditionType::Unconscious) {
        defender.conditions.add_condition(
            ConditionType::Unconscious,
            "dropped to 0 hp",
            DurationType::Permanent,
            0,
        )?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use rules_core::FixedDice;

    use super::*;

    fn encounter() -> Encounter {
        let registry = FeatureRegistry::with_defaults(Arc::new(FixedDice(10)));
        Encounter::new(&registry).unwrap()
    }

    #[test]
    fn bus_is_released_with_the_encounter() {
        let encounter = encounter();
        let bus = Arc::downgrade(&encounter.bus);
        let manager = Arc::downgrade(&encounter.party[Encounter::PIKE].conditions);

        drop(encounter);
        assert!(bus.upgrade().is_none());
        assert!(manager.upgrade().is_none());
    }

    #[test]
    fn bus_is_released_after_a_run() {
        let encounter = encounter();
        let bus = Arc::downgrade(&encounter.bus);

        let summary = encounter.run(2).unwrap();
        assert!(summary.rounds >= 1);
        assert!(bus.upgrade().is_none());
    }
}
