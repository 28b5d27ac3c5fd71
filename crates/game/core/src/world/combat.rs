//! Hit resolution: damage, on-hit effects and buff bookkeeping.

use super::{AttackState, World, WorldEvent};
use crate::combat::{DamageClass, OnHit, Weapon, mitigate, taunt_buff};
use crate::grid::line;
use crate::state::{Direction, EntityId, Position};
use crate::stats::{ApplyOutcome, Buff, BuffTemplate};

/// Amount actually subtracted from a unit's HP (negative for healing),
/// after armor but before clamping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DamageDealt {
    pub amount: i32,
    pub killed: bool,
}

/// A planned attack, ready to push as a state.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AttackPlan {
    pub state: AttackState,
    /// The line of fire was interrupted before reaching the aim point.
    pub obstructed: bool,
}

fn render(template: &str, target: &str, source: &str) -> String {
    template.replace("{target}", target).replace("{source}", source)
}

impl World {
    pub(crate) fn damage(
        &mut self,
        target: EntityId,
        raw: i32,
        class: DamageClass,
        magic_source: bool,
    ) -> Option<DamageDealt> {
        let mob = self.mob_mut(target)?;
        let was_alive = mob.is_alive();
        let amount = mitigate(raw, class, magic_source, mob.stats.defense);
        mob.hp.adjust(-amount);
        mob.recompute();
        let killed = was_alive && mob.is_dead();
        if killed {
            self.emit(WorldEvent::UnitDied { entity: target });
        }
        Some(DamageDealt { amount, killed })
    }

    /// Applies one weapon hit from `attacker` to `target`.
    pub(crate) fn resolve_hit(&mut self, attacker: EntityId, target: EntityId, weapon: &Weapon) {
        let source = self.name_of(attacker);
        let victim = self.name_of(target);
        let mut killed = false;

        if weapon.damage.deals_damage() {
            let raw = weapon.damage.roll(&mut self.rng);
            if let Some(hit) = self.damage(target, raw, weapon.damage.class, weapon.magic) {
                let text = if hit.amount < 0 {
                    format!(
                        "{source} healed {victim} with {} for {} HP!",
                        weapon.name, -hit.amount
                    )
                } else {
                    format!(
                        "{source} attacked {victim} with {} for {} damage!",
                        weapon.name, hit.amount
                    )
                };
                self.broadcast(text);
                killed = hit.killed;
            }
        }
        for effect in &weapon.on_hit {
            if !self.is_alive(target) {
                break;
            }
            self.apply_on_hit(attacker, target, effect);
        }
        if killed {
            self.broadcast(format!("{victim} died."));
        }
    }

    fn apply_on_hit(&mut self, attacker: EntityId, target: EntityId, effect: &OnHit) {
        match effect {
            OnHit::ApplyBuff(template) => {
                self.apply_buff(target, template, Some(attacker));
            }
            OnHit::Taunt => {
                let same_team = match (self.mob(attacker), self.mob(target)) {
                    (Some(a), Some(t)) => a.team == t.team,
                    _ => return,
                };
                if same_team {
                    let source = self.name_of(attacker);
                    let victim = self.name_of(target);
                    self.broadcast(format!(
                        "{source} tries to taunt {victim}, but they laugh instead."
                    ));
                    return;
                }
                self.apply_buff(target, &taunt_buff(), Some(attacker));
            }
            OnHit::Knockback { distance } => self.knock_back(attacker, target, *distance),
        }
    }

    fn knock_back(&mut self, attacker: EntityId, target: EntityId, distance: u32) {
        let (Some(from), Some(mut at)) = (self.position_of(attacker), self.position_of(target))
        else {
            return;
        };
        let Some(direction) = Direction::toward(from, at) else {
            return;
        };
        for _ in 0..distance {
            let next = at.step(direction);
            if self.is_blocked(next, &[target]) {
                break;
            }
            self.relocate(target, next);
            at = next;
        }
    }

    /// Instantiates `template` on `target` and announces the result.
    pub fn apply_buff(
        &mut self,
        target: EntityId,
        template: &BuffTemplate,
        source: Option<EntityId>,
    ) -> Option<ApplyOutcome> {
        let buff = template.instantiate(source, &mut self.rng);
        let mob = self.mob_mut(target)?;
        let outcome = mob.buffs.apply(buff);
        mob.recompute();

        if outcome == ApplyOutcome::Rejected {
            tracing::debug!(%target, buff = %template.name, "buff rejected: already active");
            return Some(outcome);
        }
        if let ApplyOutcome::Replaced(old) = &outcome {
            self.announce_buff_removed(target, old);
        }
        if let Some(text) = &template.on_apply {
            let victim = self.name_of(target);
            let source = source.map(|id| self.name_of(id)).unwrap_or_default();
            self.broadcast(render(text, &victim, &source));
        }
        self.emit(WorldEvent::BuffApplied {
            entity: target,
            name: template.name.clone(),
        });
        Some(outcome)
    }

    pub(super) fn announce_buff_removed(&mut self, target: EntityId, buff: &Buff) {
        if let Some(text) = &buff.on_remove {
            let victim = self.name_of(target);
            let source = buff.source.map(|id| self.name_of(id)).unwrap_or_default();
            self.broadcast(render(text, &victim, &source));
        }
        self.emit(WorldEvent::BuffRemoved {
            entity: target,
            name: buff.name.clone(),
        });
    }

    /// Works out who `weapon` hits when `attacker` aims it at `aim`.
    ///
    /// Magic lands on the aim point regardless of what lies between;
    /// everything else travels the line of fire and stops at the first
    /// wall or unit.
    pub(crate) fn plan_attack(
        &self,
        attacker: EntityId,
        weapon: &Weapon,
        aim: Position,
    ) -> Option<AttackPlan> {
        let from = self.position_of(attacker)?;
        let mut state = AttackState {
            attacker,
            weapon: weapon.clone(),
            targets: Vec::new(),
            projectile_path: Vec::new(),
            hit_tiles: Vec::new(),
            launched: false,
        };
        if weapon.magic {
            let (targets, tiles) = self.find_targets(aim, weapon.hitbox_size, weapon.hitbox);
            state.targets = targets;
            state.hit_tiles = tiles;
            state.projectile_path = line(from, aim);
            return Some(AttackPlan {
                state,
                obstructed: false,
            });
        }
        let hit = self.raycast(from, aim, false, &[attacker]);
        if !hit.blocked {
            if let Some(target) = hit.target {
                state.targets.push(target);
                state.hit_tiles.extend(self.position_of(target));
            }
        }
        state.projectile_path = hit.path;
        Some(AttackPlan {
            state,
            obstructed: hit.blocked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::combat::{DamageSpec, DiceExpr, Hitbox};
    use crate::config::BattleConfig;
    use crate::grid::Map;
    use crate::state::Team;
    use crate::stats::{StatModifier, Uniqueness};

    #[test]
    fn armor_never_reduces_a_hit_below_one() {
        let mut world = open_world(3, 1);
        let id = add_unit(&mut world, "k", Team(1), 5, Position::new(0, 0));
        if let Some(mob) = world.mob_mut(id) {
            mob.armor.defense = 5;
            mob.recompute();
        }
        let hit = world.damage(id, 3, DamageClass::Physical, false);
        assert_eq!(hit, Some(DamageDealt { amount: 1, killed: false }));
        assert_eq!(world.mob(id).map(|m| m.hp.current), Some(19));

        let hit = world.damage(id, 3, DamageClass::Magical, true);
        assert_eq!(hit.map(|h| h.amount), Some(3));
    }

    #[test]
    fn healing_is_clamped_to_max_hp() {
        let mut world = open_world(3, 1);
        let id = add_unit(&mut world, "k", Team(1), 5, Position::new(0, 0));
        world.damage(id, 2, DamageClass::Magical, true);
        let hit = world.damage(id, -10, DamageClass::Healing, true);
        assert_eq!(hit.map(|h| h.amount), Some(-10));
        assert_eq!(world.mob(id).map(|m| m.hp.current), Some(20));
    }

    #[test]
    fn lethal_hits_announce_the_death_after_the_attack() {
        let mut world = open_world(3, 1);
        let a = add_unit(&mut world, "ann", Team::PLAYERS, 5, Position::new(0, 0));
        let b = add_unit(&mut world, "bob", Team(1), 5, Position::new(1, 0));
        if let Some(mob) = world.mob_mut(b) {
            mob.hp.set(2);
        }
        let club = Weapon::new("club", DamageSpec::physical(DiceExpr::constant(3)), 1);
        world.resolve_hit(a, b, &club);
        let events = world.drain_events();
        let messages: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                WorldEvent::Message(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(messages, vec!["ann attacked bob with club for 3 damage!", "bob died."]);
        assert!(events.contains(&WorldEvent::UnitDied { entity: b }));
        assert_eq!(world.mob(b).map(|m| m.z()), Some(BattleConfig::Z_CORPSE));
    }

    #[test]
    fn first_wins_buffs_reject_duplicates() {
        let mut world = open_world(3, 1);
        let id = add_unit(&mut world, "k", Team(1), 5, Position::new(0, 0));
        let cripple = BuffTemplate::new("crippled", Uniqueness::FirstWins)
            .lasting(2, 7)
            .modifier(StatModifier::Cripple);
        assert_eq!(world.apply_buff(id, &cripple, None), Some(ApplyOutcome::Added));
        assert_eq!(world.apply_buff(id, &cripple, None), Some(ApplyOutcome::Rejected));
        assert_eq!(world.mob(id).map(|m| m.move_range()), Some(0));
        let applied = world
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, WorldEvent::BuffApplied { .. }))
            .count();
        assert_eq!(applied, 1);
    }

    #[test]
    fn replacing_a_taunt_removes_the_old_one_once() {
        let mut world = open_world(5, 1);
        let a = add_unit(&mut world, "a", Team::PLAYERS, 5, Position::new(0, 0));
        let b = add_unit(&mut world, "b", Team::PLAYERS, 5, Position::new(4, 0));
        let orc = add_unit(&mut world, "orc", Team(1), 5, Position::new(2, 0));
        world.apply_buff(orc, &taunt_buff(), Some(a));
        world.apply_buff(orc, &taunt_buff(), Some(b));
        let removed = world
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, WorldEvent::BuffRemoved { .. }))
            .count();
        assert_eq!(removed, 1);
        assert_eq!(world.mob(orc).map(|m| m.stats.taunted_by), Some(Some(b)));
    }

    #[test]
    fn allies_laugh_off_a_taunt() {
        let mut world = open_world(3, 1);
        let a = add_unit(&mut world, "ann", Team::PLAYERS, 5, Position::new(0, 0));
        let b = add_unit(&mut world, "bea", Team::PLAYERS, 5, Position::new(1, 0));
        let taunt = Weapon::new("taunt", DamageSpec::new(DiceExpr::ZERO, DamageClass::None), 6)
            .magic(0, Hitbox::Single, 0)
            .on_hit(OnHit::Taunt);
        world.resolve_hit(a, b, &taunt);
        assert_eq!(
            world.drain_events(),
            vec![WorldEvent::Message(
                "ann tries to taunt bea, but they laugh instead.".into()
            )]
        );
    }

    #[test]
    fn knockback_stops_at_walls() {
        let map = Map::from_rows("hall", &["....#"]).expect("valid map");
        let mut world = world_on(map);
        let a = add_unit(&mut world, "a", Team::PLAYERS, 5, Position::new(0, 0));
        let b = add_unit(&mut world, "b", Team(1), 5, Position::new(1, 0));
        world.knock_back(a, b, 5);
        assert_eq!(world.position_of(b), Some(Position::new(3, 0)));
    }

    #[test]
    fn obstructed_shots_hit_nothing() {
        let mut world = open_world(5, 1);
        let a = add_unit(&mut world, "a", Team::PLAYERS, 5, Position::new(0, 0));
        add_unit(&mut world, "wall", Team(1), 5, Position::new(2, 0));
        add_unit(&mut world, "b", Team(1), 5, Position::new(4, 0));
        let bow = Weapon::new("bow", DamageSpec::physical(DiceExpr::constant(2)), 6);
        let plan = world.plan_attack(a, &bow, Position::new(4, 0)).expect("attacker exists");
        assert!(plan.obstructed);
        assert!(plan.state.targets.is_empty());
        assert_eq!(plan.state.projectile_path.last(), Some(&Position::new(2, 0)));
    }

    #[test]
    fn area_spells_collect_every_living_unit() {
        let mut world = open_world(7, 7);
        let a = add_unit(&mut world, "a", Team::PLAYERS, 5, Position::new(0, 0));
        let b = add_unit(&mut world, "b", Team(1), 5, Position::new(3, 3));
        let c = add_unit(&mut world, "c", Team(1), 5, Position::new(3, 4));
        add_unit(&mut world, "d", Team(1), 5, Position::new(5, 5));
        let fireball = Weapon::new("fireball", DamageSpec::magical(DiceExpr::new(2, 3, 0)), 6)
            .magic(5, Hitbox::Cross, 1);
        let plan = world
            .plan_attack(a, &fireball, Position::new(3, 3))
            .expect("attacker exists");
        assert!(!plan.obstructed);
        assert_eq!(plan.state.targets, vec![b, c]);
        assert_eq!(plan.state.hit_tiles.len(), 5);
    }
}
