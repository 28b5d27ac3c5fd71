//! Charge-time initiative.
//!
//! Every pass adds each living unit's speed to its CT; the unit at the head
//! of the waitlist acts once its CT reaches [`BattleConfig::CT_FOR_TURN`].

use super::{AiState, StateAction, World, WorldEvent};
use crate::config::BattleConfig;
use crate::state::EntityId;

impl World {
    /// Orders the waitlist by CT, then speed (both descending), then id.
    pub(super) fn sort_waitlist(&mut self) {
        let mut keyed: Vec<(i32, i32, EntityId)> = self
            .waitlist
            .iter()
            .map(|&id| match self.mob(id) {
                Some(mob) => (mob.ct, mob.speed(), id),
                None => (i32::MIN, i32::MIN, id),
            })
            .collect();
        keyed.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)));
        self.waitlist = keyed.into_iter().map(|(_, _, id)| id).collect();
    }

    /// Advances initiative until a unit able to act has the turn.
    ///
    /// Leaves `up` empty when nobody can ever act: an empty waitlist, no
    /// living units, no positive speed anywhere, or the pass limit reached.
    pub fn next_turn(&mut self) {
        self.up = None;
        for _ in 0..BattleConfig::MAX_SCHEDULING_PASSES {
            self.turn += 1;
            let living: Vec<EntityId> = self
                .waitlist
                .iter()
                .copied()
                .filter(|&id| self.is_alive(id))
                .collect();
            if living.iter().all(|&id| self.mob(id).is_none_or(|m| m.speed() <= 0)) {
                tracing::debug!(turn = self.turn, "initiative suspended: nobody can act");
                return;
            }
            for &id in &living {
                if let Some(mob) = self.mob_mut(id) {
                    mob.ct += mob.speed();
                }
            }
            self.sort_waitlist();

            let Some(head) = self.waitlist.iter().copied().find(|&id| self.is_alive(id)) else {
                return;
            };
            let ready = self
                .mob(head)
                .is_some_and(|mob| mob.ct >= BattleConfig::CT_FOR_TURN);
            if !ready {
                continue;
            }
            self.up = Some(head);
            self.take_turn(head);
            let stuck = self
                .mob(head)
                .is_none_or(|mob| !mob.can_act() && !mob.can_move());
            if !stuck {
                return;
            }
            self.finish_turn(head);
            self.up = None;
        }
        tracing::warn!(
            passes = BattleConfig::MAX_SCHEDULING_PASSES,
            "initiative gave up without finding a unit"
        );
    }

    /// Opens `id`'s turn: decays buffs, recovers mana and hands control to
    /// the AI when nobody is driving the unit.
    pub fn take_turn(&mut self, id: EntityId) {
        let origin = self.position_of(id);
        let entities = &self.entities;
        let source_alive = |source: EntityId| {
            entities
                .get(&source)
                .and_then(|e| e.as_mob())
                .is_some_and(|m| m.is_alive())
        };
        let Some(mut buffs) = self
            .entities
            .get(&id)
            .and_then(|e| e.as_mob())
            .map(|m| m.buffs.clone())
        else {
            return;
        };
        let removed = buffs.decay(&mut self.rng, source_alive);

        let Some(mob) = self.mob_mut(id) else {
            return;
        };
        mob.buffs = buffs;
        mob.moved = false;
        mob.acted = false;
        mob.recompute();
        let recovery = mob.stats.mp_recovery + 1;
        mob.mp.adjust(recovery);
        let ai_controlled = self.mob(id).is_some_and(|m| self.is_ai_controlled(m));

        self.turn_origin = origin;
        for buff in removed {
            self.announce_buff_removed(id, &buff);
        }
        self.emit(WorldEvent::TurnStarted {
            entity: id,
            turn: self.turn,
        });
        if ai_controlled && !self.game_over {
            self.stack.push_top(StateAction::EnemyAi(AiState::new(id)));
        }
    }

    /// Closes `id`'s turn: periodic buff effects, then the CT cost.
    pub fn finish_turn(&mut self, id: EntityId) {
        let periodic: Vec<_> = self
            .mob(id)
            .map(|mob| {
                mob.buffs
                    .iter()
                    .filter_map(|b| b.periodic.map(|spec| (b.name.clone(), spec)))
                    .collect()
            })
            .unwrap_or_default();
        for (name, spec) in periodic {
            if !self.is_alive(id) {
                break;
            }
            let amount = spec.roll(&mut self.rng);
            let target = self.name_of(id);
            let Some(hit) = self.damage(id, amount, spec.class, true) else {
                continue;
            };
            if hit.amount < 0 {
                self.broadcast(format!("{target} recovers {} HP from {name}.", -hit.amount));
            } else if hit.amount > 0 {
                self.broadcast(format!("{target} takes {} damage from {name}.", hit.amount));
            }
            if hit.killed {
                self.broadcast(format!("{target} died."));
            }
        }
        if let Some(mob) = self.mob_mut(id) {
            mob.pay_turn_cost();
        }
        self.turn_origin = None;
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::combat::{DamageSpec, DiceExpr};
    use crate::state::{Position, Team};
    use crate::stats::{BuffTemplate, Uniqueness};

    fn idle_unit(world: &mut World) -> EntityId {
        let id = add_unit(world, "a", Team(1), 5, Position::new(1, 1));
        if let Some(mob) = world.mob_mut(id) {
            mob.ct = 100;
            mob.moved = false;
            mob.acted = false;
        }
        id
    }

    #[test]
    fn faster_units_reach_the_threshold_first() {
        let mut world = open_world(5, 5);
        let slow = add_unit(&mut world, "s", Team(1), 3, Position::new(0, 0));
        let fast = add_unit(&mut world, "f", Team(1), 5, Position::new(4, 4));
        world.next_turn();
        assert_eq!(world.up(), Some(fast));
        assert_eq!(world.turn(), 20);
        assert_eq!(world.mob(slow).map(|m| m.ct), Some(60));
    }

    #[test]
    fn ties_break_on_speed_then_id() {
        let mut world = open_world(5, 5);
        let first = add_unit(&mut world, "a", Team(1), 5, Position::new(0, 0));
        let second = add_unit(&mut world, "b", Team(1), 5, Position::new(4, 4));
        world.next_turn();
        assert_eq!(world.up(), Some(first));
        assert_eq!(world.waitlist(), &[first, second]);
    }

    #[test]
    fn zero_speed_suspends_initiative() {
        let mut world = open_world(3, 3);
        add_unit(&mut world, "rock", Team(1), 0, Position::new(1, 1));
        world.next_turn();
        assert_eq!(world.up(), None);
        assert_eq!(world.turn(), 1);
    }

    #[test]
    fn turn_start_recovers_mana_and_resets_flags() {
        let mut world = open_world(3, 3);
        let id = add_unit(&mut world, "a", Team::PLAYERS, 5, Position::new(1, 1));
        if let Some(mob) = world.mob_mut(id) {
            mob.mp.set(2);
            mob.moved = true;
            mob.acted = true;
        }
        world.take_turn(id);
        let mob = world.mob(id).cloned();
        assert_eq!(mob.as_ref().map(|m| m.mp.current), Some(3));
        assert_eq!(mob.as_ref().map(|m| (m.moved, m.acted)), Some((false, false)));
        assert!(world
            .drain_events()
            .contains(&WorldEvent::TurnStarted { entity: id, turn: 0 }));
        assert!(!world.is_busy());
    }

    #[test]
    fn enemy_turns_hand_control_to_the_ai() {
        let mut world = open_world(3, 3);
        let id = add_unit(&mut world, "orc", Team(1), 5, Position::new(1, 1));
        world.take_turn(id);
        assert!(world.is_busy());
        world.stack.flush();
        assert_eq!(world.stack().top().map(StateAction::label), Some("enemy-ai"));
    }

    #[test]
    fn poison_ticks_through_armor_when_the_turn_closes() {
        let mut world = open_world(3, 3);
        let id = idle_unit(&mut world);
        if let Some(mob) = world.mob_mut(id) {
            mob.armor.defense = 5;
            mob.recompute();
        }
        let poison = BuffTemplate::new("poison", Uniqueness::Stackable)
            .lasting(3, 3)
            .periodic(DamageSpec::physical(DiceExpr::constant(2)));
        world.apply_buff(id, &poison, None);
        world.drain_events();

        world.finish_turn(id);

        let mob = world.mob(id).cloned();
        assert_eq!(mob.as_ref().map(|m| m.hp.current), Some(18));
        assert_eq!(mob.as_ref().map(|m| m.ct), Some(40));
        assert!(world
            .drain_events()
            .contains(&WorldEvent::Message("a takes 2 damage from poison.".into())));
    }

    #[test]
    fn healing_over_time_announces_recovery() {
        let mut world = open_world(3, 3);
        let id = idle_unit(&mut world);
        if let Some(mob) = world.mob_mut(id) {
            mob.hp.set(10);
        }
        let renew = BuffTemplate::new("renew", Uniqueness::FirstWins)
            .lasting(3, 3)
            .periodic(DamageSpec::healing(DiceExpr::constant(3)));
        world.apply_buff(id, &renew, None);
        world.drain_events();

        world.finish_turn(id);

        assert_eq!(world.mob(id).map(|m| m.hp.current), Some(13));
        assert!(world
            .drain_events()
            .contains(&WorldEvent::Message("a recovers 3 HP from renew.".into())));
    }

    #[test]
    fn a_lethal_tick_kills_and_still_charges_the_turn() {
        let mut world = open_world(3, 3);
        let id = idle_unit(&mut world);
        if let Some(mob) = world.mob_mut(id) {
            mob.hp.set(1);
        }
        let poison = BuffTemplate::new("poison", Uniqueness::Stackable)
            .lasting(3, 3)
            .periodic(DamageSpec::physical(DiceExpr::constant(2)));
        world.apply_buff(id, &poison, None);
        world.apply_buff(id, &poison, None);
        world.drain_events();

        world.finish_turn(id);

        let events = world.drain_events();
        assert!(!world.is_alive(id));
        assert!(events.contains(&WorldEvent::UnitDied { entity: id }));
        let deaths = events
            .iter()
            .filter(|e| **e == WorldEvent::Message("a died.".into()))
            .count();
        assert_eq!(deaths, 1);
        assert_eq!(world.mob(id).map(|m| m.ct), Some(40));
    }

    #[test]
    fn expired_and_broken_buffs_are_announced_once_each() {
        let mut world = open_world(3, 3);
        let id = add_unit(&mut world, "a", Team::PLAYERS, 5, Position::new(1, 1));
        let daze = BuffTemplate::new("daze", Uniqueness::FirstWins).lasting(1, 1);
        let rage = BuffTemplate::new("rage", Uniqueness::FirstWins).breaking(1.0);
        world.apply_buff(id, &daze, None);
        world.apply_buff(id, &rage, None);
        world.drain_events();

        world.take_turn(id);

        let events = world.drain_events();
        for name in ["daze", "rage"] {
            let removed = events
                .iter()
                .filter(|e| {
                    matches!(e, WorldEvent::BuffRemoved { entity, name: n } if *entity == id && n == name)
                })
                .count();
            assert_eq!(removed, 1, "{name}");
        }
        assert!(world.mob(id).is_some_and(|m| m.buffs.is_empty()));
    }
}
