//! Commands: the only way anything outside the loop mutates the world.
//!
//! Every command is applied to completion inside [`World::apply`]. A
//! rejected command leaves the world untouched and turns into a bell (plus an
//! optional notice) for the session that sent it.

use super::{MoveState, StateAction, World, WorldEvent};
use crate::combat::Weapon;
use crate::entity::{EntityKind, MicroAction, Mob, UnitTemplate};
use crate::error::CommandError;
use crate::state::{EntityId, Position, SessionId, Team};

/// Permanent upgrade for a roster unit, offered between battles.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bonus {
    MaxHp(i32),
    MaxMp(i32),
    Speed(i32),
    LearnSpell(Weapon),
}

impl Bonus {
    pub fn label(&self) -> String {
        match self {
            Bonus::MaxHp(amount) => format!("+{amount} HP"),
            Bonus::MaxMp(amount) => format!("+{amount} MP"),
            Bonus::Speed(amount) => format!("+{amount} Speed"),
            Bonus::LearnSpell(spell) => format!("☆ {}", spell.name),
        }
    }

    fn apply_to(&self, mob: &mut Mob) {
        match self {
            Bonus::MaxHp(amount) => mob.hp.maximum += amount,
            Bonus::MaxMp(amount) => mob.mp.maximum += amount,
            Bonus::Speed(amount) => {
                mob.base.speed += amount;
                mob.recompute();
            }
            Bonus::LearnSpell(spell) => {
                if !mob.spells.iter().any(|known| known.name == spell.name) {
                    mob.spells.push(spell.clone());
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Listen { session: SessionId },
    Part { session: SessionId },
    StartBattle { level: u32 },
    AddUnit {
        template: UnitTemplate,
        team: Team,
        position: Position,
    },
    Remove { entity: EntityId },
    Move {
        session: SessionId,
        unit: EntityId,
        to: Position,
    },
    Attack {
        session: SessionId,
        unit: EntityId,
        target: Position,
    },
    Cast {
        session: SessionId,
        unit: EntityId,
        spell: String,
        target: Position,
    },
    /// Context action at a tile for whoever is up: attack an enemy standing
    /// there, otherwise move there.
    Click {
        session: SessionId,
        position: Position,
    },
    ResetMove { session: SessionId, unit: EntityId },
    EndTurn { session: SessionId, unit: EntityId },
    Enqueue {
        entity: EntityId,
        action: MicroAction,
    },
    ApplyBonus { slot: usize, bonus: Bonus },
    Reset,
}

impl Command {
    /// Session that receives the bell if this command is rejected.
    pub fn session(&self) -> Option<SessionId> {
        match self {
            Command::Listen { session }
            | Command::Part { session }
            | Command::Move { session, .. }
            | Command::Attack { session, .. }
            | Command::Cast { session, .. }
            | Command::Click { session, .. }
            | Command::ResetMove { session, .. }
            | Command::EndTurn { session, .. } => Some(*session),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Command::Listen { .. } => "listen",
            Command::Part { .. } => "part",
            Command::StartBattle { .. } => "start-battle",
            Command::AddUnit { .. } => "add-unit",
            Command::Remove { .. } => "remove",
            Command::Move { .. } => "move",
            Command::Attack { .. } => "attack",
            Command::Cast { .. } => "cast",
            Command::Click { .. } => "click",
            Command::ResetMove { .. } => "reset-move",
            Command::EndTurn { .. } => "end-turn",
            Command::Enqueue { .. } => "enqueue",
            Command::ApplyBonus { .. } => "apply-bonus",
            Command::Reset => "reset",
        }
    }
}

impl World {
    /// Applies one command to completion.
    pub fn apply(&mut self, command: Command) -> Result<(), CommandError> {
        let session = command.session();
        let label = command.label();
        let result = self.dispatch(command);
        self.stack.flush();
        if let Err(error) = &result {
            tracing::debug!(
                command = label,
                severity = error.severity().as_str(),
                %error,
                "command rejected"
            );
            if let Some(session) = session {
                self.emit(WorldEvent::Bell { session });
                if let Some(text) = error.notice() {
                    self.emit(WorldEvent::Notice { session, text });
                }
            }
        }
        result
    }

    fn dispatch(&mut self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::Listen { session } => {
                if self.observers.insert(session) {
                    self.emit(WorldEvent::ObserverJoined { session });
                }
                Ok(())
            }
            Command::Part { session } => {
                if self.observers.remove(&session) {
                    self.emit(WorldEvent::ObserverLeft { session });
                }
                Ok(())
            }
            Command::StartBattle { level } => self.start_battle(level),
            Command::AddUnit {
                template,
                team,
                position,
            } => self.add_unit(&template, team, position).map(|_| ()),
            Command::Remove { entity } => self.remove_entity(entity),
            Command::Move { unit, to, .. } => self.command_move(unit, to),
            Command::Attack {
                session,
                unit,
                target,
            } => {
                self.ensure_controlled(unit)?;
                let weapon = self.unit_mob(unit)?.weapon.clone();
                self.command_attack(session, unit, &weapon, target)
            }
            Command::Cast {
                session,
                unit,
                spell,
                target,
            } => {
                self.ensure_controlled(unit)?;
                let mob = self.unit_mob(unit)?;
                if mob.acted {
                    return Err(CommandError::AlreadyActed(unit));
                }
                let weapon = mob
                    .spells
                    .iter()
                    .find(|known| known.name == spell)
                    .cloned()
                    .ok_or(CommandError::UnknownSpell(spell))?;
                if weapon.mp_cost > mob.mp.current {
                    return Err(CommandError::NotEnoughMp(weapon.name));
                }
                self.command_attack(session, unit, &weapon, target)
            }
            Command::Click { session, position } => {
                let unit = self.up.ok_or(CommandError::NoBattle)?;
                self.ensure_controlled(unit)?;
                let team = self.unit_mob(unit)?.team;
                let enemy_there = self
                    .living_mob_at(position)
                    .and_then(|id| self.mob(id))
                    .is_some_and(|mob| mob.team != team);
                if enemy_there {
                    let weapon = self.unit_mob(unit)?.weapon.clone();
                    self.command_attack(session, unit, &weapon, position)
                } else {
                    self.command_move(unit, position)
                }
            }
            Command::ResetMove { unit, .. } => {
                self.ensure_controlled(unit)?;
                let mob = self.unit_mob(unit)?;
                if !mob.moved {
                    return Err(CommandError::NotMoved(unit));
                }
                if mob.acted {
                    return Err(CommandError::AlreadyActed(unit));
                }
                if let Some(origin) = self.turn_origin {
                    if self.is_blocked(origin, &[unit]) {
                        return Err(CommandError::Blocked(origin));
                    }
                    self.relocate(unit, origin);
                }
                if let Some(mob) = self.mob_mut(unit) {
                    mob.moved = false;
                }
                Ok(())
            }
            Command::EndTurn { unit, .. } => {
                self.ensure_controlled(unit)?;
                self.end_turn(unit);
                Ok(())
            }
            Command::Enqueue { entity, action } => {
                if self.entity(entity).is_none() {
                    return Err(CommandError::UnknownEntity(entity));
                }
                let mob = self.mob_mut(entity).ok_or(CommandError::NotAUnit(entity))?;
                mob.enqueue(action);
                Ok(())
            }
            Command::ApplyBonus { slot, bonus } => self.apply_bonus(slot, &bonus),
            Command::Reset => {
                self.reset();
                Ok(())
            }
        }
    }

    fn unit_mob(&self, unit: EntityId) -> Result<&Mob, CommandError> {
        let entity = self.entity(unit).ok_or(CommandError::UnknownEntity(unit))?;
        entity.as_mob().ok_or(CommandError::NotAUnit(unit))
    }

    /// The unit is up, idle and driven by a player.
    fn ensure_controlled(&self, unit: EntityId) -> Result<(), CommandError> {
        if self.current_map.is_none() {
            return Err(CommandError::NoBattle);
        }
        if self.is_busy() {
            return Err(CommandError::Busy);
        }
        if self.up != Some(unit) {
            return Err(CommandError::NotYourTurn(unit));
        }
        let mob = self.unit_mob(unit)?;
        if self.is_ai_controlled(mob) {
            return Err(CommandError::NotPlayerControlled(unit));
        }
        Ok(())
    }

    fn command_move(&mut self, unit: EntityId, to: Position) -> Result<(), CommandError> {
        self.ensure_controlled(unit)?;
        let mob = self.unit_mob(unit)?;
        if mob.moved {
            return Err(CommandError::AlreadyMoved(unit));
        }
        if !mob.can_move() {
            return Err(CommandError::Immobile(unit));
        }
        let range = mob.move_range();
        let from = self.position_of(unit).unwrap_or_default();
        let path = self.find_path(from, to, &[unit]);
        if path.is_empty() {
            return Err(CommandError::Unreachable(to));
        }
        if path.len() > range as usize {
            return Err(CommandError::TooFar {
                length: path.len(),
                range,
            });
        }
        if let Some(mob) = self.mob_mut(unit) {
            mob.moved = true;
        }
        self.stack
            .push_top(StateAction::Move(MoveState::walk(unit, path)));
        self.end_turn_if_spent(unit);
        Ok(())
    }

    fn command_attack(
        &mut self,
        session: SessionId,
        unit: EntityId,
        weapon: &Weapon,
        target: Position,
    ) -> Result<(), CommandError> {
        self.ensure_controlled(unit)?;
        let mob = self.unit_mob(unit)?;
        if mob.acted {
            return Err(CommandError::AlreadyActed(unit));
        }
        let from = self.position_of(unit).unwrap_or_default();
        if !weapon.reaches(from, target) {
            return Err(CommandError::OutOfRange(target));
        }
        let plan = self
            .plan_attack(unit, weapon, target)
            .ok_or(CommandError::UnknownEntity(unit))?;
        if !weapon.magic && !plan.obstructed && plan.state.targets.is_empty() {
            return Err(CommandError::NoTarget(target));
        }
        if plan.obstructed {
            let name = self.name_of(unit);
            self.emit(WorldEvent::Notice {
                session,
                text: format!("{name}'s attack was obstructed."),
            });
        }
        if let Some(mob) = self.mob_mut(unit) {
            mob.acted = true;
        }
        self.stack.push_top(StateAction::Attack(plan.state));
        self.end_turn_if_spent(unit);
        Ok(())
    }

    fn end_turn_if_spent(&mut self, unit: EntityId) {
        if self.mob(unit).is_some_and(|mob| mob.moved && mob.acted) {
            self.end_turn(unit);
        }
    }

    fn end_turn(&mut self, unit: EntityId) {
        self.finish_turn(unit);
        self.stack.push_bottom(StateAction::NextTurn);
    }

    /// Spawns a mob from `template` on the current map.
    pub fn add_unit(
        &mut self,
        template: &UnitTemplate,
        team: Team,
        position: Position,
    ) -> Result<EntityId, CommandError> {
        if self.current_map.is_none() {
            return Err(CommandError::NoBattle);
        }
        if self.is_blocked(position, &[]) {
            return Err(CommandError::Blocked(position));
        }
        let mob = Mob::from_template(template, team);
        Ok(self.spawn(
            template.name.clone(),
            template.glyph,
            position,
            EntityKind::Mob(Box::new(mob)),
        ))
    }

    fn remove_entity(&mut self, entity: EntityId) -> Result<(), CommandError> {
        self.delete(entity)
            .ok_or(CommandError::UnknownEntity(entity))?;
        if self.up == Some(entity) {
            self.up = None;
            self.turn_origin = None;
            if !self.stack.holds_next_turn() {
                self.stack.push_bottom(StateAction::NextTurn);
            }
        }
        Ok(())
    }

    fn apply_bonus(&mut self, slot: usize, bonus: &Bonus) -> Result<(), CommandError> {
        let unit = self
            .roster
            .get(slot)
            .ok_or(CommandError::UnknownRosterSlot(slot))?;
        let live = unit.entity;
        let name = unit.name.clone();
        if let Some(mob) = live.and_then(|id| self.mob_mut(id)) {
            bonus.apply_to(mob);
        }
        if let Some(unit) = self.roster.get_mut(slot) {
            bonus.apply_to(&mut unit.mob);
        }
        self.broadcast(format!("{name} gained {}.", bonus.label()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::combat::{DamageSpec, DiceExpr, Hitbox};
    use crate::state::Direction;

    const VIEWER: SessionId = SessionId(7);

    /// Two-unit world with the player unit up and idle.
    fn duel() -> (World, EntityId, EntityId) {
        let mut world = open_world(8, 8);
        let hero = add_unit(&mut world, "hero", Team::PLAYERS, 5, Position::new(1, 1));
        let orc = add_unit(&mut world, "orc", Team(1), 1, Position::new(1, 5));
        world.next_turn();
        assert_eq!(world.up(), Some(hero));
        world.drain_events();
        (world, hero, orc)
    }

    fn run_until_idle(world: &mut World) {
        for _ in 0..50 {
            if !world.is_busy() {
                return;
            }
            world.step();
        }
    }

    #[test]
    fn rejected_commands_ring_the_sender() {
        let (mut world, _, orc) = duel();
        let result = world.apply(Command::Move {
            session: VIEWER,
            unit: orc,
            to: Position::new(1, 4),
        });
        assert_eq!(result, Err(CommandError::NotYourTurn(orc)));
        assert_eq!(world.drain_events(), vec![WorldEvent::Bell { session: VIEWER }]);
    }

    #[test]
    fn moves_beyond_range_carry_a_notice() {
        let (mut world, hero, _) = duel();
        let result = world.apply(Command::Move {
            session: VIEWER,
            unit: hero,
            to: Position::new(7, 7),
        });
        assert_eq!(result, Err(CommandError::TooFar { length: 12, range: 4 }));
        let events = world.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], WorldEvent::Notice { session: VIEWER, .. }));
        assert_eq!(world.position_of(hero), Some(Position::new(1, 1)));
    }

    #[test]
    fn moves_walk_and_can_be_reset() {
        let (mut world, hero, _) = duel();
        let to = Position::new(1, 3);
        assert_eq!(
            world.apply(Command::Move { session: VIEWER, unit: hero, to }),
            Ok(())
        );
        assert!(world.is_busy());
        assert_eq!(
            world.apply(Command::Move { session: VIEWER, unit: hero, to }),
            Err(CommandError::Busy)
        );
        run_until_idle(&mut world);
        assert_eq!(world.position_of(hero), Some(to));

        assert_eq!(
            world.apply(Command::ResetMove { session: VIEWER, unit: hero }),
            Ok(())
        );
        assert_eq!(world.position_of(hero), Some(Position::new(1, 1)));
        assert_eq!(world.mob(hero).map(|m| m.moved), Some(false));
    }

    #[test]
    fn reset_move_refuses_an_occupied_origin() {
        let (mut world, hero, _) = duel();
        let origin = Position::new(1, 1);
        world
            .apply(Command::Move {
                session: VIEWER,
                unit: hero,
                to: Position::new(1, 3),
            })
            .expect("move accepted");
        run_until_idle(&mut world);

        let imp = add_unit(&mut world, "imp", Team::PLAYERS, 0, Position::new(2, 1));
        world
            .apply(Command::Enqueue {
                entity: imp,
                action: MicroAction::Step(Direction::West),
            })
            .expect("imp exists");
        world.step();
        assert_eq!(world.position_of(imp), Some(origin));

        assert_eq!(
            world.apply(Command::ResetMove { session: VIEWER, unit: hero }),
            Err(CommandError::Blocked(origin))
        );
        assert_eq!(world.position_of(hero), Some(Position::new(1, 3)));
        assert_eq!(world.mob(hero).map(|m| m.moved), Some(true));
        assert_eq!(world.tile_at(origin).occupants().count(), 1);
    }

    #[test]
    fn attacking_after_moving_ends_the_turn() {
        let (mut world, hero, orc) = duel();
        world
            .apply(Command::Move {
                session: VIEWER,
                unit: hero,
                to: Position::new(1, 4),
            })
            .expect("move accepted");
        run_until_idle(&mut world);
        world
            .apply(Command::Click {
                session: VIEWER,
                position: Position::new(1, 5),
            })
            .expect("attack accepted");
        assert_eq!(
            world.stack().iter().map(StateAction::label).collect::<Vec<_>>(),
            vec!["next-turn", "attack"]
        );
        run_until_idle(&mut world);
        assert_eq!(world.mob(orc).map(|m| m.hp.current), Some(17));
    }

    #[test]
    fn removing_a_unit_whose_turn_already_ended_schedules_once() {
        let (mut world, hero, _) = duel();
        let squire = add_unit(&mut world, "squire", Team::PLAYERS, 5, Position::new(4, 4));
        world
            .apply(Command::Move {
                session: VIEWER,
                unit: hero,
                to: Position::new(1, 4),
            })
            .expect("move accepted");
        run_until_idle(&mut world);
        world
            .apply(Command::Click {
                session: VIEWER,
                position: Position::new(1, 5),
            })
            .expect("attack accepted");

        world.apply(Command::Remove { entity: hero }).expect("removed");
        let handoffs = world
            .stack()
            .iter()
            .filter(|s| matches!(s, StateAction::NextTurn))
            .count();
        assert_eq!(handoffs, 1);

        world.drain_events();
        run_until_idle(&mut world);
        let starts = world
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, WorldEvent::TurnStarted { entity, .. } if *entity == squire))
            .count();
        assert_eq!(starts, 1);
        assert_eq!(world.up(), Some(squire));
    }

    #[test]
    fn empty_tiles_cannot_be_attacked() {
        let (mut world, hero, _) = duel();
        let result = world.apply(Command::Attack {
            session: VIEWER,
            unit: hero,
            target: Position::new(1, 2),
        });
        assert_eq!(result, Err(CommandError::NoTarget(Position::new(1, 2))));
        assert_eq!(world.mob(hero).map(|m| m.acted), Some(false));
    }

    #[test]
    fn casting_checks_the_spellbook_and_mana() {
        let (mut world, hero, _) = duel();
        let cast = |spell: &str| Command::Cast {
            session: VIEWER,
            unit: hero,
            spell: spell.into(),
            target: Position::new(1, 5),
        };
        assert_eq!(
            world.apply(cast("meteor")),
            Err(CommandError::UnknownSpell("meteor".into()))
        );
        let bolt = Weapon::new(
            "bolt",
            DamageSpec::magical(DiceExpr::constant(4)),
            6,
        )
        .magic(50, Hitbox::Single, 0);
        if let Some(mob) = world.mob_mut(hero) {
            mob.spells.push(bolt);
        }
        assert_eq!(
            world.apply(cast("bolt")),
            Err(CommandError::NotEnoughMp("bolt".into()))
        );
        assert!(world.drain_events().contains(&WorldEvent::Notice {
            session: VIEWER,
            text: "Not enough MP to cast bolt.".into(),
        }));
    }

    #[test]
    fn ending_the_turn_hands_initiative_on() {
        let (mut world, hero, orc) = duel();
        if let Some(mob) = world.mob_mut(orc) {
            mob.ct = 99;
        }
        world
            .apply(Command::EndTurn { session: VIEWER, unit: hero })
            .expect("end turn accepted");
        assert_eq!(world.mob(hero).map(|m| m.ct), Some(40));
        world.step();
        assert_eq!(world.up(), Some(orc));
    }

    #[test]
    fn listeners_are_tracked() {
        let (mut world, _, _) = duel();
        world.apply(Command::Listen { session: VIEWER }).expect("listen");
        world.apply(Command::Listen { session: VIEWER }).expect("listen twice");
        assert_eq!(world.observers().collect::<Vec<_>>(), vec![VIEWER]);
        world.apply(Command::Part { session: VIEWER }).expect("part");
        assert_eq!(
            world.drain_events(),
            vec![
                WorldEvent::ObserverJoined { session: VIEWER },
                WorldEvent::ObserverLeft { session: VIEWER },
            ]
        );
    }

    #[test]
    fn removing_the_active_unit_schedules_the_next_turn() {
        let (mut world, hero, _) = duel();
        world.apply(Command::Remove { entity: hero }).expect("remove");
        assert_eq!(world.up(), None);
        assert_eq!(world.stack().top().map(StateAction::label), Some("next-turn"));
        assert_eq!(
            world.apply(Command::Remove { entity: hero }),
            Err(CommandError::UnknownEntity(hero))
        );
    }
}
