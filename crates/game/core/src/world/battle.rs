//! Battle lifecycle: scoring, roster upkeep, spawning and bonuses.

use super::{Bonus, RosterUnit, StateAction, World, WorldEvent};
use crate::config::BattleConfig;
use crate::entity::{EntityKind, Mob};
use crate::error::CommandError;
use crate::state::{EntityId, Team};

/// A bonus offered to one roster slot after a victory.
#[derive(Clone, Debug, PartialEq)]
pub struct BonusOffer {
    pub slot: usize,
    pub unit: String,
    pub bonus: Bonus,
}

impl World {
    /// Starts battle `level`. Every level after the first first scores the
    /// battle just won and drops fallen roster units.
    pub fn start_battle(&mut self, level: u32) -> Result<(), CommandError> {
        let spec = self
            .content
            .level(level)
            .cloned()
            .ok_or(CommandError::UnknownLevel(level))?;
        if !self.maps.contains_key(&spec.map) {
            return Err(CommandError::UnknownMap(spec.map));
        }

        self.sync_roster();
        if level > 0 {
            self.score_battle();
        }

        self.clear_battlefield();
        self.level = level;
        self.turn = 0;
        self.battle_won = false;
        self.current_map = Some(spec.map.clone());

        let player_spawns = self
            .current_map()
            .map(|map| map.spawn_points(Team::PLAYERS).to_vec())
            .unwrap_or_default();
        for slot in 0..self.roster.len() {
            let Some(&position) = player_spawns.get(slot) else {
                tracing::warn!(slot, map = %spec.map, "not enough player spawn points");
                break;
            };
            let unit = &self.roster[slot];
            let (name, glyph) = (unit.name.clone(), unit.glyph);
            let mut mob = unit.mob.clone();
            mob.reset_for_battle();
            let id = self.spawn(name, glyph, position, EntityKind::Mob(Box::new(mob)));
            self.roster[slot].entity = Some(id);
        }

        let enemy_team = Team(1);
        let enemy_spawns = self
            .current_map()
            .map(|map| map.spawn_points(enemy_team).to_vec())
            .unwrap_or_default();
        for (template, &position) in spec.enemies.iter().zip(&enemy_spawns) {
            let mut mob = Mob::from_template(template, enemy_team);
            mob.reset_for_battle();
            self.spawn(
                template.name.clone(),
                template.glyph,
                position,
                EntityKind::Mob(Box::new(mob)),
            );
        }
        if spec.enemies.len() > enemy_spawns.len() {
            tracing::warn!(map = %spec.map, "not enough enemy spawn points");
        }

        tracing::info!(level, map = %spec.map, units = self.waitlist.len(), "battle started");
        self.emit(WorldEvent::BattleStarted {
            level,
            map: spec.map,
        });
        self.next_turn();
        Ok(())
    }

    /// Copies live roster mobs back into the roster.
    fn sync_roster(&mut self) {
        for slot in 0..self.roster.len() {
            let live = self.roster[slot]
                .entity
                .and_then(|id| self.mob(id))
                .cloned();
            if let Some(mob) = live {
                self.roster[slot].mob = mob;
            }
        }
    }

    fn score_battle(&mut self) {
        let par = (BattleConfig::SCORE_TURN_PAR - self.turn as i64).max(0) * 2;
        self.score += BattleConfig::SCORE_PER_VICTORY + par;
        let before = self.roster.len();
        self.roster.retain(|unit| unit.mob.is_alive());
        let fallen = (before - self.roster.len()) as i64;
        self.score -= fallen * BattleConfig::SCORE_PER_FALLEN_UNIT;
    }

    fn clear_battlefield(&mut self) {
        self.entities.clear();
        self.waitlist.clear();
        self.stack.clear();
        self.up = None;
        self.turn_origin = None;
        for map in self.maps.values_mut() {
            map.clear_occupants();
        }
        for unit in &mut self.roster {
            unit.entity = None;
        }
    }

    /// Returns the world to its initial state. Observers stay attached.
    pub fn reset(&mut self) {
        self.clear_battlefield();
        self.roster = self
            .content
            .player_team()
            .iter()
            .map(RosterUnit::from_template)
            .collect();
        self.tick = 0;
        self.turn = 0;
        self.score = 0;
        self.level = 0;
        self.current_map = None;
        self.battle_won = false;
        self.game_over = false;
        tracing::info!("world reset");
    }

    /// Win/loss check run at the end of every tick.
    pub(super) fn check_outcome(&mut self) {
        if self.game_over || self.current_map.is_none() {
            return;
        }
        let (mut players, mut players_alive) = (0, 0);
        let (mut enemies, mut enemies_alive) = (0, 0);
        for mob in self.entities.values().filter_map(|e| e.as_mob()) {
            let alive = usize::from(mob.is_alive());
            if mob.team.is_player() {
                players += 1;
                players_alive += alive;
            } else {
                enemies += 1;
                enemies_alive += alive;
            }
        }
        if players > 0 && players_alive == 0 {
            self.game_over = true;
            self.stack.push_top(StateAction::GameOver);
            tracing::info!(score = self.score, level = self.level, "game over");
            self.emit(WorldEvent::GameOver { score: self.score });
        } else if !self.battle_won && enemies > 0 && enemies_alive == 0 {
            self.battle_won = true;
            tracing::info!(level = self.level, turn = self.turn, "battle won");
            self.emit(WorldEvent::Victory {
                level: self.level,
                score: self.score,
            });
        }
    }

    /// Rolls one bonus per roster unit: a class spell (or extra MP once the
    /// class has nothing left to teach) 60% of the time when the class has a
    /// spell list, otherwise extra HP or speed.
    pub fn offer_bonuses(&mut self) -> Vec<BonusOffer> {
        let level = self.level;
        let mut offers = Vec::with_capacity(self.roster.len());
        for slot in 0..self.roster.len() {
            let unit = &self.roster[slot];
            let name = unit.name.clone();
            let known: Vec<String> = unit.mob.spells.iter().map(|s| s.name.clone()).collect();
            let unlocks = unit
                .mob
                .class
                .as_deref()
                .map(|class| self.content.class_spells(class))
                .unwrap_or_default();

            let bonus = if !unlocks.is_empty() && !self.rng.chance(0.4) {
                let mut learnable: Vec<_> = unlocks
                    .into_iter()
                    .filter(|u| u.level <= level && !known.contains(&u.spell.name))
                    .collect();
                if learnable.is_empty() {
                    Bonus::MaxMp((level as i32 + 1) * 5)
                } else {
                    let pick = self.rng.range(0, learnable.len() as i32 - 1) as usize;
                    Bonus::LearnSpell(learnable.swap_remove(pick).spell)
                }
            } else if self.rng.chance(0.5) {
                Bonus::MaxHp((level as i32 + 1) * 5)
            } else {
                Bonus::Speed(self.rng.range(1, 2))
            };
            offers.push(BonusOffer {
                slot,
                unit: name,
                bonus,
            });
        }
        offers
    }

    /// Live entity for a roster slot during a battle.
    pub fn roster_entity(&self, slot: usize) -> Option<EntityId> {
        self.roster.get(slot).and_then(|unit| unit.entity)
    }
}
