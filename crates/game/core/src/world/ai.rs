//! Enemy turn controller.
//!
//! Runs as a state-stack entry across several ticks: pick a target and walk
//! toward it (the walk runs above this entry), then attack if the target is
//! now in reach, then end the turn.

use super::{MoveState, StateAction, World};
use crate::combat::Weapon;
use crate::state::{EntityId, Position};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AiState {
    pub unit: EntityId,
    pub target: Option<EntityId>,
    pub moved: bool,
    pub acted: bool,
}

impl AiState {
    pub fn new(unit: EntityId) -> Self {
        Self {
            unit,
            target: None,
            moved: false,
            acted: false,
        }
    }
}

impl World {
    pub(super) fn run_ai(&mut self, ai: &mut AiState) -> bool {
        // A removed unit's turn was already handed on by the removal.
        let Some(mob) = self.mob(ai.unit) else {
            return true;
        };
        if !mob.is_alive() {
            self.stack.push_bottom(StateAction::NextTurn);
            return true;
        }
        let weapon = mob.weapon.clone();

        let Some(target) = ai.target else {
            return self.ai_acquire(ai, &weapon);
        };

        let from = self.position_of(ai.unit).unwrap_or_default();
        if self.can_attack_from(ai.unit, from, target, &weapon) {
            let aim = self.position_of(target).unwrap_or(from);
            if let Some(plan) = self.plan_attack(ai.unit, &weapon, aim) {
                tracing::debug!(
                    target: "battle::ai",
                    unit = %ai.unit,
                    %target,
                    weapon = %weapon.name,
                    "attacking"
                );
                self.stack.push_top(StateAction::Attack(plan.state));
                ai.acted = true;
                if let Some(mob) = self.mob_mut(ai.unit) {
                    mob.acted = true;
                }
            }
        }
        self.ai_end_turn(ai);
        true
    }

    /// Picks a target: the first enemy already in reach, else the one with
    /// the shortest approach. Starts the approach walk if one is needed.
    fn ai_acquire(&mut self, ai: &mut AiState, weapon: &Weapon) -> bool {
        let Some(mob) = self.mob(ai.unit) else {
            return true;
        };
        let team = mob.team;
        let taunter = mob.stats.taunted_by.filter(|id| self.is_alive(*id));
        let move_range = mob.move_range() as usize;
        let Some(from) = self.position_of(ai.unit) else {
            return true;
        };

        let candidates: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| {
                e.as_mob()
                    .is_some_and(|m| m.is_alive() && m.team != team)
            })
            .map(|e| e.id)
            .filter(|id| taunter.is_none_or(|t| t == *id))
            .collect();

        let mut best: Option<(EntityId, Vec<Position>)> = None;
        for candidate in candidates {
            if self.can_attack_from(ai.unit, from, candidate, weapon) {
                ai.target = Some(candidate);
                return false;
            }
            let Some(mut path) = self.find_path_next_to(ai.unit, candidate) else {
                continue;
            };
            if path.is_empty() {
                continue;
            }
            if let Some(stop) = path
                .iter()
                .position(|&p| self.can_attack_from(ai.unit, p, candidate, weapon))
            {
                path.truncate(stop + 1);
            }
            if best.as_ref().is_none_or(|(_, shortest)| path.len() < shortest.len()) {
                best = Some((candidate, path));
            }
        }

        let Some((target, mut path)) = best else {
            tracing::debug!(target: "battle::ai", unit = %ai.unit, "no reachable enemy");
            self.ai_end_turn(ai);
            return true;
        };
        ai.target = Some(target);
        path.truncate(move_range);
        if path.is_empty() {
            return false;
        }
        tracing::debug!(
            target: "battle::ai",
            unit = %ai.unit,
            %target,
            steps = path.len(),
            "approaching"
        );
        ai.moved = true;
        if let Some(mob) = self.mob_mut(ai.unit) {
            mob.moved = true;
        }
        self.stack
            .push_top(StateAction::Move(MoveState::walk(ai.unit, path)));
        false
    }

    fn ai_end_turn(&mut self, ai: &AiState) {
        self.finish_turn(ai.unit);
        self.stack.push_bottom(StateAction::NextTurn);
    }
}
