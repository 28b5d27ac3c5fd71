//! The world's state stack: multi-tick procedures run one step per tick.
//!
//! Only the top entry runs on a tick. Entries pushed while a tick or command
//! is in flight are staged and land once it completes, so a state that
//! schedules follow-up work never sees that work run inside its own step.

use super::ai::AiState;
use super::World;
use crate::combat::Weapon;
use crate::config::BattleConfig;
use crate::entity::Capabilities;
use crate::state::{Color, EntityId, Glyph, Position};

/// Hit-flash effects spawned when a projectile lands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImpactFlash {
    pub glyph: Glyph,
    pub tiles: Vec<Position>,
}

/// Walks an entity along a path, one tile per `step_wait + 1` ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveState {
    pub entity: EntityId,
    pub path: Vec<Position>,
    pub index: usize,
    pub wait: u32,
    pub step_wait: u32,
    /// Remove the walker once it reaches the end of the path.
    pub delete_at_end: bool,
    pub on_end: Option<ImpactFlash>,
}

impl MoveState {
    pub fn walk(entity: EntityId, path: Vec<Position>) -> Self {
        Self {
            entity,
            path,
            index: 0,
            wait: 0,
            step_wait: BattleConfig::MOVE_STEP_WAIT,
            delete_at_end: false,
            on_end: None,
        }
    }

    pub fn projectile(entity: EntityId, path: Vec<Position>, on_end: Option<ImpactFlash>) -> Self {
        Self {
            step_wait: BattleConfig::PROJECTILE_STEP_WAIT,
            delete_at_end: true,
            on_end,
            ..Self::walk(entity, path)
        }
    }
}

/// A resolved attack: first tick launches the projectile, the following
/// tick (once the flight has finished above it) applies the hits.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackState {
    pub attacker: EntityId,
    pub weapon: Weapon,
    pub targets: Vec<EntityId>,
    pub projectile_path: Vec<Position>,
    pub hit_tiles: Vec<Position>,
    pub launched: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StateAction {
    /// Advance initiative to the next unit able to act.
    NextTurn,
    Move(MoveState),
    Attack(AttackState),
    EnemyAi(AiState),
    /// Terminal; never finishes.
    GameOver,
}

impl StateAction {
    pub fn label(&self) -> &'static str {
        match self {
            StateAction::NextTurn => "next-turn",
            StateAction::Move(_) => "move",
            StateAction::Attack(_) => "attack",
            StateAction::EnemyAi(_) => "enemy-ai",
            StateAction::GameOver => "game-over",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Pending {
    Top(StateAction),
    Bottom(StateAction),
}

/// Ordered stack of in-flight states; the last entry is the top.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateStack {
    entries: Vec<StateAction>,
    pending: Vec<Pending>,
}

impl StateStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `state` to land on top at the next flush.
    pub fn push_top(&mut self, state: StateAction) {
        self.pending.push(Pending::Top(state));
    }

    /// Stages `state` to land beneath every current entry at the next flush.
    pub fn push_bottom(&mut self, state: StateAction) {
        self.pending.push(Pending::Bottom(state));
    }

    /// Lands staged pushes in the order they were made.
    pub fn flush(&mut self) {
        for pending in std::mem::take(&mut self.pending) {
            match pending {
                Pending::Top(state) => self.entries.push(state),
                Pending::Bottom(state) => self.entries.insert(0, state),
            }
        }
    }

    pub(crate) fn pop_top(&mut self) -> Option<StateAction> {
        self.entries.pop()
    }

    /// Returns a still-running state to its slot. Anything it staged lands
    /// above it on the following flush.
    pub(crate) fn reseat(&mut self, state: StateAction) {
        self.entries.push(state);
    }

    pub fn top(&self) -> Option<&StateAction> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Something is in flight or staged.
    pub fn is_busy(&self) -> bool {
        !self.entries.is_empty() || !self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending.clear();
    }

    /// A turn hand-off is already in flight or staged.
    pub fn holds_next_turn(&self) -> bool {
        self.entries.iter().any(|s| matches!(s, StateAction::NextTurn))
            || self.pending.iter().any(|p| {
                matches!(p, Pending::Top(StateAction::NextTurn) | Pending::Bottom(StateAction::NextTurn))
            })
    }

    /// Bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &StateAction> {
        self.entries.iter()
    }
}

impl World {
    /// Runs one step of `state`; returns whether it has finished.
    pub(super) fn run_state(&mut self, state: &mut StateAction) -> bool {
        match state {
            StateAction::NextTurn => {
                self.next_turn();
                true
            }
            StateAction::Move(walk) => self.run_move(walk),
            StateAction::Attack(attack) => self.run_attack(attack),
            StateAction::EnemyAi(ai) => self.run_ai(ai),
            StateAction::GameOver => false,
        }
    }

    fn run_move(&mut self, walk: &mut MoveState) -> bool {
        let Some(entity) = self.entity(walk.entity) else {
            return true;
        };
        let collidable = entity.has(Capabilities::COLLIDABLE);
        if walk.wait < walk.step_wait {
            walk.wait += 1;
            return false;
        }
        walk.wait = 0;

        let Some(&next) = walk.path.get(walk.index) else {
            self.finish_move(walk);
            return true;
        };
        if collidable && self.is_blocked(next, &[walk.entity]) {
            self.finish_move(walk);
            return true;
        }
        self.relocate(walk.entity, next);
        walk.index += 1;
        if walk.index >= walk.path.len() {
            self.finish_move(walk);
            return true;
        }
        false
    }

    fn finish_move(&mut self, walk: &mut MoveState) {
        if walk.delete_at_end {
            self.delete(walk.entity);
        }
        if let Some(flash) = walk.on_end.take() {
            for tile in flash.tiles {
                self.spawn_effect(flash.glyph, tile, Some(BattleConfig::HIT_EFFECT_LIFE));
            }
        }
    }

    fn run_attack(&mut self, attack: &mut AttackState) -> bool {
        if !attack.launched {
            attack.launched = true;
            self.launch_projectile(attack);
            if let Some(mob) = self.mob_mut(attack.attacker) {
                mob.mp.adjust(-attack.weapon.mp_cost);
            }
            return false;
        }
        for &target in &attack.targets {
            if self.is_alive(target) {
                self.resolve_hit(attack.attacker, target, &attack.weapon);
            }
        }
        true
    }

    fn launch_projectile(&mut self, attack: &AttackState) {
        let flash = attack.weapon.hit_glyph.map(|glyph| ImpactFlash {
            glyph,
            tiles: attack.hit_tiles.clone(),
        });
        let Some((&first, rest)) = attack.projectile_path.split_first() else {
            if let Some(flash) = flash {
                for tile in flash.tiles {
                    self.spawn_effect(flash.glyph, tile, Some(BattleConfig::HIT_EFFECT_LIFE));
                }
            }
            return;
        };
        let glyph = attack
            .weapon
            .projectile
            .unwrap_or(Glyph::new('*', Color::Yellow));
        let projectile = self.spawn_effect(glyph, first, None);
        self.stack.push_top(StateAction::Move(MoveState::projectile(
            projectile,
            rest.to_vec(),
            flash,
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::state::Team;

    #[test]
    fn bottom_pushes_land_beneath_running_states() {
        let mut stack = StateStack::new();
        stack.push_top(StateAction::GameOver);
        stack.flush();
        stack.push_bottom(StateAction::NextTurn);
        assert!(stack.is_busy());
        assert_eq!(stack.len(), 1);
        stack.flush();
        assert_eq!(
            stack.iter().map(StateAction::label).collect::<Vec<_>>(),
            vec!["next-turn", "game-over"]
        );
    }

    #[test]
    fn walking_takes_one_tile_per_tick() {
        let mut world = open_world(5, 1);
        let id = add_unit(&mut world, "a", Team::PLAYERS, 5, Position::new(0, 0));
        let path = vec![Position::new(1, 0), Position::new(2, 0), Position::new(3, 0)];
        world.push_state(StateAction::Move(MoveState::walk(id, path)));

        world.step();
        assert_eq!(world.position_of(id), Some(Position::new(1, 0)));
        world.step();
        world.step();
        assert_eq!(world.position_of(id), Some(Position::new(3, 0)));
        assert!(!world.is_busy());
    }

    #[test]
    fn walkers_stop_before_an_occupied_tile() {
        let mut world = open_world(5, 1);
        let id = add_unit(&mut world, "a", Team::PLAYERS, 5, Position::new(0, 0));
        add_unit(&mut world, "b", Team(1), 5, Position::new(2, 0));
        let path = vec![Position::new(1, 0), Position::new(2, 0), Position::new(3, 0)];
        world.push_state(StateAction::Move(MoveState::walk(id, path)));
        for _ in 0..4 {
            world.step();
        }
        assert_eq!(world.position_of(id), Some(Position::new(1, 0)));
        assert!(!world.is_busy());
    }

    #[test]
    fn projectiles_advance_every_other_tick_and_vanish() {
        let mut world = open_world(5, 1);
        let dart = world.spawn_effect(Glyph::new('-', Color::White), Position::new(0, 0), None);
        let flash = ImpactFlash {
            glyph: Glyph::new('x', Color::Red),
            tiles: vec![Position::new(2, 0)],
        };
        let path = vec![Position::new(1, 0), Position::new(2, 0)];
        world.push_state(StateAction::Move(MoveState::projectile(dart, path, Some(flash))));

        world.step();
        assert_eq!(world.position_of(dart), Some(Position::new(0, 0)));
        world.step();
        assert_eq!(world.position_of(dart), Some(Position::new(1, 0)));
        world.step();
        world.step();
        assert!(world.entity(dart).is_none());
        assert!(world.top_occupant(Position::new(2, 0)).is_some());
        assert!(!world.is_busy());
    }
}
