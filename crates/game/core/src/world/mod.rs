//! The authoritative battle world.
//!
//! [`World`] owns maps, entities, the initiative waitlist and the state
//! stack. It is driven from outside through exactly two entry points:
//! [`World::apply`] for one queued command and [`World::step`] for one tick.
//! Everything observable that happens during either call is appended to an
//! outbox that the driver drains with [`World::drain_events`].

mod ai;
mod battle;
mod combat;
mod command;
mod events;
mod scheduler;
mod stack;
mod view;

pub use ai::AiState;
pub use battle::BonusOffer;
pub use command::{Bonus, Command};
pub use events::WorldEvent;
pub use stack::{AttackState, ImpactFlash, MoveState, StateAction, StateStack};
pub use view::{BattleView, UnitSummary};

use std::collections::{BTreeMap, BTreeSet};

use crate::combat::{Hitbox, Weapon};
use crate::config::BattleConfig;
use crate::entity::{Capabilities, Entity, EntityKind, MicroAction, Mob, UnitTemplate};
use crate::env::{BattleRng, ContentOracle};
use crate::grid::{self, Map, RayHit, Tile};
use crate::state::{EntityId, Glyph, Position, SessionId, Team};

/// A player-team unit carried from battle to battle.
#[derive(Clone, Debug, PartialEq)]
pub struct RosterUnit {
    pub name: String,
    pub glyph: Glyph,
    pub mob: Mob,
    /// Live entity while a battle is running.
    pub entity: Option<EntityId>,
}

impl RosterUnit {
    fn from_template(template: &UnitTemplate) -> Self {
        Self {
            name: template.name.clone(),
            glyph: template.glyph,
            mob: Mob::from_template(template, Team::PLAYERS),
            entity: None,
        }
    }
}

pub struct World {
    config: BattleConfig,
    content: Box<dyn ContentOracle>,
    maps: BTreeMap<String, Map>,
    entities: BTreeMap<EntityId, Entity>,
    waitlist: Vec<EntityId>,
    stack: StateStack,
    observers: BTreeSet<SessionId>,
    outbox: Vec<WorldEvent>,
    roster: Vec<RosterUnit>,
    rng: BattleRng,
    next_id: u32,
    tick: u64,
    turn: u64,
    up: Option<EntityId>,
    turn_origin: Option<Position>,
    score: i64,
    level: u32,
    current_map: Option<String>,
    battle_won: bool,
    game_over: bool,
}

impl World {
    pub fn new(config: BattleConfig, content: Box<dyn ContentOracle>) -> Self {
        let maps = content
            .maps()
            .into_iter()
            .map(|map| (map.name().to_string(), map))
            .collect();
        let roster = content
            .player_team()
            .iter()
            .map(RosterUnit::from_template)
            .collect();
        let rng = BattleRng::new(config.seed);
        Self {
            config,
            content,
            maps,
            entities: BTreeMap::new(),
            waitlist: Vec::new(),
            stack: StateStack::new(),
            observers: BTreeSet::new(),
            outbox: Vec::new(),
            roster,
            rng,
            next_id: 0,
            tick: 0,
            turn: 0,
            up: None,
            turn_origin: None,
            score: 0,
            level: 0,
            current_map: None,
            battle_won: false,
            game_over: false,
        }
    }

    // ===== accessors =====

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// The unit whose turn it is.
    pub fn up(&self) -> Option<EntityId> {
        self.up
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_busy(&self) -> bool {
        self.stack.is_busy()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn battle_won(&self) -> bool {
        self.battle_won
    }

    pub fn stack(&self) -> &StateStack {
        &self.stack
    }

    pub fn observers(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.observers.iter().copied()
    }

    pub fn roster(&self) -> &[RosterUnit] {
        &self.roster
    }

    pub fn waitlist(&self) -> &[EntityId] {
        &self.waitlist
    }

    pub fn map(&self, name: &str) -> Option<&Map> {
        self.maps.get(name)
    }

    pub fn current_map(&self) -> Option<&Map> {
        self.current_map.as_ref().and_then(|name| self.maps.get(name))
    }

    fn current_map_mut(&mut self) -> Option<&mut Map> {
        let name = self.current_map.as_ref()?;
        self.maps.get_mut(name)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn mob(&self, id: EntityId) -> Option<&Mob> {
        self.entities.get(&id).and_then(Entity::as_mob)
    }

    pub(crate) fn mob_mut(&mut self, id: EntityId) -> Option<&mut Mob> {
        self.entities.get_mut(&id).and_then(Entity::as_mob_mut)
    }

    pub fn name_of(&self, id: EntityId) -> String {
        self.entities
            .get(&id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn position_of(&self, id: EntityId) -> Option<Position> {
        self.entities.get(&id).map(|e| e.position)
    }

    pub(crate) fn is_alive(&self, id: EntityId) -> bool {
        self.mob(id).is_some_and(Mob::is_alive)
    }

    /// Whether the AI, rather than an attached viewer, drives this unit.
    pub fn is_ai_controlled(&self, mob: &Mob) -> bool {
        !mob.team.is_player() || self.config.autopilot
    }

    // ===== outbox =====

    pub(crate) fn emit(&mut self, event: WorldEvent) {
        self.outbox.push(event);
    }

    pub fn broadcast(&mut self, text: impl Into<String>) {
        self.emit(WorldEvent::Message(text.into()));
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.outbox)
    }

    // ===== registry =====

    fn allocate_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }

    /// Registers a new entity on the current map. Turn-taking entities join
    /// the waitlist.
    pub fn spawn(
        &mut self,
        name: impl Into<String>,
        glyph: Glyph,
        position: Position,
        kind: EntityKind,
    ) -> EntityId {
        let id = self.allocate_id();
        let entity = Entity {
            id,
            name: name.into(),
            glyph,
            position,
            kind,
        };
        let turn_taking = entity.has(Capabilities::TURN_TAKING);
        if let Some(map) = self.current_map_mut() {
            map.place(id, position);
        }
        self.entities.insert(id, entity);
        if turn_taking {
            self.waitlist.push(id);
            self.sort_waitlist();
        }
        id
    }

    pub(crate) fn spawn_effect(
        &mut self,
        glyph: Glyph,
        position: Position,
        life: Option<u32>,
    ) -> EntityId {
        let id = self.allocate_id();
        if let Some(map) = self.current_map_mut() {
            map.place(id, position);
        }
        self.entities
            .insert(id, Entity::effect(id, glyph, position, life));
        id
    }

    /// Removes an entity from the map, the registry and the waitlist.
    /// Unknown ids are ignored.
    pub fn delete(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        if let Some(map) = self.current_map_mut() {
            map.lift(id, entity.position);
        }
        self.waitlist.retain(|other| *other != id);
        for unit in &mut self.roster {
            if unit.entity == Some(id) {
                unit.entity = None;
            }
        }
        Some(entity)
    }

    /// Moves an entity to `to`, keeping map occupancy in sync.
    pub(crate) fn relocate(&mut self, id: EntityId, to: Position) -> bool {
        let Some(from) = self.position_of(id) else {
            return false;
        };
        let Some(map) = self.current_map_mut() else {
            return false;
        };
        if !map.contains(to) {
            return false;
        }
        map.lift(id, from);
        map.place(id, to);
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.position = to;
        }
        true
    }

    // ===== spatial queries =====

    /// Tile at `position` on the current map; a synthetic wall when there is
    /// no map or the position is out of bounds.
    pub fn tile_at(&self, position: Position) -> &Tile {
        match self.current_map() {
            Some(map) => map.tile(position),
            None => Tile::void(),
        }
    }

    /// Occupant drawn on top: highest Z, then highest id.
    pub fn top_occupant(&self, position: Position) -> Option<EntityId> {
        self.tile_at(position)
            .occupants()
            .filter_map(|id| self.entities.get(&id))
            .max_by_key(|e| (e.z(), e.id))
            .map(|e| e.id)
    }

    pub fn living_mob_at(&self, position: Position) -> Option<EntityId> {
        self.tile_at(position)
            .occupants()
            .find(|id| self.is_alive(*id))
    }

    /// Terrain collides, or a collidable entity outside `ignore` stands here.
    pub fn is_blocked(&self, position: Position, ignore: &[EntityId]) -> bool {
        let tile = self.tile_at(position);
        tile.collides
            || tile.occupants().any(|id| {
                !ignore.contains(&id)
                    && self
                        .entities
                        .get(&id)
                        .is_some_and(|e| e.has(Capabilities::COLLIDABLE))
            })
    }

    pub fn find_path(&self, from: Position, to: Position, ignore: &[EntityId]) -> Vec<Position> {
        match self.current_map() {
            Some(map) => grid::find_path(map, from, to, |p| self.is_blocked(p, ignore)),
            None => Vec::new(),
        }
    }

    /// Shortest path bringing `mover` orthogonally adjacent to `target`.
    pub fn find_path_next_to(&self, mover: EntityId, target: EntityId) -> Option<Vec<Position>> {
        let map = self.current_map()?;
        let from = self.position_of(mover)?;
        let to = self.position_of(target)?;
        grid::find_path_next_to(map, from, to, |p| self.is_blocked(p, &[mover]))
    }

    pub fn raycast(
        &self,
        from: Position,
        to: Position,
        ignore_obstacles: bool,
        ignore: &[EntityId],
    ) -> RayHit {
        let Some(map) = self.current_map() else {
            return RayHit {
                blocked: true,
                ..RayHit::default()
            };
        };
        grid::raycast(map, from, to, ignore_obstacles, |p| {
            self.tile_at(p)
                .occupants()
                .find(|id| !ignore.contains(id) && self.is_alive(*id))
        })
    }

    /// Living mobs and non-wall tiles covered by `hitbox` around `center`.
    pub fn find_targets(
        &self,
        center: Position,
        size: u32,
        hitbox: Hitbox,
    ) -> (Vec<EntityId>, Vec<Position>) {
        let tiles: Vec<Position> = hitbox
            .area(center, size)
            .into_iter()
            .filter(|p| !self.tile_at(*p).collides)
            .collect();
        let targets = tiles
            .iter()
            .flat_map(|p| self.tile_at(*p).occupants())
            .filter(|id| self.is_alive(*id))
            .collect();
        (targets, tiles)
    }

    /// Whether `attacker` standing at `from` could hit `target` with
    /// `weapon`: in range, on a legal axis, and (for non-magic weapons) with
    /// a clear line of fire ending on the target.
    pub fn can_attack_from(
        &self,
        attacker: EntityId,
        from: Position,
        target: EntityId,
        weapon: &Weapon,
    ) -> bool {
        let Some(to) = self.position_of(target) else {
            return false;
        };
        if !self.is_alive(target) || !weapon.reaches(from, to) {
            return false;
        }
        if weapon.magic {
            return true;
        }
        let hit = self.raycast(from, to, false, &[attacker]);
        !hit.blocked && hit.target == Some(target)
    }

    pub fn status_line(&self, id: EntityId) -> Option<String> {
        self.entities.get(&id).map(Entity::status_line)
    }

    // ===== tick =====

    /// Advances the world by one tick: runs the top state-stack entry, then
    /// per-tick entity hooks, then the win/loss check.
    pub fn step(&mut self) {
        if let Some(mut state) = self.stack.pop_top() {
            let finished = self.run_state(&mut state);
            if !finished {
                self.stack.reseat(state);
            }
            self.stack.flush();
        }
        self.tick += 1;
        self.tick_entities();
        self.check_outcome();
        self.stack.flush();
    }

    fn tick_entities(&mut self) {
        let tickable: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.has(Capabilities::TICKABLE))
            .map(|e| e.id)
            .collect();
        for id in tickable {
            let Some(entity) = self.entities.get_mut(&id) else {
                continue;
            };
            match &mut entity.kind {
                EntityKind::Effect(effect) => {
                    if let Some(life) = &mut effect.life {
                        *life = life.saturating_sub(1);
                        if *life == 0 {
                            self.delete(id);
                        }
                    }
                }
                EntityKind::Mob(mob) => {
                    if let Some(action) = mob.next_micro_action() {
                        self.run_micro_action(id, action);
                    }
                }
            }
        }
    }

    fn run_micro_action(&mut self, id: EntityId, action: MicroAction) {
        match action {
            MicroAction::Step(direction) => {
                let Some(from) = self.position_of(id) else {
                    return;
                };
                let to = from.step(direction);
                if !self.is_blocked(to, &[id]) {
                    self.relocate(id, to);
                }
            }
            MicroAction::Say(text) => {
                let name = self.name_of(id);
                self.broadcast(format!("{name}: {text}"));
            }
            MicroAction::Wait => {}
        }
    }

    /// Queues a state from outside the tick, on top of the stack.
    pub fn push_state(&mut self, state: StateAction) {
        self.stack.push_top(state);
        self.stack.flush();
    }

    /// Queues a state from outside the tick, beneath everything in flight.
    pub fn push_state_bottom(&mut self, state: StateAction) {
        self.stack.push_bottom(state);
        self.stack.flush();
    }
}
