//! Read-only snapshots handed to observers.

use super::World;
use crate::combat::Weapon;
use crate::entity::Capabilities;
use crate::state::{EntityId, Glyph, Position, ResourceMeter, Team};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitSummary {
    pub id: EntityId,
    pub name: String,
    pub team: Team,
    pub position: Position,
    pub hp: ResourceMeter,
    pub mp: ResourceMeter,
    pub ct: i32,
    pub speed: i32,
    pub alive: bool,
    pub status: String,
}

/// Everything a viewer needs to draw one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleView {
    pub map: Option<String>,
    pub width: i32,
    pub height: i32,
    /// Row-major glyphs: top occupant where there is one, ground otherwise.
    pub rows: Vec<Vec<Glyph>>,
    pub units: Vec<UnitSummary>,
    pub tick: u64,
    pub turn: u64,
    pub up: Option<EntityId>,
    pub busy: bool,
    pub score: i64,
    pub level: u32,
    pub battle_won: bool,
    pub game_over: bool,
}

impl BattleView {
    pub fn glyph_at(&self, position: Position) -> Option<Glyph> {
        let row = self.rows.get(usize::try_from(position.y).ok()?)?;
        row.get(usize::try_from(position.x).ok()?).copied()
    }

    /// Rows as plain text, one line per row.
    pub fn render_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.iter().map(|g| g.ch).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl World {
    pub fn view(&self) -> BattleView {
        let mut view = BattleView {
            map: self.current_map.clone(),
            tick: self.tick,
            turn: self.turn,
            up: self.up,
            busy: self.is_busy(),
            score: self.score,
            level: self.level,
            battle_won: self.battle_won,
            game_over: self.game_over,
            ..BattleView::default()
        };
        let Some(map) = self.current_map() else {
            return view;
        };
        view.width = map.width();
        view.height = map.height();
        view.rows = (0..map.height())
            .map(|y| {
                (0..map.width())
                    .map(|x| self.glyph_at(Position::new(x, y)))
                    .collect()
            })
            .collect();
        view.units = self
            .entities
            .values()
            .filter_map(|entity| {
                let mob = entity.as_mob()?;
                Some(UnitSummary {
                    id: entity.id,
                    name: entity.name.clone(),
                    team: mob.team,
                    position: entity.position,
                    hp: mob.hp,
                    mp: mob.mp,
                    ct: mob.ct,
                    speed: mob.speed(),
                    alive: mob.is_alive(),
                    status: entity.status_line(),
                })
            })
            .collect();
        view
    }

    /// Glyph drawn at `position`.
    pub fn glyph_at(&self, position: Position) -> Glyph {
        match self.top_occupant(position).and_then(|id| self.entity(id)) {
            Some(entity) => entity.display_glyph(),
            None => self.tile_at(position).ground,
        }
    }

    /// Tiles `unit` could aim `weapon` at from where it stands.
    pub fn tiles_in_range(&self, unit: EntityId, weapon: &Weapon) -> Vec<Position> {
        let (Some(map), Some(from)) = (self.current_map(), self.position_of(unit)) else {
            return Vec::new();
        };
        map.positions()
            .filter(|&p| weapon.reaches(from, p))
            .collect()
    }

    /// Tiles `unit` could walk to this turn.
    pub fn reachable_tiles(&self, unit: EntityId) -> Vec<Position> {
        let (Some(map), Some(entity)) = (self.current_map(), self.entity(unit)) else {
            return Vec::new();
        };
        let Some(mob) = entity.as_mob().filter(|_| entity.has(Capabilities::MOVABLE)) else {
            return Vec::new();
        };
        let range = mob.move_range();
        let from = entity.position;
        map.positions()
            .filter(|&p| p.distance(from) <= range && p != from)
            .filter(|&p| {
                let path = self.find_path(from, p, &[unit]);
                !path.is_empty() && path.len() <= range as usize
            })
            .collect()
    }
}
