use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::state::{Color, EntityId, Glyph, Position, Team};

/// Errors raised while building a map from row strings.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MapParseError {
    #[error("map `{name}` has no rows")]
    Empty { name: String },

    #[error("map `{name}` row {row} has width {found}, expected {expected}")]
    RaggedRow {
        name: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("map `{name}` has unknown tile {ch:?} at {position}")]
    UnknownTile {
        name: String,
        ch: char,
        position: Position,
    },
}

/// A single grid cell: ground glyph, terrain collision and the set of
/// entities standing on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pub ground: Glyph,
    pub collides: bool,
    occupants: BTreeSet<EntityId>,
}

/// Returned for out-of-bounds lookups so callers never index past the grid.
static VOID_TILE: Tile = Tile {
    ground: Glyph::BLANK,
    collides: true,
    occupants: BTreeSet::new(),
};

impl Tile {
    /// The synthetic tile standing in for anything outside the grid.
    pub fn void() -> &'static Tile {
        &VOID_TILE
    }

    pub fn floor() -> Self {
        Self::new(Glyph::new('.', Color::Gray), false)
    }

    pub fn wall() -> Self {
        Self::new(Glyph::new('#', Color::White), true)
    }

    pub fn new(ground: Glyph, collides: bool) -> Self {
        Self {
            ground,
            collides,
            occupants: BTreeSet::new(),
        }
    }

    pub fn occupants(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.occupants.iter().copied()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.occupants.contains(&id)
    }

    pub fn is_vacant(&self) -> bool {
        self.occupants.is_empty()
    }

    fn from_symbol(ch: char) -> Option<Self> {
        let tile = match ch {
            '.' => Tile::floor(),
            ',' => Tile::new(Glyph::new(',', Color::DarkGreen), false),
            '#' => Tile::wall(),
            '~' => Tile::new(Glyph::new('~', Color::Blue), true),
            'T' => Tile::new(Glyph::new('T', Color::Green), true),
            _ => return None,
        };
        Some(tile)
    }
}

/// A named rectangular battle grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Map {
    name: String,
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    spawn_points: BTreeMap<Team, Vec<Position>>,
}

impl Map {
    /// Creates an open floor map with no spawn points.
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        let width = width as i32;
        let height = height as i32;
        Self {
            name: name.into(),
            width,
            height,
            tiles: vec![Tile::floor(); (width.max(0) * height.max(0)) as usize],
            spawn_points: BTreeMap::new(),
        }
    }

    /// Builds a map from text rows.
    ///
    /// `.` floor, `,` grass, `#` wall, `~` water, `T` tree. A digit marks a
    /// floor tile that is a spawn point for the team with that number.
    pub fn from_rows<S: AsRef<str>>(
        name: impl Into<String>,
        rows: &[S],
    ) -> Result<Self, MapParseError> {
        let name = name.into();
        let Some(first) = rows.first() else {
            return Err(MapParseError::Empty { name });
        };
        let width = first.as_ref().chars().count();
        let mut tiles = Vec::with_capacity(width * rows.len());
        let mut spawn_points: BTreeMap<Team, Vec<Position>> = BTreeMap::new();

        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(MapParseError::RaggedRow {
                    name,
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, ch) in row.chars().enumerate() {
                let position = Position::new(x as i32, y as i32);
                if let Some(team) = ch.to_digit(10) {
                    spawn_points
                        .entry(Team(team as u8))
                        .or_default()
                        .push(position);
                    tiles.push(Tile::floor());
                    continue;
                }
                match Tile::from_symbol(ch) {
                    Some(tile) => tiles.push(tile),
                    None => {
                        return Err(MapParseError::UnknownTile { name, ch, position });
                    }
                }
            }
        }

        Ok(Self {
            name,
            width: width as i32,
            height: rows.len() as i32,
            tiles,
            spawn_points,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.width && position.y < self.height
    }

    fn index(&self, position: Position) -> Option<usize> {
        self.contains(position)
            .then(|| (position.y * self.width + position.x) as usize)
    }

    /// Tile at `position`, or a synthetic always-colliding tile when the
    /// position lies outside the grid.
    pub fn tile(&self, position: Position) -> &Tile {
        self.index(position)
            .and_then(|index| self.tiles.get(index))
            .unwrap_or(&VOID_TILE)
    }

    pub fn tile_mut(&mut self, position: Position) -> Option<&mut Tile> {
        let index = self.index(position)?;
        self.tiles.get_mut(index)
    }

    /// Overrides terrain at `position`. Out-of-bounds writes are ignored.
    pub fn set_terrain(&mut self, position: Position, ground: Glyph, collides: bool) {
        if let Some(tile) = self.tile_mut(position) {
            tile.ground = ground;
            tile.collides = collides;
        }
    }

    pub fn add_spawn_point(&mut self, team: Team, position: Position) {
        self.spawn_points.entry(team).or_default().push(position);
    }

    pub fn spawn_points(&self, team: Team) -> &[Position] {
        self.spawn_points
            .get(&team)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Adds `id` to the occupant set at `position`.
    pub fn place(&mut self, id: EntityId, position: Position) -> bool {
        match self.tile_mut(position) {
            Some(tile) => tile.occupants.insert(id),
            None => false,
        }
    }

    /// Removes `id` from the occupant set at `position`.
    pub fn lift(&mut self, id: EntityId, position: Position) -> bool {
        match self.tile_mut(position) {
            Some(tile) => tile.occupants.remove(&id),
            None => false,
        }
    }

    pub fn clear_occupants(&mut self) {
        for tile in &mut self.tiles {
            tile.occupants.clear();
        }
    }

    /// Iterates every in-bounds position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Position::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_tiles_always_collide() {
        let map = Map::new("open", 3, 3);
        assert!(!map.tile(Position::new(1, 1)).collides);
        assert!(map.tile(Position::new(-1, 0)).collides);
        assert!(map.tile(Position::new(3, 0)).collides);
    }

    #[test]
    fn rows_define_terrain_and_spawn_points() {
        let map = Map::from_rows("arena", &["#0.", ".~1", "..1"]).unwrap();
        assert_eq!((map.width(), map.height()), (3, 3));
        assert!(map.tile(Position::new(0, 0)).collides);
        assert!(map.tile(Position::new(1, 1)).collides);
        assert!(!map.tile(Position::new(1, 0)).collides);
        assert_eq!(map.spawn_points(Team(0)), &[Position::new(1, 0)]);
        assert_eq!(
            map.spawn_points(Team(1)),
            &[Position::new(2, 1), Position::new(2, 2)]
        );
        assert!(map.spawn_points(Team(7)).is_empty());
    }

    #[test]
    fn malformed_rows_are_rejected() {
        assert!(matches!(
            Map::from_rows("bad", &["...", ".."]),
            Err(MapParseError::RaggedRow { row: 1, .. })
        ));
        assert!(matches!(
            Map::from_rows("bad", &[".?."]),
            Err(MapParseError::UnknownTile { ch: '?', .. })
        ));
        assert!(matches!(
            Map::from_rows::<&str>("bad", &[]),
            Err(MapParseError::Empty { .. })
        ));
    }

    #[test]
    fn occupancy_tracks_place_and_lift() {
        let mut map = Map::new("open", 2, 2);
        let id = EntityId(4);
        assert!(map.place(id, Position::new(1, 1)));
        assert!(map.tile(Position::new(1, 1)).contains(id));
        assert!(!map.place(id, Position::new(5, 5)));
        assert!(map.lift(id, Position::new(1, 1)));
        assert!(map.tile(Position::new(1, 1)).is_vacant());
    }
}
