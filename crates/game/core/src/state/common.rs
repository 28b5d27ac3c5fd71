use std::fmt;

/// Unique identifier for any entity tracked by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier for an attached viewer. The transport layer assigns one per
/// connection and reuses it for every command that connection sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Side a unit fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Team(pub u8);

impl Team {
    /// The team controlled by attached viewers.
    pub const PLAYERS: Self = Self(0);

    #[inline]
    pub const fn is_player(self) -> bool {
        self.0 == Self::PLAYERS.0
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team {}", self.0)
    }
}

/// Cardinal step direction. Iteration order (`ALL`) is part of the
/// pathfinder's tie-break and must stay fixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    /// Direction of a single orthogonal step from `from` to `to`.
    pub fn between(from: Position, to: Position) -> Option<Self> {
        match (to.x - from.x, to.y - from.y) {
            (0, -1) => Some(Direction::North),
            (1, 0) => Some(Direction::East),
            (0, 1) => Some(Direction::South),
            (-1, 0) => Some(Direction::West),
            _ => None,
        }
    }

    /// Dominant axis direction pointing from `from` toward `to`.
    pub fn toward(from: Position, to: Position) -> Option<Self> {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        if dx == 0 && dy == 0 {
            return None;
        }
        if dx.abs() >= dy.abs() {
            Some(if dx > 0 { Direction::East } else { Direction::West })
        } else {
            Some(if dy > 0 { Direction::South } else { Direction::North })
        }
    }
}

/// Discrete grid position expressed in tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance; the grid is 4-connected.
    pub fn distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn step(self, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        Position::new(self.x + dx, self.y + dy)
    }

    pub fn neighbors(self) -> [Position; 4] {
        Direction::ALL.map(|d| self.step(d))
    }

    pub fn is_aligned_with(self, other: Position) -> bool {
        self.x == other.x || self.y == other.y
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Integer resource meter (hit points, mana) tracked per unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceMeter {
    pub current: i32,
    pub maximum: i32,
}

impl ResourceMeter {
    pub const fn new(current: i32, maximum: i32) -> Self {
        Self { current, maximum }
    }

    pub const fn full(maximum: i32) -> Self {
        Self::new(maximum, maximum)
    }

    /// Sets the current value, clamped to `[0, maximum]`.
    pub fn set(&mut self, value: i32) {
        self.current = value.clamp(0, self.maximum.max(0));
    }

    /// Adds `amount` (negative drains), clamped. Returns the applied delta.
    pub fn adjust(&mut self, amount: i32) -> i32 {
        let before = self.current;
        self.set(self.current.saturating_add(amount));
        self.current - before
    }

    pub fn refill(&mut self) {
        self.current = self.maximum;
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0
    }
}

impl fmt::Display for ResourceMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.maximum)
    }
}

/// Terminal palette understood by renderers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    DarkRed,
    Green,
    DarkGreen,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Gray,
}

/// One rendered cell: a character plus foreground and background colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Glyph {
    pub ch: char,
    #[cfg_attr(feature = "serde", serde(default))]
    pub fg: Color,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bg: Color,
}

impl Glyph {
    pub const BLANK: Self = Self::new(' ', Color::Default);

    pub const fn new(ch: char, fg: Color) -> Self {
        Self {
            ch,
            fg,
            bg: Color::Default,
        }
    }

    #[must_use]
    pub const fn with_bg(mut self, bg: Color) -> Self {
        self.bg = bg;
        self
    }
}

impl Default for Glyph {
    fn default() -> Self {
        Self::BLANK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_meter_clamps_both_ends() {
        let mut hp = ResourceMeter::full(10);
        assert_eq!(hp.adjust(-25), -10);
        assert!(hp.is_depleted());
        assert_eq!(hp.adjust(40), 10);
        assert_eq!(hp.current, 10);
    }

    #[test]
    fn toward_prefers_horizontal_on_ties() {
        let from = Position::new(0, 0);
        assert_eq!(Direction::toward(from, Position::new(2, 2)), Some(Direction::East));
        assert_eq!(Direction::toward(from, Position::new(0, -3)), Some(Direction::North));
        assert_eq!(Direction::toward(from, from), None);
    }
}
