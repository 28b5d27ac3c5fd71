//! Line-of-fire queries.

use super::map::Map;
use crate::state::{EntityId, Position};

/// Outcome of walking a line across the grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RayHit {
    /// First living occupant met along the line.
    pub target: Option<EntityId>,
    /// Terrain or an earlier occupant interrupted the line before `to`.
    pub blocked: bool,
    /// Tiles traversed, origin excluded, ending where the walk stopped.
    pub path: Vec<Position>,
}

/// Bresenham line from `from` (exclusive) to `to` (inclusive).
pub fn line(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);
    let mut points = Vec::with_capacity(dx.max(-dy) as usize);

    while (x, y) != (to.x, to.y) {
        let doubled = 2 * err;
        if doubled >= dy {
            err += dy;
            x += sx;
        }
        if doubled <= dx {
            err += dx;
            y += sy;
        }
        points.push(Position::new(x, y));
    }
    points
}

/// Walks the line from `from` to `to`.
///
/// Without `ignore_obstacles` the walk stops at the first colliding tile
/// (marking the ray blocked) or at the first occupant reported by
/// `occupant`; an occupant that is not standing on `to` also counts as a
/// block. With `ignore_obstacles` the walk always reaches `to`, records the
/// first occupant met, and is never blocked.
pub fn raycast(
    map: &Map,
    from: Position,
    to: Position,
    ignore_obstacles: bool,
    occupant: impl Fn(Position) -> Option<EntityId>,
) -> RayHit {
    let mut hit = RayHit::default();
    for point in line(from, to) {
        hit.path.push(point);
        if ignore_obstacles {
            if hit.target.is_none() {
                hit.target = occupant(point);
            }
            continue;
        }
        if map.tile(point).collides {
            hit.blocked = true;
            break;
        }
        if let Some(id) = occupant(point) {
            hit.target = Some(id);
            hit.blocked = point != to;
            break;
        }
    }
    hit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_excludes_origin_and_reaches_destination() {
        let points = line(Position::new(0, 0), Position::new(4, 2));
        assert_eq!(points.len(), 4);
        assert_eq!(points.last(), Some(&Position::new(4, 2)));
        assert!(!points.contains(&Position::new(0, 0)));
        assert!(line(Position::new(3, 3), Position::new(3, 3)).is_empty());
    }

    #[test]
    fn straight_lines_step_one_tile_at_a_time() {
        let points = line(Position::new(2, 5), Position::new(2, 1));
        assert_eq!(
            points,
            vec![
                Position::new(2, 4),
                Position::new(2, 3),
                Position::new(2, 2),
                Position::new(2, 1)
            ]
        );
    }

    #[test]
    fn walls_block_unless_ignored() {
        let map = Map::from_rows("wall", &["..#.."]).unwrap();
        let from = Position::new(0, 0);
        let to = Position::new(4, 0);
        let target = EntityId(9);
        let at_end = |p: Position| (p == to).then_some(target);

        let blocked = raycast(&map, from, to, false, at_end);
        assert!(blocked.blocked);
        assert_eq!(blocked.target, None);
        assert_eq!(blocked.path.last(), Some(&Position::new(2, 0)));

        let through = raycast(&map, from, to, true, at_end);
        assert!(!through.blocked);
        assert_eq!(through.target, Some(target));
        assert_eq!(through.path.len(), 4);
    }

    #[test]
    fn an_occupant_in_front_of_the_target_blocks() {
        let map = Map::new("open", 6, 1);
        let to = Position::new(5, 0);
        let occupant = |p: Position| match p.x {
            2 => Some(EntityId(1)),
            5 => Some(EntityId(2)),
            _ => None,
        };
        let hit = raycast(&map, Position::new(0, 0), to, false, occupant);
        assert!(hit.blocked);
        assert_eq!(hit.target, Some(EntityId(1)));
    }
}
