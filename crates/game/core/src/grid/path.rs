//! Shortest-path search over the 4-connected battle grid.
//!
//! Passability is supplied by the caller as a predicate so the same search
//! serves players, the AI, and "what if I stood there" queries that ignore
//! particular occupants.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::map::Map;
use crate::state::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f_cost: u32,
    h_cost: u32,
    insertion_order: u64,
    index: usize,
}

/// A* from `from` to `to`.
///
/// Returns the steps from the (exclusive) origin to the destination, or an
/// empty path when the destination is unreachable or equal to the origin.
/// The origin itself is never tested against `blocked`, so the mover may
/// stand on it. Length limits are the caller's concern.
///
/// Ties between equally promising nodes are broken by heuristic, then by
/// insertion order, with neighbours expanded in `Direction::ALL` order. The
/// result is therefore a pure function of the grid and the predicate.
pub fn find_path(
    map: &Map,
    from: Position,
    to: Position,
    blocked: impl Fn(Position) -> bool,
) -> Vec<Position> {
    if from == to || !map.contains(from) || !map.contains(to) || blocked(to) {
        return Vec::new();
    }

    let width = map.width() as usize;
    let node_count = width * map.height() as usize;
    let index_of = |p: Position| p.y as usize * width + p.x as usize;
    let position_of = |i: usize| Position::new((i % width) as i32, (i / width) as i32);

    let start = index_of(from);
    let goal = index_of(to);
    let mut best_g = vec![u32::MAX; node_count];
    let mut parent: Vec<Option<usize>> = vec![None; node_count];
    let mut closed = vec![false; node_count];
    let mut open = BinaryHeap::new();
    let mut next_insertion = 0u64;

    best_g[start] = 0;
    let start_h = from.distance(to);
    open.push(Reverse(OpenNode {
        f_cost: start_h,
        h_cost: start_h,
        insertion_order: next_insertion,
        index: start,
    }));

    while let Some(Reverse(node)) = open.pop() {
        if closed[node.index] {
            continue;
        }
        if node.index == goal {
            return reconstruct(&parent, start, goal, position_of);
        }
        closed[node.index] = true;

        let current = position_of(node.index);
        for neighbor in current.neighbors() {
            if !map.contains(neighbor) || blocked(neighbor) {
                continue;
            }
            let neighbor_index = index_of(neighbor);
            if closed[neighbor_index] {
                continue;
            }
            let tentative_g = best_g[node.index].saturating_add(1);
            if tentative_g >= best_g[neighbor_index] {
                continue;
            }
            best_g[neighbor_index] = tentative_g;
            parent[neighbor_index] = Some(node.index);
            next_insertion += 1;
            let h_cost = neighbor.distance(to);
            open.push(Reverse(OpenNode {
                f_cost: tentative_g + h_cost,
                h_cost,
                insertion_order: next_insertion,
                index: neighbor_index,
            }));
        }
    }

    Vec::new()
}

fn reconstruct(
    parent: &[Option<usize>],
    start: usize,
    goal: usize,
    position_of: impl Fn(usize) -> Position,
) -> Vec<Position> {
    let mut path = Vec::new();
    let mut cursor = goal;
    while cursor != start {
        path.push(position_of(cursor));
        match parent[cursor] {
            Some(previous) => cursor = previous,
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

/// Shortest path ending orthogonally adjacent to `target`.
///
/// `Some(vec![])` when `from` is already adjacent, `None` when no adjacent
/// tile is reachable. Among equally short candidates the first in
/// `Direction::ALL` order around the target wins.
pub fn find_path_next_to(
    map: &Map,
    from: Position,
    target: Position,
    blocked: impl Fn(Position) -> bool,
) -> Option<Vec<Position>> {
    if from.distance(target) == 1 {
        return Some(Vec::new());
    }

    let mut best: Option<Vec<Position>> = None;
    for approach in target.neighbors() {
        let path = find_path(map, from, approach, &blocked);
        if path.is_empty() {
            continue;
        }
        if best.as_ref().is_none_or(|current| path.len() < current.len()) {
            best = Some(path);
        }
    }
    best
}
