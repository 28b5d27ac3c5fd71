//! Battle grid, occupancy and spatial queries.
mod map;
mod path;
mod ray;

pub use map::{Map, MapParseError, Tile};
pub use path::{find_path, find_path_next_to};
pub use ray::{RayHit, line, raycast};
