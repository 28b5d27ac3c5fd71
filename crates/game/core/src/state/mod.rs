//! Plain value types shared by every layer of the simulation.
mod common;

pub use common::{
    Color, Direction, EntityId, Glyph, Position, ResourceMeter, SessionId, Team,
};
