//! Entities living on the battle map.
//!
//! Each entity is a tagged variant rather than a trait object; what an
//! entity can do is reported through [`Capabilities`], which the world
//! checks before moving, colliding, scheduling or ticking it.
mod mob;

#[cfg(test)]
pub(crate) use mob::fixtures;
pub use mob::{MicroAction, Mob, UnitTemplate};

use bitflags::bitflags;

use crate::config::BattleConfig;
use crate::state::{EntityId, Glyph, Position};

bitflags! {
    /// Hooks an entity exposes to the world loop.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const MOVABLE = 1 << 0;
        const COLLIDABLE = 1 << 1;
        const TURN_TAKING = 1 << 2;
        const TICKABLE = 1 << 3;
    }
}

/// Transient visual entity (projectile trail, impact flash) that counts
/// down and deletes itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Effect {
    /// Ticks left; `None` lives until removed explicitly.
    pub life: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    Mob(Box<Mob>),
    Effect(Effect),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub glyph: Glyph,
    pub position: Position,
    pub kind: EntityKind,
}

impl Entity {
    pub fn mob(id: EntityId, name: impl Into<String>, glyph: Glyph, position: Position, mob: Mob) -> Self {
        Self {
            id,
            name: name.into(),
            glyph,
            position,
            kind: EntityKind::Mob(Box::new(mob)),
        }
    }

    pub fn effect(id: EntityId, glyph: Glyph, position: Position, life: Option<u32>) -> Self {
        Self {
            id,
            name: "effect".into(),
            glyph,
            position,
            kind: EntityKind::Effect(Effect { life }),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match &self.kind {
            EntityKind::Mob(mob) if mob.is_alive() => Capabilities::all(),
            EntityKind::Mob(_) => Capabilities::TICKABLE,
            EntityKind::Effect(_) => Capabilities::MOVABLE | Capabilities::TICKABLE,
        }
    }

    pub fn has(&self, capability: Capabilities) -> bool {
        self.capabilities().contains(capability)
    }

    pub fn as_mob(&self) -> Option<&Mob> {
        match &self.kind {
            EntityKind::Mob(mob) => Some(mob),
            EntityKind::Effect(_) => None,
        }
    }

    pub fn as_mob_mut(&mut self) -> Option<&mut Mob> {
        match &mut self.kind {
            EntityKind::Mob(mob) => Some(mob),
            EntityKind::Effect(_) => None,
        }
    }

    pub fn is_living_mob(&self) -> bool {
        self.as_mob().is_some_and(Mob::is_alive)
    }

    /// Stacking order on a tile; the highest Z is drawn on top.
    pub fn z(&self) -> i32 {
        match &self.kind {
            EntityKind::Mob(mob) => mob.z(),
            EntityKind::Effect(_) => BattleConfig::Z_EFFECT,
        }
    }

    pub fn display_glyph(&self) -> Glyph {
        match &self.kind {
            EntityKind::Mob(mob) => mob.display_glyph(self.glyph),
            EntityKind::Effect(_) => self.glyph,
        }
    }

    /// One-line summary for status panels.
    pub fn status_line(&self) -> String {
        match &self.kind {
            EntityKind::Mob(mob) => {
                let title = match &mob.class {
                    Some(class) => format!("{} the {}", self.name, class),
                    None => self.name.clone(),
                };
                format!(
                    "{} (HP: {}, MP: {}, Speed: {}, CT: {})",
                    title,
                    mob.hp.current,
                    mob.mp.current,
                    mob.speed(),
                    mob.ct
                )
            }
            EntityKind::Effect(_) => self.name.clone(),
        }
    }
}
