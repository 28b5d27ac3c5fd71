//! Read-only collaborators the world consults: content tables, maps and
//! the RNG.
//!
//! The world never generates content; it asks a [`ContentOracle`] for maps,
//! team compositions and spell unlocks, and copies what it receives.
mod rng;

pub use rng::BattleRng;

use std::collections::BTreeMap;

use crate::combat::Weapon;
use crate::entity::UnitTemplate;
use crate::grid::Map;

/// One battle in the campaign.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelSpec {
    pub map: String,
    /// Enemy units, spawned in order on team 1's spawn points.
    pub enemies: Vec<UnitTemplate>,
}

/// A spell a class may learn once the campaign reaches `level`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellUnlock {
    pub level: u32,
    pub spell: Weapon,
}

/// Static content consumed by the world.
pub trait ContentOracle: Send + Sync {
    /// Every map the campaign may use, loaded once at world construction.
    fn maps(&self) -> Vec<Map>;

    fn player_team(&self) -> Vec<UnitTemplate>;

    fn level(&self, level: u32) -> Option<&LevelSpec>;

    fn level_count(&self) -> u32;

    fn class_spells(&self, class: &str) -> Vec<SpellUnlock>;
}

/// Plain-data [`ContentOracle`].
#[derive(Clone, Debug, Default)]
pub struct StaticContent {
    pub maps: Vec<Map>,
    pub player_team: Vec<UnitTemplate>,
    pub levels: Vec<LevelSpec>,
    pub class_spells: BTreeMap<String, Vec<SpellUnlock>>,
}

impl ContentOracle for StaticContent {
    fn maps(&self) -> Vec<Map> {
        self.maps.clone()
    }

    fn player_team(&self) -> Vec<UnitTemplate> {
        self.player_team.clone()
    }

    fn level(&self, level: u32) -> Option<&LevelSpec> {
        self.levels.get(level as usize)
    }

    fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    fn class_spells(&self, class: &str) -> Vec<SpellUnlock> {
        self.class_spells.get(class).cloned().unwrap_or_default()
    }
}
