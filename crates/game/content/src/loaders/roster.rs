//! Unit definitions and the starting player roster.
//!
//! Units name their spells instead of repeating the definitions; names are
//! resolved against the [`SpellBook`] at load time.

use std::path::Path;

use battle_core::{Armor, Glyph, UnitTemplate, Weapon};
use serde::Deserialize;

use crate::loaders::{LoadResult, SpellBook, read_file};

/// A unit as written in content files.
#[derive(Clone, Debug, Deserialize)]
pub struct UnitSpec {
    pub name: String,
    #[serde(default)]
    pub class: Option<String>,
    pub glyph: Glyph,
    pub hp: i32,
    #[serde(default)]
    pub mp: i32,
    pub speed: i32,
    pub move_range: i32,
    #[serde(default)]
    pub armor: Armor,
    pub weapon: Weapon,
    #[serde(default)]
    pub spells: Vec<String>,
}

impl UnitSpec {
    pub fn resolve(&self, spells: &SpellBook) -> LoadResult<UnitTemplate> {
        let known = spells
            .resolve(&self.spells)
            .map_err(|e| anyhow::anyhow!("Unit '{}': {}", self.name, e))?;
        if self.hp <= 0 {
            anyhow::bail!("Unit '{}' must have positive hp", self.name);
        }
        Ok(UnitTemplate {
            name: self.name.clone(),
            class: self.class.clone(),
            glyph: self.glyph,
            hp: self.hp,
            mp: self.mp,
            speed: self.speed,
            move_range: self.move_range,
            armor: self.armor.clone(),
            weapon: self.weapon.clone(),
            spells: known,
        })
    }
}

/// Loader for `players.ron`: the list of units the campaign starts with.
pub struct RosterLoader;

impl RosterLoader {
    pub fn load(path: &Path, spells: &SpellBook) -> LoadResult<Vec<UnitTemplate>> {
        let content = read_file(path)?;
        Self::parse(&content, spells).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
    }

    pub fn parse(content: &str, spells: &SpellBook) -> LoadResult<Vec<UnitTemplate>> {
        let units: Vec<UnitSpec> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse roster RON: {}", e))?;
        if units.is_empty() {
            anyhow::bail!("Player roster is empty");
        }
        units.iter().map(|unit| unit.resolve(spells)).collect()
    }
}
