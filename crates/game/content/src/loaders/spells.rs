//! Spell catalog loader.
//!
//! `spells.ron` defines every spell once and lists, per class, which spells
//! a unit of that class may learn and from which campaign level.

use std::collections::BTreeMap;
use std::path::Path;

use battle_core::{SpellUnlock, Weapon};
use serde::Deserialize;

use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Deserialize)]
struct SpellBookRon {
    spells: Vec<Weapon>,
    #[serde(default)]
    classes: BTreeMap<String, Vec<UnlockRon>>,
}

#[derive(Debug, Deserialize)]
struct UnlockRon {
    #[serde(default)]
    level: u32,
    spell: String,
}

/// Spells by name plus the class progressions built from them.
#[derive(Clone, Debug, Default)]
pub struct SpellBook {
    spells: BTreeMap<String, Weapon>,
    class_spells: BTreeMap<String, Vec<SpellUnlock>>,
}

impl SpellBook {
    pub fn get(&self, name: &str) -> Option<&Weapon> {
        self.spells.get(name)
    }

    pub fn len(&self) -> usize {
        self.spells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }

    /// Looks up every name, failing on the first unknown one.
    pub fn resolve(&self, names: &[String]) -> LoadResult<Vec<Weapon>> {
        names
            .iter()
            .map(|name| {
                self.get(name)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("Unknown spell '{}'", name))
            })
            .collect()
    }

    pub fn class_spells(&self) -> &BTreeMap<String, Vec<SpellUnlock>> {
        &self.class_spells
    }

    pub fn into_class_spells(self) -> BTreeMap<String, Vec<SpellUnlock>> {
        self.class_spells
    }
}

/// Loader for the spell catalog.
pub struct SpellLoader;

impl SpellLoader {
    pub fn load(path: &Path) -> LoadResult<SpellBook> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<SpellBook> {
        let raw: SpellBookRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse spell catalog RON: {}", e))?;

        let mut spells = BTreeMap::new();
        for spell in raw.spells {
            let name = spell.name.clone();
            if spells.insert(name.clone(), spell).is_some() {
                anyhow::bail!("Spell '{}' is defined twice", name);
            }
        }

        let mut class_spells = BTreeMap::new();
        for (class, unlocks) in raw.classes {
            let mut resolved = Vec::with_capacity(unlocks.len());
            for unlock in unlocks {
                let spell = spells.get(&unlock.spell).cloned().ok_or_else(|| {
                    anyhow::anyhow!("Class '{}' unlocks unknown spell '{}'", class, unlock.spell)
                })?;
                resolved.push(SpellUnlock {
                    level: unlock.level,
                    spell,
                });
            }
            class_spells.insert(class, resolved);
        }

        Ok(SpellBook {
            spells,
            class_spells,
        })
    }
}
