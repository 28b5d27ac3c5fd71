//! Level sequence loader.
//!
//! `levels.ron` holds a bestiary of enemy units keyed by name and the
//! ordered list of battles. Each battle names its map and lists enemies by
//! bestiary key, in spawn order.

use std::collections::BTreeMap;
use std::path::Path;

use battle_core::{LevelSpec, UnitTemplate};
use serde::Deserialize;

use crate::loaders::{LoadResult, SpellBook, UnitSpec, read_file};

#[derive(Debug, Deserialize)]
struct CampaignRon {
    bestiary: BTreeMap<String, UnitSpec>,
    levels: Vec<LevelRon>,
}

#[derive(Debug, Deserialize)]
struct LevelRon {
    map: String,
    enemies: Vec<String>,
}

/// Resolved level sequence.
#[derive(Clone, Debug, Default)]
pub struct Campaign {
    pub levels: Vec<LevelSpec>,
}

impl Campaign {
    /// Distinct map names referenced by any level.
    pub fn map_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.levels.iter().map(|l| l.map.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Loader for the level sequence.
pub struct CampaignLoader;

impl CampaignLoader {
    pub fn load(path: &Path, spells: &SpellBook) -> LoadResult<Campaign> {
        let content = read_file(path)?;
        Self::parse(&content, spells).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
    }

    pub fn parse(content: &str, spells: &SpellBook) -> LoadResult<Campaign> {
        let raw: CampaignRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse campaign RON: {}", e))?;

        let mut bestiary: BTreeMap<String, UnitTemplate> = BTreeMap::new();
        for (key, spec) in &raw.bestiary {
            bestiary.insert(key.clone(), spec.resolve(spells)?);
        }

        if raw.levels.is_empty() {
            anyhow::bail!("Campaign has no levels");
        }
        let mut levels = Vec::with_capacity(raw.levels.len());
        for (index, level) in raw.levels.into_iter().enumerate() {
            if level.enemies.is_empty() {
                anyhow::bail!("Level {} has no enemies", index);
            }
            let enemies = level
                .enemies
                .iter()
                .map(|key| {
                    bestiary.get(key).cloned().ok_or_else(|| {
                        anyhow::anyhow!("Level {} lists unknown enemy '{}'", index, key)
                    })
                })
                .collect::<LoadResult<Vec<_>>>()?;
            levels.push(LevelSpec {
                map: level.map,
                enemies,
            });
        }

        Ok(Campaign { levels })
    }
}
