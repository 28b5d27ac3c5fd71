//! Content factory for building the world's content oracle from data files.

use std::path::{Path, PathBuf};

use battle_core::{Map, StaticContent, Team, UnitTemplate};

use crate::loaders::{
    Campaign, CampaignLoader, LoadResult, MapLoader, RosterLoader, SpellBook, SpellLoader,
};

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── spells.ron
/// ├── players.ron
/// ├── levels.ron
/// └── maps/
///     ├── crossroads.ron
///     └── keep.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load the spell catalog from `spells.ron`.
    pub fn load_spells(&self) -> LoadResult<SpellBook> {
        SpellLoader::load(&self.data_dir.join("spells.ron"))
    }

    /// Load the starting roster from `players.ron`.
    pub fn load_roster(&self, spells: &SpellBook) -> LoadResult<Vec<UnitTemplate>> {
        RosterLoader::load(&self.data_dir.join("players.ron"), spells)
    }

    /// Load the level sequence from `levels.ron`.
    pub fn load_campaign(&self, spells: &SpellBook) -> LoadResult<Campaign> {
        CampaignLoader::load(&self.data_dir.join("levels.ron"), spells)
    }

    /// Load every map under `maps/`.
    pub fn load_maps(&self) -> LoadResult<Vec<Map>> {
        MapLoader::load_dir(&self.data_dir.join("maps"))
    }

    /// Load and cross-check everything the world needs.
    ///
    /// Fails when a level names a missing map or a map cannot seat the
    /// player roster. Short enemy spawn lists only warn: surplus enemies
    /// stay off the field.
    pub fn load_static(&self) -> LoadResult<StaticContent> {
        let spells = self.load_spells()?;
        let player_team = self.load_roster(&spells)?;
        let campaign = self.load_campaign(&spells)?;
        let maps = self.load_maps()?;

        for (index, level) in campaign.levels.iter().enumerate() {
            let map = maps.iter().find(|m| m.name() == level.map).ok_or_else(|| {
                anyhow::anyhow!("Level {} uses unknown map '{}'", index, level.map)
            })?;
            let seats = map.spawn_points(Team::PLAYERS).len();
            if seats < player_team.len() {
                anyhow::bail!(
                    "Map '{}' has {} player spawn points for a roster of {}",
                    map.name(),
                    seats,
                    player_team.len()
                );
            }
            let enemy_seats = map.spawn_points(Team(1)).len();
            if enemy_seats < level.enemies.len() {
                tracing::warn!(
                    level = index,
                    map = map.name(),
                    enemies = level.enemies.len(),
                    spawn_points = enemy_seats,
                    "level lists more enemies than spawn points"
                );
            }
        }

        tracing::info!(
            data_dir = %self.data_dir.display(),
            maps = maps.len(),
            levels = campaign.levels.len(),
            spells = spells.len(),
            "content loaded"
        );

        Ok(StaticContent {
            maps,
            player_team,
            levels: campaign.levels,
            class_spells: spells.into_class_spells(),
        })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
