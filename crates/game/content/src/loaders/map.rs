//! Map data loader.
//!
//! A map file holds the layout as text rows. Digits mark spawn points for
//! the team with that number; every other symbol is terrain.

use std::path::Path;

use battle_core::Map;
use serde::Deserialize;

use crate::loaders::{LoadResult, read_file};

/// Map data structure for RON files.
#[derive(Debug, Clone, Deserialize)]
struct MapDataRon {
    name: String,
    rows: Vec<String>,
}

/// Loader for map data from RON files.
pub struct MapLoader;

impl MapLoader {
    /// Load a single map from a RON file.
    pub fn load(path: &Path) -> LoadResult<Map> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
    }

    /// Parse a map from RON text.
    pub fn parse(content: &str) -> LoadResult<Map> {
        let data: MapDataRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse map RON: {}", e))?;
        let map = Map::from_rows(data.name, &data.rows)?;
        Ok(map)
    }

    /// Load every `*.ron` map in `dir`, ordered by file name.
    pub fn load_dir(dir: &Path) -> LoadResult<Vec<Map>> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| anyhow::anyhow!("Failed to read map directory {}: {}", dir.display(), e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "ron") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut maps: Vec<Map> = Vec::with_capacity(paths.len());
        for path in paths {
            let map = Self::load(&path)?;
            if maps.iter().any(|m| m.name() == map.name()) {
                anyhow::bail!("Duplicate map name '{}' in {}", map.name(), path.display());
            }
            maps.push(map);
        }
        Ok(maps)
    }
}
