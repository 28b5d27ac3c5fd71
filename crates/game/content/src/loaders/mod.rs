//! Content loaders for reading game data from files.
//!
//! Each loader turns one RON file into core types. [`ContentFactory`] ties
//! them together and cross-checks references between files.

pub mod campaign;
pub mod factory;
pub mod map;
pub mod roster;
pub mod spells;

pub use campaign::{Campaign, CampaignLoader};
pub use factory::ContentFactory;
pub use map::MapLoader;
pub use roster::{RosterLoader, UnitSpec};
pub use spells::{SpellBook, SpellLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
