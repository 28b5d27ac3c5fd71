//! Data-driven content definitions and loaders.
//!
//! This crate reads the campaign from RON files and hands it to the world as
//! a [`battle_core::StaticContent`]:
//! - Map layouts (`maps/*.ron`, one map per file)
//! - Spell catalog and class spell progressions (`spells.ron`)
//! - The starting player roster (`players.ron`)
//! - Enemy bestiary and the level sequence (`levels.ron`)
//!
//! Content is validated at load time. A dangling map or spell reference is a
//! load error, never a runtime surprise.

pub mod loaders;

pub use loaders::{
    Campaign, CampaignLoader, ContentFactory, LoadResult, MapLoader, RosterLoader, SpellBook,
    SpellLoader, UnitSpec,
};

use std::path::PathBuf;

/// Directory holding the campaign shipped with this crate.
pub fn bundled_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}
