//! Deterministic rules for a turn-based grid-tactics battle.
//!
//! `battle-core` owns the authoritative [`World`]: maps, units, the
//! charge-time initiative queue and the state stack that spreads multi-tick
//! procedures (walking, projectiles, enemy turns) over discrete ticks. It has
//! no notion of time or transport; the runtime crate drives it by calling
//! [`World::apply`] and [`World::step`] and routing the drained
//! [`WorldEvent`]s to observers.
pub mod combat;
pub mod config;
pub mod entity;
pub mod env;
pub mod error;
pub mod grid;
pub mod state;
pub mod stats;
pub mod world;

pub use combat::{
    DamageClass, DamageSpec, DiceExpr, DiceParseError, Hitbox, OnHit, Targeting, Weapon,
    taunt_buff,
};
pub use config::BattleConfig;
pub use entity::{Capabilities, Effect, Entity, EntityKind, MicroAction, Mob, UnitTemplate};
pub use env::{BattleRng, ContentOracle, LevelSpec, SpellUnlock, StaticContent};
pub use error::{CommandError, ErrorSeverity};
pub use grid::{Map, MapParseError, RayHit, Tile};
pub use state::{Color, Direction, EntityId, Glyph, Position, ResourceMeter, SessionId, Team};
pub use stats::{
    ApplyOutcome, Armor, BaseStats, Buff, BuffSet, BuffTemplate, Lifetime, StatModifier, Stats,
    Uniqueness,
};
pub use world::{
    AiState, AttackState, BattleView, Bonus, BonusOffer, Command, ImpactFlash, MoveState,
    RosterUnit, StateAction, StateStack, UnitSummary, World, WorldEvent,
};
