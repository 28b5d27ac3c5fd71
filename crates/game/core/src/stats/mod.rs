//! Buffs and the effective-stats snapshot they fold into.
mod buff;
mod snapshot;

pub use buff::{ApplyOutcome, Buff, BuffSet, BuffTemplate, Lifetime, StatModifier, Uniqueness};
pub use snapshot::{Armor, BaseStats, Stats};
