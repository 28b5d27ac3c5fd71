//! Timed modifiers attached to units.
//!
//! Buffs are plain data. Their hooks are descriptors ([`StatModifier`],
//! periodic [`DamageSpec`], announcement templates) that the world
//! interprets, so a buff never holds a reference to its owner or source;
//! the source is an [`EntityId`] looked up when needed.

use crate::combat::DamageSpec;
use crate::env::BattleRng;
use crate::state::{Color, EntityId};

/// Policy applied when a buff with the same name is already active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Uniqueness {
    /// Any number of instances may coexist.
    #[default]
    Stackable,
    /// Reapplying is rejected while an instance is active.
    FirstWins,
    /// Reapplying removes the active instance and installs the new one.
    Replace,
}

/// Remaining duration in turns of the bearer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifetime {
    Turns(u32),
    Infinite,
}

impl Lifetime {
    pub fn is_expired(self) -> bool {
        self == Lifetime::Turns(0)
    }
}

/// Stat-modifier hook, folded into [`super::Stats`] on every recompute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatModifier {
    Speed(i32),
    MoveRange(i32),
    Defense(i32),
    MpRecovery(i32),
    /// Move range drops to zero while active.
    Cripple,
    /// The bearer may only target the buff's source.
    Taunt,
}

/// Buff definition as found in content tables; instantiated per application.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuffTemplate {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub uniqueness: Uniqueness,
    /// Inclusive turn range rolled at application; `None` never decays.
    #[cfg_attr(feature = "serde", serde(default))]
    pub turns: Option<(u32, u32)>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub break_chance: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub periodic: Option<DamageSpec>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: Vec<StatModifier>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tint: Option<Color>,
    /// Removed at the bearer's turn start once the source is dead or gone.
    #[cfg_attr(feature = "serde", serde(default))]
    pub expires_with_source: bool,
    /// Broadcast on application. `{target}` and `{source}` are substituted.
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_apply: Option<String>,
    /// Broadcast on removal, with the same substitutions.
    #[cfg_attr(feature = "serde", serde(default))]
    pub on_remove: Option<String>,
}

impl BuffTemplate {
    pub fn new(name: impl Into<String>, uniqueness: Uniqueness) -> Self {
        Self {
            name: name.into(),
            uniqueness,
            turns: None,
            break_chance: 0.0,
            periodic: None,
            modifiers: Vec::new(),
            tint: None,
            expires_with_source: false,
            on_apply: None,
            on_remove: None,
        }
    }

    #[must_use]
    pub fn lasting(mut self, min: u32, max: u32) -> Self {
        self.turns = Some((min, max));
        self
    }

    #[must_use]
    pub fn breaking(mut self, chance: f64) -> Self {
        self.break_chance = chance;
        self
    }

    #[must_use]
    pub fn periodic(mut self, spec: DamageSpec) -> Self {
        self.periodic = Some(spec);
        self
    }

    #[must_use]
    pub fn modifier(mut self, modifier: StatModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn instantiate(&self, source: Option<EntityId>, rng: &mut BattleRng) -> Buff {
        let life = match self.turns {
            Some((min, max)) => Lifetime::Turns(rng.range(min as i32, max as i32).max(0) as u32),
            None => Lifetime::Infinite,
        };
        Buff {
            name: self.name.clone(),
            uniqueness: self.uniqueness,
            life,
            break_chance: self.break_chance,
            periodic: self.periodic,
            modifiers: self.modifiers.clone(),
            tint: self.tint,
            source,
            expires_with_source: self.expires_with_source,
            on_apply: self.on_apply.clone(),
            on_remove: self.on_remove.clone(),
        }
    }
}

/// An active buff instance on a unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Buff {
    pub name: String,
    pub uniqueness: Uniqueness,
    pub life: Lifetime,
    pub break_chance: f64,
    pub periodic: Option<DamageSpec>,
    pub modifiers: Vec<StatModifier>,
    pub tint: Option<Color>,
    pub source: Option<EntityId>,
    pub expires_with_source: bool,
    pub on_apply: Option<String>,
    pub on_remove: Option<String>,
}

impl Buff {
    /// Turn-start decay: a successful break roll ends the buff outright,
    /// otherwise a finite lifetime loses one turn.
    pub fn decay(&mut self, rng: &mut BattleRng) {
        if rng.chance(self.break_chance) {
            self.life = Lifetime::Turns(0);
            return;
        }
        if let Lifetime::Turns(turns) = &mut self.life {
            *turns = turns.saturating_sub(1);
        }
    }

    pub fn is_expired(&self) -> bool {
        self.life.is_expired()
    }
}

/// Result of [`BuffSet::apply`].
#[derive(Clone, Debug, PartialEq)]
pub enum ApplyOutcome {
    Added,
    /// A first-wins buff of the same name was already active.
    Rejected,
    /// The returned instance was removed to make room.
    Replaced(Buff),
}

/// Active buffs on one unit, in application order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuffSet {
    buffs: Vec<Buff>,
}

impl BuffSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, buff: Buff) -> ApplyOutcome {
        match buff.uniqueness {
            Uniqueness::Stackable => {
                self.buffs.push(buff);
                ApplyOutcome::Added
            }
            Uniqueness::FirstWins => {
                if self.contains(&buff.name) {
                    return ApplyOutcome::Rejected;
                }
                self.buffs.push(buff);
                ApplyOutcome::Added
            }
            Uniqueness::Replace => {
                let previous = self
                    .buffs
                    .iter()
                    .position(|b| b.name == buff.name)
                    .map(|index| self.buffs.remove(index));
                self.buffs.push(buff);
                match previous {
                    Some(old) => ApplyOutcome::Replaced(old),
                    None => ApplyOutcome::Added,
                }
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.buffs.iter().any(|b| b.name == name)
    }

    pub fn count(&self, name: &str) -> usize {
        self.buffs.iter().filter(|b| b.name == name).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Buff> {
        self.buffs.iter()
    }

    pub fn len(&self) -> usize {
        self.buffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffs.is_empty()
    }

    /// Runs turn-start decay on every buff and removes the expired ones,
    /// along with any whose source `source_alive` no longer accepts.
    pub fn decay(
        &mut self,
        rng: &mut BattleRng,
        source_alive: impl Fn(EntityId) -> bool,
    ) -> Vec<Buff> {
        for buff in &mut self.buffs {
            let orphaned = buff.expires_with_source && !buff.source.is_some_and(&source_alive);
            if orphaned {
                buff.life = Lifetime::Turns(0);
            } else {
                buff.decay(rng);
            }
        }
        self.drain_expired()
    }

    pub fn drain_expired(&mut self) -> Vec<Buff> {
        let (expired, active): (Vec<Buff>, Vec<Buff>) = std::mem::take(&mut self.buffs)
            .into_iter()
            .partition(Buff::is_expired);
        self.buffs = active;
        expired
    }

    pub fn clear(&mut self) -> Vec<Buff> {
        std::mem::take(&mut self.buffs)
    }
}
