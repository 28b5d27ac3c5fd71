//! Damage rolls and armor mitigation.

use super::dice::DiceExpr;
use crate::env::BattleRng;

/// How a damage roll interacts with the target's armor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageClass {
    /// Reduced by defense, never below 1 on a positive roll.
    #[default]
    Physical,
    /// Ignores defense.
    Magical,
    /// Restores hit points; the roll is applied as negative damage.
    Healing,
    /// Deals nothing; the weapon exists for its on-hit effects.
    None,
}

/// Dice formula plus damage class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageSpec {
    pub dice: DiceExpr,
    #[cfg_attr(feature = "serde", serde(default))]
    pub class: DamageClass,
}

impl DamageSpec {
    pub const fn new(dice: DiceExpr, class: DamageClass) -> Self {
        Self { dice, class }
    }

    pub const fn physical(dice: DiceExpr) -> Self {
        Self::new(dice, DamageClass::Physical)
    }

    pub const fn magical(dice: DiceExpr) -> Self {
        Self::new(dice, DamageClass::Magical)
    }

    pub const fn healing(dice: DiceExpr) -> Self {
        Self::new(dice, DamageClass::Healing)
    }

    pub fn deals_damage(&self) -> bool {
        self.class != DamageClass::None
    }

    /// Rolls the dice and returns the raw signed amount: positive harms,
    /// negative heals.
    pub fn roll(&self, rng: &mut BattleRng) -> i32 {
        let amount = self.dice.roll(rng);
        match self.class {
            DamageClass::Healing => -amount.abs(),
            DamageClass::None => 0,
            DamageClass::Physical | DamageClass::Magical => amount,
        }
    }
}

/// Applies armor to a raw amount.
///
/// Only positive, non-magical physical damage is reduced, and a positive hit
/// always deals at least 1. Healing passes through untouched.
pub fn mitigate(raw: i32, class: DamageClass, magic_source: bool, defense: i32) -> i32 {
    if raw > 0 && class == DamageClass::Physical && !magic_source {
        return (raw - defense).max(1);
    }
    raw
}
