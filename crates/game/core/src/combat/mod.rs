//! Dice, damage classes and weapon definitions.
mod damage;
mod dice;
mod weapon;

pub use damage::{DamageClass, DamageSpec, mitigate};
pub use dice::{DiceExpr, DiceParseError};
pub use weapon::{Hitbox, OnHit, Targeting, Weapon, taunt_buff};
