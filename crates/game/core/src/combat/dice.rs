use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::env::BattleRng;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DiceParseError {
    #[error("empty dice expression")]
    Empty,

    #[error("invalid number `{0}` in dice expression")]
    InvalidNumber(String),

    #[error("dice expression `{0}` needs at least one side")]
    NoSides(String),
}

/// Dice formula of the form `NdS`, `NdS+K`, `NdS-K` or a bare constant `K`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct DiceExpr {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceExpr {
    pub const ZERO: Self = Self::constant(0);

    pub const fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    pub const fn constant(value: i32) -> Self {
        Self::new(0, 0, value)
    }

    pub fn roll(&self, rng: &mut BattleRng) -> i32 {
        let dice: i32 = (0..self.count)
            .map(|_| rng.roll_die(self.sides) as i32)
            .sum();
        dice + self.modifier
    }

    pub fn min(&self) -> i32 {
        self.count as i32 + self.modifier
    }

    pub fn max(&self) -> i32 {
        (self.count * self.sides) as i32 + self.modifier
    }
}

impl FromStr for DiceExpr {
    type Err = DiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if text.is_empty() {
            return Err(DiceParseError::Empty);
        }
        let number = |part: &str| -> Result<i64, DiceParseError> {
            part.parse::<i64>()
                .map_err(|_| DiceParseError::InvalidNumber(part.to_string()))
        };

        let Some((count, rest)) = text.split_once(['d', 'D']) else {
            return Ok(Self::constant(number(&text)? as i32));
        };

        let count = if count.is_empty() { 1 } else { number(count)? };
        let (sides, modifier) = match rest.find(['+', '-']) {
            Some(at) => (&rest[..at], number(&rest[at..])?),
            None => (rest, 0),
        };
        let sides = number(sides)?;
        if sides <= 0 || count < 0 {
            return Err(DiceParseError::NoSides(s.to_string()));
        }
        Ok(Self::new(count as u32, sides as u32, modifier as i32))
    }
}

impl TryFrom<String> for DiceExpr {
    type Error = DiceParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiceExpr> for String {
    fn from(value: DiceExpr) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "{}", self.modifier);
        }
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.modifier {
            0 => Ok(()),
            m if m > 0 => write!(f, "+{m}"),
            m => write!(f, "{m}"),
        }
    }
}
