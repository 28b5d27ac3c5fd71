//! Command rejection errors.
//!
//! A rejected command never faults the world: the handler reports one of
//! these, the world turns it into a bell (and, where useful, a notice) for
//! the session that sent it, and state is left untouched.

use thiserror::Error;

use crate::state::{EntityId, Position};

/// Severity level of an error, used for categorization and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Player input that is illegal right now but may be retried later.
    ///
    /// Examples: world busy, not your turn
    Recoverable,

    /// Input that is wrong in itself.
    ///
    /// Examples: target out of range, unknown spell
    Validation,

    /// The command referenced state that should exist but does not.
    ///
    /// Examples: unknown entity, unknown map
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("the world is busy resolving an effect")]
    Busy,

    #[error("no battle is in progress")]
    NoBattle,

    #[error("it is not {0}'s turn")]
    NotYourTurn(EntityId),

    #[error("{0} is not under player control")]
    NotPlayerControlled(EntityId),

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("{0} is not a unit")]
    NotAUnit(EntityId),

    #[error("{0} has already moved this turn")]
    AlreadyMoved(EntityId),

    #[error("{0} has already acted this turn")]
    AlreadyActed(EntityId),

    #[error("{0} has not moved this turn")]
    NotMoved(EntityId),

    #[error("{0} cannot move")]
    Immobile(EntityId),

    #[error("no path to {0}")]
    Unreachable(Position),

    #[error("path of {length} steps exceeds move range {range}")]
    TooFar { length: usize, range: u32 },

    #[error("{0} is out of range")]
    OutOfRange(Position),

    #[error("nothing to target at {0}")]
    NoTarget(Position),

    #[error("tile {0} is blocked")]
    Blocked(Position),

    #[error("unknown spell `{0}`")]
    UnknownSpell(String),

    #[error("Not enough MP to cast {0}.")]
    NotEnoughMp(String),

    #[error("unknown level {0}")]
    UnknownLevel(u32),

    #[error("unknown map `{0}`")]
    UnknownMap(String),

    #[error("no roster unit in slot {0}")]
    UnknownRosterSlot(usize),
}

impl CommandError {
    pub const fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Busy | Self::NotYourTurn(_) | Self::AlreadyMoved(_) | Self::AlreadyActed(_) => {
                ErrorSeverity::Recoverable
            }
            Self::UnknownEntity(_)
            | Self::NotAUnit(_)
            | Self::UnknownLevel(_)
            | Self::UnknownMap(_)
            | Self::UnknownRosterSlot(_) => ErrorSeverity::Internal,
            _ => ErrorSeverity::Validation,
        }
    }

    /// Text shown to the offending session alongside the bell, for the
    /// rejections a player cannot infer from the board alone.
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::NotEnoughMp(_) | Self::UnknownSpell(_) | Self::TooFar { .. } => {
                Some(self.to_string())
            }
            _ => None,
        }
    }
}
