use crate::state::{EntityId, SessionId};

/// Observable outcome of a command or tick, collected in the world outbox
/// and drained by whoever drives the loop.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WorldEvent {
    /// Broadcast line for every observer's message log.
    Message(String),
    /// Audible rejection for one session.
    Bell { session: SessionId },
    /// Private explanatory text for one session.
    Notice { session: SessionId, text: String },
    ObserverJoined { session: SessionId },
    ObserverLeft { session: SessionId },
    BattleStarted { level: u32, map: String },
    TurnStarted { entity: EntityId, turn: u64 },
    BuffApplied { entity: EntityId, name: String },
    BuffRemoved { entity: EntityId, name: String },
    UnitDied { entity: EntityId },
    Victory { level: u32, score: i64 },
    GameOver { score: i64 },
}

impl WorldEvent {
    /// The single session this event is addressed to, if it is private.
    pub fn recipient(&self) -> Option<SessionId> {
        match self {
            WorldEvent::Bell { session } | WorldEvent::Notice { session, .. } => Some(*session),
            _ => None,
        }
    }
}
