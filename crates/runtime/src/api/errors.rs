//! Unified error types surfaced by the runtime API.
use thiserror::Error;
use tokio::sync::oneshot;

use battle_core::CommandError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires content or a prepared world before building")]
    MissingContent,

    #[error("session {0} is already listening")]
    AlreadyListening(battle_core::SessionId),

    #[error("command rejected: {0}")]
    Rejected(#[from] CommandError),
}
