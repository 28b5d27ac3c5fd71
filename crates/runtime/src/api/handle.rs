//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing. Commands are queued and applied
//! by the worker in arrival order; [`RuntimeHandle::send`] does not wait,
//! [`RuntimeHandle::apply`] waits for the outcome.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, mpsc, oneshot};

use battle_core::{BattleView, BonusOffer, Command as WorldCommand, SessionId, StateAction, WorldEvent};

use super::errors::{Result, RuntimeError};
use super::notification::SessionFeed;
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    push_top_tx: mpsc::Sender<StateAction>,
    push_bottom_tx: mpsc::Sender<StateAction>,
    event_tx: broadcast::Sender<WorldEvent>,
    busy: Arc<AtomicBool>,
    session_buffer_size: usize,
}

impl RuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        push_top_tx: mpsc::Sender<StateAction>,
        push_bottom_tx: mpsc::Sender<StateAction>,
        event_tx: broadcast::Sender<WorldEvent>,
        busy: Arc<AtomicBool>,
        session_buffer_size: usize,
    ) -> Self {
        Self {
            command_tx,
            push_top_tx,
            push_bottom_tx,
            event_tx,
            busy,
            session_buffer_size,
        }
    }

    async fn dispatch(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Queue a command without waiting for it to be applied.
    pub async fn send(&self, command: WorldCommand) -> Result<()> {
        self.dispatch(Command::Apply {
            command,
            reply: None,
        })
        .await
    }

    /// Queue a command and wait until the worker has applied it.
    pub async fn apply(&self, command: WorldCommand) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.dispatch(Command::Apply {
            command,
            reply: Some(reply_tx),
        })
        .await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)??;
        Ok(())
    }

    /// Push a state on top of the stack from outside the loop.
    pub async fn push_state(&self, state: StateAction) -> Result<()> {
        self.push_top_tx
            .send(state)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Push a state beneath everything currently on the stack.
    pub async fn push_state_bottom(&self, state: StateAction) -> Result<()> {
        self.push_bottom_tx
            .send(state)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Attach a viewer. The returned feed receives redraws, broadcast
    /// messages and the session's own bells and notices until it is dropped
    /// or the session parts.
    pub async fn listen(&self, session: SessionId) -> Result<SessionFeed> {
        let (feed_tx, feed_rx) = mpsc::channel(self.session_buffer_size);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.dispatch(Command::Listen {
            session,
            feed: feed_tx,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)??;
        Ok(SessionFeed::new(session, feed_rx))
    }

    /// Detach a viewer.
    pub async fn part(&self, session: SessionId) -> Result<()> {
        self.send(WorldCommand::Part { session }).await
    }

    /// Whether the world was resolving a multi-tick effect as of the last
    /// command or tick. Advisory only: the worker re-checks on apply.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Snapshot of the world as the worker sees it now.
    pub async fn query_view(&self) -> Result<BattleView> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.dispatch(Command::QueryView { reply: reply_tx }).await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Roll one post-battle bonus per roster unit.
    pub async fn offer_bonuses(&self) -> Result<Vec<BonusOffer>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.dispatch(Command::OfferBonuses { reply: reply_tx })
            .await?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Subscribe to every world event, including ones no viewer sees.
    pub fn subscribe_events(&self) -> broadcast::Receiver<WorldEvent> {
        self.event_tx.subscribe()
    }
}
