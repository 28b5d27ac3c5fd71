//! Per-session notifications.
//!
//! Every attached viewer gets its own bounded queue. The worker feeds it with
//! `try_send`, so a viewer that stops reading loses notifications instead of
//! stalling the loop.
use std::sync::Arc;

use tokio::sync::mpsc;

use battle_core::{BattleView, SessionId};

/// What a viewer receives from the world.
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    /// Fresh frame after the world changed.
    Redraw(Arc<BattleView>),
    /// Line for the message log, sent to everyone.
    Message(String),
    /// The viewer's last command was rejected.
    Bell,
    /// Private explanation addressed to this viewer only.
    Notice(String),
    Victory { level: u32, score: i64 },
    GameOver { score: i64 },
}

/// Receiving end of one session's notification queue.
#[derive(Debug)]
pub struct SessionFeed {
    session: SessionId,
    rx: mpsc::Receiver<Notification>,
}

impl SessionFeed {
    pub(crate) fn new(session: SessionId, rx: mpsc::Receiver<Notification>) -> Self {
        Self { session, rx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Waits for the next notification. `None` once the runtime is gone.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// Everything already queued, without waiting.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(notification) = self.rx.try_recv() {
            out.push(notification);
        }
        out
    }
}
