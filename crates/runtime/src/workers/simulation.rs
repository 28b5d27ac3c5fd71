//! Simulation worker that owns the authoritative [`battle_core::World`].
//!
//! Four sources feed the loop: client commands, state pushes onto the top of
//! the stack, pushes beneath it, and the tick interval. Whichever is ready
//! first is handled to completion before the next one is looked at, so the
//! world is only ever mutated from this task.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use battle_core::{
    BattleView, BonusOffer, Command as WorldCommand, CommandError, SessionId, StateAction, World,
    WorldEvent,
};

use crate::api::{Notification, Result, RuntimeError};

/// Commands that can be sent to the simulation worker.
pub enum Command {
    /// Apply a world command. Rejections reach the sender's session as a
    /// bell either way; `reply` additionally reports the outcome.
    Apply {
        command: WorldCommand,
        reply: Option<oneshot::Sender<std::result::Result<(), CommandError>>>,
    },
    /// Attach a viewer's notification queue and register it as an observer.
    Listen {
        session: SessionId,
        feed: mpsc::Sender<Notification>,
        reply: oneshot::Sender<Result<()>>,
    },
    QueryView { reply: oneshot::Sender<BattleView> },
    OfferBonuses { reply: oneshot::Sender<Vec<BonusOffer>> },
}

/// Receiving ends of the worker's input queues.
pub struct WorkerChannels {
    pub commands: mpsc::Receiver<Command>,
    pub push_top: mpsc::Receiver<StateAction>,
    pub push_bottom: mpsc::Receiver<StateAction>,
}

/// Background task that drives the world.
pub struct SimulationWorker {
    world: World,
    channels: WorkerChannels,
    sessions: BTreeMap<SessionId, mpsc::Sender<Notification>>,
    event_tx: broadcast::Sender<WorldEvent>,
    busy: Arc<AtomicBool>,
    tick_interval: Duration,
}

impl SimulationWorker {
    pub fn new(
        world: World,
        channels: WorkerChannels,
        event_tx: broadcast::Sender<WorldEvent>,
        busy: Arc<AtomicBool>,
        tick_interval: Duration,
    ) -> Self {
        info!(
            target: "runtime::worker",
            seed = world.config().seed,
            autopilot = world.config().autopilot,
            tick_ms = tick_interval.as_millis() as u64,
            "SimulationWorker initialized"
        );
        busy.store(world.is_busy(), Ordering::Release);
        Self {
            world,
            channels,
            sessions: BTreeMap::new(),
            event_tx,
            busy,
            tick_interval,
        }
    }

    /// Main worker loop. Ends once every command sender is gone.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.channels.commands.recv() => {
                    let Some(cmd) = cmd else { break };
                    self.handle_command(cmd);
                    self.publish(true);
                }
                Some(state) = self.channels.push_top.recv() => {
                    trace!(target: "runtime::worker", state = state.label(), "push top");
                    self.world.push_state(state);
                    self.publish(true);
                }
                Some(state) = self.channels.push_bottom.recv() => {
                    trace!(target: "runtime::worker", state = state.label(), "push bottom");
                    self.world.push_state_bottom(state);
                    self.publish(true);
                }
                _ = ticker.tick() => {
                    let was_busy = self.world.is_busy();
                    self.world.step();
                    self.publish(was_busy);
                }
            }
        }

        info!(
            target: "runtime::worker",
            tick = self.world.tick(),
            "SimulationWorker stopped"
        );
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Apply { command, reply } => {
                let label = command.label();
                let result = self.world.apply(command);
                if let Some(reply) = reply
                    && reply.send(result).is_err()
                {
                    debug!(target: "runtime::worker", command = label, "Apply reply channel closed (caller dropped)");
                }
            }
            Command::Listen {
                session,
                feed,
                reply,
            } => {
                let result = if self.sessions.contains_key(&session) {
                    Err(RuntimeError::AlreadyListening(session))
                } else {
                    self.sessions.insert(session, feed);
                    self.world
                        .apply(WorldCommand::Listen { session })
                        .map_err(RuntimeError::from)
                };
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", %session, "Listen reply channel closed (caller dropped)");
                }
            }
            Command::QueryView { reply } => {
                if reply.send(self.world.view()).is_err() {
                    debug!(target: "runtime::worker", "QueryView reply channel closed (caller dropped)");
                }
            }
            Command::OfferBonuses { reply } => {
                let offers = self.world.offer_bonuses();
                if reply.send(offers).is_err() {
                    debug!(target: "runtime::worker", "OfferBonuses reply channel closed (caller dropped)");
                }
            }
        }
    }

    /// Drains the outbox, routes it, and refreshes the busy flag. A redraw
    /// goes out when `changed` is set or the drain produced anything.
    fn publish(&mut self, changed: bool) {
        let events = self.world.drain_events();
        self.busy.store(self.world.is_busy(), Ordering::Release);

        let redraw = changed || !events.is_empty();
        for event in events {
            self.route(&event);
            // No subscribers is normal.
            let _ = self.event_tx.send(event);
        }

        if redraw && !self.sessions.is_empty() {
            let view = Arc::new(self.world.view());
            self.notify_all(|| Notification::Redraw(Arc::clone(&view)));
        }
    }

    fn route(&mut self, event: &WorldEvent) {
        match event {
            WorldEvent::Message(text) => self.notify_all(|| Notification::Message(text.clone())),
            WorldEvent::Bell { session } => self.notify(*session, Notification::Bell),
            WorldEvent::Notice { session, text } => {
                self.notify(*session, Notification::Notice(text.clone()))
            }
            WorldEvent::Victory { level, score } => self.notify_all(|| Notification::Victory {
                level: *level,
                score: *score,
            }),
            WorldEvent::GameOver { score } => {
                self.notify_all(|| Notification::GameOver { score: *score })
            }
            WorldEvent::ObserverLeft { session } => {
                self.sessions.remove(session);
            }
            _ => {}
        }
    }

    fn notify_all(&mut self, mut make: impl FnMut() -> Notification) {
        let sessions: Vec<SessionId> = self.sessions.keys().copied().collect();
        for session in sessions {
            self.notify(session, make());
        }
    }

    fn notify(&mut self, session: SessionId, notification: Notification) {
        let Some(feed) = self.sessions.get(&session) else {
            return;
        };
        match feed.try_send(notification) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!(target: "runtime::worker", %session, "session queue full, notification dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(target: "runtime::worker", %session, "session queue closed, parting");
                self.sessions.remove(&session);
                if let Err(error) = self.world.apply(WorldCommand::Part { session }) {
                    debug!(target: "runtime::worker", %session, %error, "implicit part failed");
                }
            }
        }
    }
}
