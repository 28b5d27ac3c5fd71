//! High-level runtime orchestrator.
//!
//! The runtime owns the simulation worker, wires up its channels, and exposes
//! a builder-based API for clients to drive the battle.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use battle_core::{BattleConfig, ContentOracle, StateAction, World, WorldEvent};

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::workers::{Command, SimulationWorker, WorkerChannels};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Rules configuration handed to the world. Its `seed` is replaced by
    /// [`RuntimeConfig::seed`].
    pub battle: BattleConfig,
    /// Fixed RNG seed; `None` draws one at build time.
    pub seed: Option<u64>,
    pub tick_interval: Duration,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    pub push_buffer_size: usize,
    pub session_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            battle: BattleConfig::default(),
            seed: None,
            tick_interval: Duration::from_millis(40),
            event_buffer_size: 100,
            command_buffer_size: 32,
            push_buffer_size: 32,
            session_buffer_size: 64,
        }
    }
}

/// Main runtime that owns the simulation worker.
///
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    sim_worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Subscribe to world events
    pub fn subscribe_events(&self) -> broadcast::Receiver<WorldEvent> {
        self.handle.subscribe_events()
    }

    /// Shutdown the runtime gracefully.
    ///
    /// The worker stops once this and every cloned handle are dropped.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.sim_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    content: Option<Box<dyn ContentOracle>>,
    world: Option<World>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            content: None,
            world: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Content the world is built from.
    pub fn content(mut self, content: impl ContentOracle + 'static) -> Self {
        self.content = Some(Box::new(content));
        self
    }

    /// Run an already prepared world instead of building one from content.
    /// Seed and autopilot settings then come from the world itself.
    pub fn world(mut self, world: World) -> Self {
        self.world = Some(world);
        self
    }

    /// Build the runtime and start the worker on the current tokio runtime.
    pub fn build(self) -> Result<Runtime> {
        let config = self.config;
        let world = match (self.world, self.content) {
            (Some(world), _) => world,
            (None, Some(content)) => {
                let seed = config.seed.unwrap_or_else(rand::random);
                let battle = BattleConfig {
                    seed,
                    ..config.battle.clone()
                };
                World::new(battle, content)
            }
            (None, None) => return Err(RuntimeError::MissingContent),
        };

        let (command_tx, command_rx) = mpsc::channel::<Command>(config.command_buffer_size);
        let (push_top_tx, push_top_rx) = mpsc::channel::<StateAction>(config.push_buffer_size);
        let (push_bottom_tx, push_bottom_rx) =
            mpsc::channel::<StateAction>(config.push_buffer_size);
        let (event_tx, _event_rx) = broadcast::channel::<WorldEvent>(config.event_buffer_size);
        let busy = Arc::new(AtomicBool::new(false));

        let handle = RuntimeHandle::new(
            command_tx,
            push_top_tx,
            push_bottom_tx,
            event_tx.clone(),
            Arc::clone(&busy),
            config.session_buffer_size,
        );

        let sim_worker = SimulationWorker::new(
            world,
            WorkerChannels {
                commands: command_rx,
                push_top: push_top_rx,
                push_bottom: push_bottom_rx,
            },
            event_tx,
            busy,
            config.tick_interval,
        );

        let sim_worker_handle = tokio::spawn(async move {
            sim_worker.run().await;
        });

        Ok(Runtime {
            handle,
            sim_worker_handle,
        })
    }
}
