//! Worker tasks that back the runtime orchestration.
//!
//! A single simulation worker owns the world; nothing else ever touches it.

mod simulation;

pub use simulation::{Command, SimulationWorker, WorkerChannels};
