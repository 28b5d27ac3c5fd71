//! Runtime orchestration for the battle simulation.
//!
//! The runtime owns the authoritative [`battle_core::World`] inside a single
//! tokio task and serializes everything that touches it: client commands,
//! state pushes from outside the loop and the fixed-rate tick. Consumers embed
//! [`Runtime`] and talk to the world through cloneable [`RuntimeHandle`]s.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - `workers` keeps the simulation task internal to the crate
pub mod api;
pub mod runtime;

mod workers;

pub use api::{Notification, Result, RuntimeError, RuntimeHandle, SessionFeed};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
