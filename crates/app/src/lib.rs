//! # blox-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Interpreter` — run a script program in an external process
//!   - `EventPublisher` — publish timer events
//! - Run actions through an interpreter (`ActionExecutor`)
//! - Drive the timer state machine (`Timer`)
//! - Own the device `Registry` and the connection `Hub` that dispatches
//!   client requests to handlers
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `blox-domain` only (plus `tokio` for tasks, timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod action_executor;
pub mod event_bus;
pub mod handlers;
pub mod hub;
pub mod ports;
pub mod registry;
pub mod timer;
