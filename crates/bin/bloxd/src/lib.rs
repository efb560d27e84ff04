//! Library half of the `bloxd` daemon: configuration loading and the
//! mapping from configured devices to a hub [`Registry`](blox_app::registry::Registry).
//!
//! Kept separate from `main.rs` so integration tests can build the same
//! registry the daemon serves.

pub mod config;
