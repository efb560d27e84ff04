//! # blox-adapter-ws-axum
//!
//! WebSocket adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Upgrade `GET /wss/` (and `GET /ws`) to a WebSocket and hand the
//!   connection to the [`Hub`](blox_app::hub::Hub) (driving adapter)
//! - Pump each client's outbound queue into its socket from a dedicated
//!   writer task
//! - Serve `GET /health` as a small JSON status document
//!
//! ## Dependency rule
//! Depends on `blox-app` (for the hub) and `blox-domain` (for error types).
//! Never leaks axum types into the domain.

pub mod router;
pub mod state;
pub mod ws;
