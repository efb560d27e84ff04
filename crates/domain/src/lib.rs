//! # blox-domain
//!
//! Pure domain model for the blox home automation hub.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Actions** (named script snippets run by an external interpreter)
//! - Define **Devices** (named, labelled things tracked by the hub)
//! - Define **Timers** (devices that fire an action after a delay)
//! - Define the **wire envelopes** exchanged with connected clients
//! - Define **Events** (timer state-change records)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod device;
pub mod event;
pub mod message;
pub mod timer;
