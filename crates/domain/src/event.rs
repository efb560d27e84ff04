//! Event — an immutable record of a timer changing state.
//!
//! Events are published on the in-process bus by the timer firing path and
//! turned into unsolicited client notifications by the hub.

use serde::{Deserialize, Serialize};

use crate::id::EventId;
use crate::time::{Timestamp, now};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A timer started waiting.
    TimerActivated,
    /// A timer's wait elapsed and its callback finished (successfully or not).
    TimerElapsed,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimerActivated => f.write_str("timer_activated"),
            Self::TimerElapsed => f.write_str("timer_elapsed"),
        }
    }
}

/// A state change of a named device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub kind: EventKind,
    /// Name of the device the event is about.
    pub device: String,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create an event stamped with the current time.
    #[must_use]
    pub fn new(kind: EventKind, device: impl Into<String>) -> Self {
        Self {
            id: EventId::new(),
            kind,
            device: device.into(),
            timestamp: now(),
        }
    }
}
