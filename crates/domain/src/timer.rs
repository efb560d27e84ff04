//! Timer — static description of a device that fires an action after a delay.
//!
//! The scheduling itself lives in the application layer; this module only
//! holds what is known at load time and the state vocabulary.

use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use crate::action::Action;
use crate::device::TimerFields;
use crate::error::ValidationError;

/// Non-negative delay, configured and reported in seconds.
///
/// Fractions are allowed. Whole values serialize as JSON integers, others as
/// floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "f64")]
pub struct Timeout(Duration);

impl Timeout {
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimeout`] for negative, NaN,
    /// infinite or out-of-range values.
    pub fn from_secs_f64(secs: f64) -> Result<Self, ValidationError> {
        Duration::try_from_secs_f64(secs)
            .map(Self)
            .map_err(|_| ValidationError::InvalidTimeout(secs.to_string()))
    }

    #[must_use]
    pub fn duration(self) -> Duration {
        self.0
    }

    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0.as_secs_f64()
    }
}

impl TryFrom<f64> for Timeout {
    type Error = ValidationError;

    fn try_from(secs: f64) -> Result<Self, Self::Error> {
        Self::from_secs_f64(secs)
    }
}

impl Serialize for Timeout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.subsec_nanos() == 0 {
            serializer.serialize_u64(self.0.as_secs())
        } else {
            serializer.serialize_f64(self.0.as_secs_f64())
        }
    }
}

impl std::fmt::Display for Timeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0.as_secs_f64())
    }
}

/// Delay and callback of a timer device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSpec {
    /// How long to wait once activated.
    pub timeout: Timeout,
    /// Action executed when the wait elapses.
    pub callback: Action,
}

impl TimerSpec {
    #[must_use]
    pub fn new(timeout: Timeout, callback: Action) -> Self {
        Self { timeout, callback }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout.duration()
    }

    /// Timer-specific wire fields for the given state.
    #[must_use]
    pub fn fields(&self, state: TimerState) -> TimerFields {
        TimerFields {
            timeout: self.timeout,
            callback: self.callback.name().to_string(),
            active: u8::from(state == TimerState::Pending),
        }
    }
}

/// Where a timer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    /// No wait is scheduled.
    Inactive,
    /// A wait is scheduled, or its callback is still running.
    Pending,
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => f.write_str("inactive"),
            Self::Pending => f.write_str("pending"),
        }
    }
}
