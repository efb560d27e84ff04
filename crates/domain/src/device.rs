//! Device — a named, labelled thing tracked by the hub.
//!
//! Devices are loaded once at startup and never change afterwards. Richer
//! device kinds (see [`crate::timer`]) embed a [`Device`] for their identity
//! and extend its wire representation through [`DeviceSnapshot`].

use serde::{Deserialize, Serialize};

use crate::error::{BloxError, ValidationError};
use crate::timer::Timeout;

/// Identity and label shared by every device kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Registry key, unique for the lifetime of the process.
    pub name: String,
    /// Free-text label shown to users.
    pub display_name: String,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BloxError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), BloxError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    /// Wire representation of a plain device.
    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            timer: None,
        }
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    name: Option<String>,
    display_name: Option<String>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// A missing display name falls back to the device name.
    ///
    /// # Errors
    ///
    /// Returns [`BloxError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Device, BloxError> {
        let name = self.name.unwrap_or_default();
        let device = Device {
            display_name: self.display_name.unwrap_or_else(|| name.clone()),
            name,
        };
        device.validate()?;
        Ok(device)
    }
}

/// Structured representation of a device as it appears in outbound messages.
///
/// Timers add their fields through [`TimerFields`]; plain devices leave
/// them out entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    pub name: String,
    pub display_name: String,
    #[serde(flatten)]
    pub timer: Option<TimerFields>,
}

/// Timer-specific part of a [`DeviceSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerFields {
    /// Delay in seconds.
    pub timeout: Timeout,
    /// Name of the callback action.
    pub callback: String,
    /// `1` while a wait is pending, `0` otherwise.
    pub active: u8,
}
