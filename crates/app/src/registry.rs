//! Registry — the name-keyed collection of every device the hub knows.
//!
//! Built once at startup and read-only afterwards, so it is shared behind an
//! `Arc` without locking. Timer state lives inside each [`Timer`] and is
//! safe to read while a timer fires.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use blox_domain::device::{Device, DeviceSnapshot};
use blox_domain::error::{BloxError, NotFoundError, ValidationError};
use blox_domain::timer::TimerSpec;

use crate::timer::Timer;

/// Closed set of device kinds held by the registry.
#[derive(Debug)]
pub enum HubDevice {
    Basic(Device),
    Timer(Timer),
}

impl HubDevice {
    #[must_use]
    pub fn device(&self) -> &Device {
        match self {
            Self::Basic(device) => device,
            Self::Timer(timer) => timer.device(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.device().name
    }

    /// Wire representation of the most specific kind.
    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        match self {
            Self::Basic(device) => device.snapshot(),
            Self::Timer(timer) => timer.snapshot(),
        }
    }

    #[must_use]
    pub fn as_timer(&self) -> Option<&Timer> {
        match self {
            Self::Timer(timer) => Some(timer),
            Self::Basic(_) => None,
        }
    }
}

/// Name → device mapping.
#[derive(Debug, Default)]
pub struct Registry {
    devices: BTreeMap<String, HubDevice>,
}

impl Registry {
    /// Create a builder for constructing a [`Registry`].
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up a device by name.
    ///
    /// # Errors
    ///
    /// Returns [`BloxError::NotFound`] when no device is called `name`.
    pub fn get(&self, name: &str) -> Result<&HubDevice, BloxError> {
        self.devices.get(name).ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: name.to_string(),
            }
            .into()
        })
    }

    /// Snapshot of every device, serialized to its wire form.
    ///
    /// The result is owned: later timer transitions do not show up in it.
    #[must_use]
    pub fn list_all(&self) -> BTreeMap<String, DeviceSnapshot> {
        self.devices
            .iter()
            .map(|(name, device)| (name.clone(), device.snapshot()))
            .collect()
    }

    /// Every timer, in name order.
    pub fn timers(&self) -> impl Iterator<Item = &Timer> {
        self.devices.values().filter_map(HubDevice::as_timer)
    }

    /// Cancel every pending timer wait. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        self.timers().filter(|timer| timer.cancel()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Collects devices and checks name uniqueness.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    devices: Vec<HubDevice>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn device(mut self, device: Device) -> Self {
        self.devices.push(HubDevice::Basic(device));
        self
    }

    #[must_use]
    pub fn timer(mut self, device: Device, spec: TimerSpec) -> Self {
        self.devices.push(HubDevice::Timer(Timer::new(device, spec)));
        self
    }

    /// Consume the builder and return a [`Registry`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] for a nameless device or
    /// callback, and [`ValidationError::DuplicateName`] when two devices share
    /// a name.
    pub fn build(self) -> Result<Registry, BloxError> {
        let mut devices = BTreeMap::new();
        for device in self.devices {
            device.device().validate()?;
            if let Some(timer) = device.as_timer() {
                timer.spec().callback.validate()?;
            }
            match devices.entry(device.name().to_string()) {
                Entry::Occupied(entry) => {
                    return Err(ValidationError::DuplicateName(entry.key().clone()).into());
                }
                Entry::Vacant(entry) => {
                    entry.insert(device);
                }
            }
        }
        Ok(Registry { devices })
    }
}
