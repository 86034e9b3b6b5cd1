use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{Device, DeviceId};

/// Source of device records, and with them the keys replies are checked
/// against.
pub trait DeviceDirectory: Send + Sync {
    fn lookup(&self, id: &DeviceId) -> Option<Device>;
}

#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    devices: RwLock<HashMap<DeviceId, Device>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a device record.
    pub fn insert(&self, device: Device) -> Option<Device> {
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(device.id, device)
    }

    pub fn remove(&self, id: &DeviceId) -> Option<Device> {
        self.devices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }
}

impl DeviceDirectory for InMemoryDirectory {
    fn lookup(&self, id: &DeviceId) -> Option<Device> {
        self.devices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

impl FromIterator<Device> for InMemoryDirectory {
    fn from_iter<I: IntoIterator<Item = Device>>(iter: I) -> Self {
        let devices = iter.into_iter().map(|d| (d.id, d)).collect();
        Self {
            devices: RwLock::new(devices),
        }
    }
}
