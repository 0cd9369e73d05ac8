//! Per-device flag: telemetry for this device is simulated instead of read live.

use std::rc::Rc;

use super::cache::{CacheRead, DeviceMap, SettingsCache};
use crate::models::energy::DeviceId;
use crate::storage::KeyValueStore;

pub const SIMULATION_MODE_KEY: &str = "device_simulation_mode_v1";

pub struct SimulationModes {
    cache: SettingsCache<bool>,
}

impl SimulationModes {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        SimulationModes {
            cache: SettingsCache::new(store, SIMULATION_MODE_KEY, "simulation modes"),
        }
    }

    /// `None` means no preference was ever recorded for the device.
    pub fn get(&self, id: DeviceId) -> Option<bool> {
        self.cache.get(id)
    }

    pub fn set(&self, id: DeviceId, enabled: bool) {
        self.cache.set(id, enabled);
    }

    /// Flip the flag (unset counts as off) and return the new value.
    pub fn toggle(&self, id: DeviceId) -> bool {
        self.cache.update(id, |current| !current.unwrap_or(false))
    }

    pub fn all(&self) -> DeviceMap<bool> {
        self.cache.all()
    }

    pub fn read(&self) -> CacheRead<bool> {
        self.cache.read()
    }
}
