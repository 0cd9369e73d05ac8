//! Per-device warning/danger power levels used for client-side alerting.

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use super::cache::{CacheRead, DeviceMap, SettingsCache};
use crate::models::energy::DeviceId;
use crate::storage::KeyValueStore;

pub const THRESHOLDS_KEY: &str = "device_thresholds_v1";

/// Power levels in watts.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceThresholds {
    pub warning: f64,
    pub danger: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerLevel {
    Normal,
    Warning,
    Danger,
}

impl DeviceThresholds {
    /// Both levels must be finite and `warning <= danger`.
    pub fn new(warning: f64, danger: f64) -> Result<Self, String> {
        let t = DeviceThresholds { warning, danger };
        t.validate()?;
        Ok(t)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.warning.is_finite() {
            return Err(format!("warning level must be a finite number, got {}", self.warning));
        }
        if !self.danger.is_finite() {
            return Err(format!("danger level must be a finite number, got {}", self.danger));
        }
        if self.warning > self.danger {
            return Err(format!(
                "warning ({}) must not exceed danger ({})",
                self.warning, self.danger
            ));
        }
        Ok(())
    }

    /// Both bounds are inclusive; danger takes precedence.
    pub fn classify(&self, power: f64) -> PowerLevel {
        if power >= self.danger {
            PowerLevel::Danger
        } else if power >= self.warning {
            PowerLevel::Warning
        } else {
            PowerLevel::Normal
        }
    }
}

pub struct Thresholds {
    cache: SettingsCache<DeviceThresholds>,
}

impl Thresholds {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Thresholds {
            cache: SettingsCache::new(store, THRESHOLDS_KEY, "thresholds"),
        }
    }

    /// `None` means no thresholds were configured for the device.
    pub fn get(&self, id: DeviceId) -> Option<DeviceThresholds> {
        self.cache.get(id)
    }

    /// Rejected values leave the stored entry untouched.
    pub fn set(&self, id: DeviceId, thresholds: DeviceThresholds) -> Result<(), String> {
        thresholds.validate()?;
        self.cache.set(id, thresholds);
        Ok(())
    }

    pub fn remove(&self, id: DeviceId) {
        self.cache.remove(id);
    }

    pub fn all(&self) -> DeviceMap<DeviceThresholds> {
        self.cache.all()
    }

    pub fn read(&self) -> CacheRead<DeviceThresholds> {
        self.cache.read()
    }
}
