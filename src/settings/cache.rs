//! Per-device preference maps stored as one JSON object under a single storage key.
//!
//! Reads never fail: a missing, unreadable or corrupt blob is reported as
//! [`CacheRead::Recovered`], logged, and treated as an empty map. Entries are decoded
//! one at a time, so a single malformed entry reads as absent without hiding its
//! neighbours, and writes carry every other entry back verbatim. Writes rewrite the
//! whole blob (last writer wins) and only log on failure.

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::models::energy::DeviceId;
use crate::storage::KeyValueStore;

/// Device id (decimal string) to value.
pub type DeviceMap<V> = BTreeMap<String, V>;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheRead<V> {
    /// The stored map, or an empty one when nothing was stored yet.
    Loaded(DeviceMap<V>),
    /// Storage or parsing failed; callers proceed with an empty map.
    Recovered { cause: String },
}

impl<V> CacheRead<V> {
    pub fn into_map(self) -> DeviceMap<V> {
        match self {
            CacheRead::Loaded(map) => map,
            CacheRead::Recovered { .. } => DeviceMap::new(),
        }
    }
}

pub(crate) fn device_key(id: DeviceId) -> String {
    id.0.to_string()
}

pub struct SettingsCache<V> {
    store: Rc<dyn KeyValueStore>,
    key: &'static str,
    label: &'static str,
    _value: std::marker::PhantomData<V>,
}

impl<V: Serialize + DeserializeOwned + Clone> SettingsCache<V> {
    pub fn new(store: Rc<dyn KeyValueStore>, key: &'static str, label: &'static str) -> Self {
        SettingsCache {
            store,
            key,
            label,
            _value: std::marker::PhantomData,
        }
    }

    /// The stored object with entries left undecoded.
    fn read_raw(&self) -> CacheRead<Value> {
        let raw = match self.store.get_item(self.key) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return CacheRead::Loaded(DeviceMap::new()),
            Err(e) => return self.recovered(format!("storage read failed: {}", e)),
        };
        match serde_json::from_str::<DeviceMap<Value>>(&raw) {
            Ok(map) => CacheRead::Loaded(map),
            Err(e) => self.recovered(format!("stored {} are not a JSON object: {}", self.label, e)),
        }
    }

    fn recovered<T>(&self, cause: String) -> CacheRead<T> {
        warn!("Failed to load {} from '{}': {}", self.label, self.key, cause);
        CacheRead::Recovered { cause }
    }

    fn decode_entry(&self, device: &str, value: &Value) -> Option<V> {
        match serde_json::from_value::<V>(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Ignoring unreadable {} entry for device {} in '{}': {}", self.label, device, self.key, e);
                None
            }
        }
    }

    /// Every entry that decodes; malformed entries are skipped.
    pub fn read(&self) -> CacheRead<V> {
        match self.read_raw() {
            CacheRead::Loaded(raw) => CacheRead::Loaded(
                raw.iter()
                    .filter_map(|(device, value)| self.decode_entry(device, value).map(|v| (device.clone(), v)))
                    .collect(),
            ),
            CacheRead::Recovered { cause } => CacheRead::Recovered { cause },
        }
    }

    pub fn all(&self) -> DeviceMap<V> {
        self.read().into_map()
    }

    pub fn get(&self, id: DeviceId) -> Option<V> {
        let raw = self.read_raw().into_map();
        let key = device_key(id);
        raw.get(&key).and_then(|value| self.decode_entry(&key, value))
    }

    pub fn set(&self, id: DeviceId, value: V) {
        self.update(id, |_| value);
    }

    /// Apply `f` to the current entry (None when unset or unreadable) and store what it
    /// returns. Other entries are written back as they were read.
    pub fn update<F: FnOnce(Option<V>) -> V>(&self, id: DeviceId, f: F) -> V {
        let mut raw = self.read_raw().into_map();
        let key = device_key(id);
        let current = raw.get(&key).and_then(|value| self.decode_entry(&key, value));
        let next = f(current);
        match serde_json::to_value(&next) {
            Ok(encoded) => {
                raw.insert(key, encoded);
                self.save(&raw);
            }
            Err(e) => warn!("Failed to encode {} for device {}: {}", self.label, key, e),
        }
        next
    }

    pub fn remove(&self, id: DeviceId) {
        let mut raw = self.read_raw().into_map();
        if raw.remove(&device_key(id)).is_some() {
            self.save(&raw);
        }
    }

    fn save(&self, map: &DeviceMap<Value>) {
        let result = serde_json::to_string(map)
            .map_err(|e| e.to_string())
            .and_then(|raw| self.store.set_item(self.key, &raw).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!("Failed to save {} to '{}': {}", self.label, self.key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::storage::testing::BrokenStore;

    fn cache(store: Rc<dyn KeyValueStore>) -> SettingsCache<u32> {
        SettingsCache::new(store, "numbers_v1", "numbers")
    }

    #[test]
    fn absent_blob_loads_as_empty() {
        let c = cache(Rc::new(MemoryStore::new()));
        assert_eq!(c.read(), CacheRead::Loaded(DeviceMap::new()));
    }

    #[test]
    fn corrupt_blob_is_recovered_not_raised() {
        let store = Rc::new(MemoryStore::new());
        store.set_item("numbers_v1", "{not json").unwrap();
        let c = cache(store);
        assert!(matches!(c.read(), CacheRead::Recovered { .. }));
        assert!(c.all().is_empty());
        assert_eq!(c.get(DeviceId(1)), None);
    }

    #[test]
    fn non_object_blob_is_recovered() {
        let store = Rc::new(MemoryStore::new());
        store.set_item("numbers_v1", "[1, 2, 3]").unwrap();
        assert!(matches!(cache(store).read(), CacheRead::Recovered { .. }));
    }

    #[test]
    fn malformed_entry_reads_as_absent_without_hiding_others() {
        let store = Rc::new(MemoryStore::new());
        store.set_item("numbers_v1", r#"{"1": 10, "2": "yes", "3": null}"#).unwrap();
        let c = cache(store);
        assert_eq!(c.get(DeviceId(1)), Some(10));
        assert_eq!(c.get(DeviceId(2)), None);
        assert_eq!(c.get(DeviceId(3)), None);
        assert_eq!(c.read(), CacheRead::Loaded(DeviceMap::from([("1".to_string(), 10)])));
    }

    #[test]
    fn writes_keep_every_other_entry_verbatim() {
        let store = Rc::new(MemoryStore::new());
        store.set_item("numbers_v1", r#"{"1": 10, "2": {"legacy": true}, "3": null}"#).unwrap();
        let c = cache(store.clone());

        c.set(DeviceId(5), 50);
        c.remove(DeviceId(3));
        assert_eq!(c.update(DeviceId(2), |current| current.unwrap_or(0) + 1), 1);

        let blob: Value = serde_json::from_str(&store.get_item("numbers_v1").unwrap().unwrap()).unwrap();
        assert_eq!(blob, serde_json::json!({"1": 10, "2": 1, "5": 50}));
        assert_eq!(c.get(DeviceId(1)), Some(10));
    }

    #[test]
    fn removing_an_unset_device_does_not_write() {
        let store = Rc::new(MemoryStore::new());
        let c = cache(store.clone());
        c.remove(DeviceId(1));
        assert_eq!(store.get_item("numbers_v1").unwrap(), None);
    }

    #[test]
    fn unavailable_storage_reads_empty_and_swallows_writes() {
        let c = cache(Rc::new(BrokenStore));
        c.set(DeviceId(1), 5);
        assert!(matches!(c.read(), CacheRead::Recovered { .. }));
        assert_eq!(c.get(DeviceId(1)), None);
    }

    #[test]
    fn writes_rewrite_the_whole_blob_under_string_keys() {
        let store = Rc::new(MemoryStore::new());
        let c = cache(store.clone());
        c.set(DeviceId(2), 20);
        c.set(DeviceId(10), 100);
        assert_eq!(
            store.get_item("numbers_v1").unwrap().as_deref(),
            Some(r#"{"10":100,"2":20}"#)
        );
    }

    #[test]
    fn write_after_corruption_starts_from_empty() {
        let store = Rc::new(MemoryStore::new());
        store.set_item("numbers_v1", "garbage").unwrap();
        let c = cache(store);
        c.set(DeviceId(3), 1);
        assert_eq!(c.all().len(), 1);
    }
}
