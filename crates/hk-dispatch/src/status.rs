//! Device status snapshots.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Latest report from one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub timestamp: DateTime<Utc>,
    pub values: Map<String, Value>,
}

/// Last-write-wins map of device id → status.
///
/// Reads hand out deep copies built while the lock is held, so a caller
/// mutating its snapshot never affects the store or other readers.
#[derive(Debug, Default)]
pub struct StatusStore {
    statuses: Mutex<BTreeMap<String, DeviceStatus>>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, DeviceStatus>> {
        self.statuses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `values` for `device_id`, stamped with the current time.
    pub fn update_device_status(
        &self,
        device_id: impl Into<String>,
        values: Map<String, Value>,
    ) -> DeviceStatus {
        let device_id = device_id.into();
        let status = DeviceStatus {
            timestamp: Utc::now(),
            values,
        };
        self.lock().insert(device_id.clone(), status.clone());
        tracing::debug!(device = %device_id, "device status updated");
        status
    }

    /// Deep copy of every status, taken in one critical section.
    pub fn get_all_statuses(&self) -> BTreeMap<String, DeviceStatus> {
        self.lock().clone()
    }

    pub fn get_status(&self, device_id: &str) -> Option<DeviceStatus> {
        self.lock().get(device_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn values(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn last_write_wins() {
        let store = StatusStore::new();
        store.update_device_status("pump-1", values(json!({"rpm": 1200})));
        store.update_device_status("pump-1", values(json!({"rpm": 900})));
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get_status("pump-1").unwrap().values["rpm"],
            json!(900)
        );
        assert!(store.get_status("pump-2").is_none());
    }

    #[test]
    fn snapshot_mutation_does_not_leak() {
        let store = StatusStore::new();
        store.update_device_status("valve", values(json!({"open": true})));

        let mut snapshot = store.get_all_statuses();
        snapshot
            .get_mut("valve")
            .unwrap()
            .values
            .insert("open".to_string(), json!(false));
        snapshot.remove("valve");

        let fresh = store.get_all_statuses();
        assert_eq!(fresh["valve"].values["open"], json!(true));
    }

    #[test]
    fn survives_a_poisoned_lock() {
        let store = Arc::new(StatusStore::new());
        store.update_device_status("a", Map::new());

        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.statuses.lock().unwrap();
            panic!("poison the status lock");
        })
        .join();

        assert!(store.statuses.is_poisoned());
        store.update_device_status("b", Map::new());
        assert_eq!(store.len(), 2);
    }
}
