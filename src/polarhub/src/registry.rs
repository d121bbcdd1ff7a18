use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Mutex;

/// Live classifier window: the last 60 raw intervals.
pub(crate) const RR_WINDOW: usize = 60;
/// Dashboard sparkline depth.
pub(crate) const RMSSD_BUFFER: usize = 30;

/// In-memory state for one chest strap. Created lazily on the first beat,
/// dropped on `ble.disconnected`.
#[derive(Debug, Default)]
pub struct DeviceState {
    pub rr_window: VecDeque<f64>,
    pub rmssd_buffer: VecDeque<f64>,
    pub total_beats: u64,
    pub last_posture: Option<String>,
}

impl DeviceState {
    pub fn push_rr(&mut self, rr: f64) {
        self.rr_window.push_back(rr);
        while self.rr_window.len() > RR_WINDOW {
            self.rr_window.pop_front();
        }
        self.total_beats += 1;
    }

    pub fn push_rmssd(&mut self, rmssd: f64) {
        self.rmssd_buffer.push_back(rmssd);
        while self.rmssd_buffer.len() > RMSSD_BUFFER {
            self.rmssd_buffer.pop_front();
        }
    }

    fn snapshot(&self, device: &str) -> DeviceSnapshot {
        DeviceSnapshot {
            device: device.to_string(),
            total_beats: self.total_beats,
            window_len: self.rr_window.len(),
            rmssd: self.rmssd_buffer.iter().copied().collect(),
            last_posture: self.last_posture.clone(),
        }
    }
}

/// The mutex serialises real-time ingest, batch ingest and post-processing
/// for one device; holders may await store calls while holding it.
pub struct DeviceEntry {
    pub state: Mutex<DeviceState>,
}

#[derive(Clone, Default)]
pub struct DeviceRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<DeviceEntry>>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch or lazily create; the flag reports creation so callers can
    /// register the device with the post-processor.
    pub fn get_or_create(&self, device: &str) -> (Arc<DeviceEntry>, bool) {
        if let Some(entry) = self.inner.read().get(device) {
            return (entry.clone(), false);
        }

        let mut map = self.inner.write();
        if let Some(entry) = map.get(device) {
            return (entry.clone(), false);
        }

        let entry = Arc::new(DeviceEntry {
            state: Mutex::new(DeviceState::default()),
        });
        map.insert(device.to_string(), entry.clone());
        (entry, true)
    }

    pub fn get(&self, device: &str) -> Option<Arc<DeviceEntry>> {
        self.inner.read().get(device).cloned()
    }

    pub fn remove(&self, device: &str) -> bool {
        self.inner.write().remove(device).is_some()
    }

    pub fn devices(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub async fn snapshot_devices(&self) -> Vec<DeviceSnapshot> {
        let entries: Vec<(String, Arc<DeviceEntry>)> = {
            let map = self.inner.read();
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };

        let mut snapshots = Vec::with_capacity(entries.len());
        for (device, entry) in entries {
            let state = entry.state.lock().await;
            snapshots.push(state.snapshot(&device));
        }
        snapshots.sort_by(|a, b| a.device.cmp(&b.device));
        snapshots
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    pub device: String,
    pub total_beats: u64,
    pub window_len: usize,
    pub rmssd: Vec<f64>,
    pub last_posture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rr_window_is_bounded() {
        let mut state = DeviceState::default();
        for i in 0..100 {
            state.push_rr(800.0 + i as f64);
        }
        assert_eq!(state.rr_window.len(), RR_WINDOW);
        assert_eq!(state.total_beats, 100);
        // Oldest entries evicted first.
        assert_eq!(*state.rr_window.front().unwrap(), 840.0);
    }

    #[test]
    fn rmssd_buffer_is_bounded() {
        let mut state = DeviceState::default();
        for i in 0..50 {
            state.push_rmssd(i as f64);
        }
        assert_eq!(state.rmssd_buffer.len(), RMSSD_BUFFER);
        assert_eq!(*state.rmssd_buffer.front().unwrap(), 20.0);
    }

    #[test]
    fn get_or_create_reports_creation_once() {
        let registry = DeviceRegistry::new();
        let (_, created) = registry.get_or_create("strap-1");
        assert!(created);
        let (_, created) = registry.get_or_create("strap-1");
        assert!(!created);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_clears_state() {
        let registry = DeviceRegistry::new();
        registry.get_or_create("strap-1");
        assert!(registry.remove("strap-1"));
        assert!(!registry.remove("strap-1"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn snapshot_lists_devices_sorted() {
        let registry = DeviceRegistry::new();
        for device in ["strap-b", "strap-a"] {
            let (entry, _) = registry.get_or_create(device);
            entry.state.lock().await.push_rr(800.0);
        }

        let snapshots = registry.snapshot_devices().await;
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].device, "strap-a");
        assert_eq!(snapshots[1].device, "strap-b");
        assert_eq!(snapshots[0].total_beats, 1);
    }
}
