// ── Device snapshot store ──
//
// Lock-free storage of the latest known state per device. Poll cycles
// write here; front ends read snapshots and watch the refresh clock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use neviweb_api::{AttributeMap, GatewayDevice};
use serde::Serialize;
use tokio::sync::watch;

use crate::capabilities::DeviceKind;

/// Latest known state of one device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    pub device: GatewayDevice,
    pub kind: DeviceKind,
    /// Attributes from the last successful read, merged across reads.
    pub attributes: AttributeMap,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeviceSnapshot {
    fn new(device: GatewayDevice) -> Self {
        let kind = device
            .signature
            .as_ref()
            .map_or(DeviceKind::Unknown, |s| DeviceKind::from_model(s.model));
        Self {
            device,
            kind,
            attributes: AttributeMap::new(),
            updated_at: None,
        }
    }
}

/// Concurrent map of device id to snapshot.
pub struct DataStore {
    devices: DashMap<u64, Arc<DeviceSnapshot>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore {
    pub fn new() -> Self {
        let (last_refresh, _) = watch::channel(None);
        Self {
            devices: DashMap::new(),
            last_refresh,
        }
    }

    /// Replace the device roster.
    ///
    /// Known devices keep their attributes; devices absent from `devices`
    /// are dropped.
    pub fn upsert_devices(&self, devices: &[GatewayDevice]) {
        for device in devices {
            let mut snapshot = DeviceSnapshot::new(device.clone());
            if let Some(prev) = self.devices.get(&device.id) {
                snapshot.attributes.clone_from(&prev.attributes);
                snapshot.updated_at = prev.updated_at;
            }
            self.devices.insert(device.id, Arc::new(snapshot));
        }
        self.devices
            .retain(|id, _| devices.iter().any(|d| d.id == *id));
    }

    /// Merge freshly read attributes into a device's snapshot.
    ///
    /// Returns `false` when the device is unknown or nothing changed.
    pub fn apply_attributes(&self, device_id: u64, attributes: AttributeMap) -> bool {
        let Some(mut entry) = self.devices.get_mut(&device_id) else {
            return false;
        };
        let changed = attributes
            .iter()
            .any(|(k, v)| entry.attributes.get(k) != Some(v));

        let snapshot = Arc::make_mut(&mut entry);
        snapshot.attributes.extend(attributes);
        snapshot.updated_at = Some(Utc::now());
        changed
    }

    pub fn device(&self, device_id: u64) -> Option<Arc<DeviceSnapshot>> {
        self.devices.get(&device_id).map(|e| Arc::clone(e.value()))
    }

    /// All snapshots, sorted by device id.
    pub fn snapshot(&self) -> Vec<Arc<DeviceSnapshot>> {
        let mut all: Vec<_> = self.devices.iter().map(|e| Arc::clone(e.value())).collect();
        all.sort_by_key(|s| s.device.id);
        all
    }

    pub fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.devices.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub(crate) fn mark_refreshed(&self) {
        self.last_refresh.send_replace(Some(Utc::now()));
    }

    /// Observe the completion time of poll cycles.
    pub fn last_refresh(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_refresh.subscribe()
    }
}
