// ── Device activity tracking ──
//
// A device that reports itself unavailable is snoozed: the poller skips it
// until the window elapses, then picks it up again on its own.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::info;

/// How long an unavailable device stays out of the poll cycle.
pub const DEFAULT_SNOOZE: Duration = Duration::from_secs(20 * 60);

/// Tracks which devices are temporarily excluded from polling.
#[derive(Debug)]
pub struct DeviceActivity {
    snooze: Duration,
    /// device id -> instant the device becomes active again
    inactive: DashMap<u64, Instant>,
}

impl Default for DeviceActivity {
    fn default() -> Self {
        Self::new(DEFAULT_SNOOZE)
    }
}

impl DeviceActivity {
    pub fn new(snooze: Duration) -> Self {
        Self {
            snooze,
            inactive: DashMap::new(),
        }
    }

    pub fn snooze(&self) -> Duration {
        self.snooze
    }

    /// Exclude a device from polling for the snooze window.
    pub fn deactivate(&self, device_id: u64) {
        let until = Instant::now() + self.snooze;
        self.inactive.insert(device_id, until);
        info!(
            device_id,
            minutes = self.snooze.as_secs() / 60,
            "device deactivated"
        );
    }

    /// Whether the device should be polled now.
    ///
    /// A device whose window has elapsed is reactivated as a side effect.
    pub fn is_active(&self, device_id: u64) -> bool {
        let expired = match self.inactive.get(&device_id) {
            None => return true,
            Some(until) => Instant::now() >= *until,
        };
        if expired {
            self.inactive.remove(&device_id);
            info!(device_id, "device reactivated");
        }
        expired
    }

    /// Force a device back into the poll cycle.
    pub fn reactivate(&self, device_id: u64) {
        if self.inactive.remove(&device_id).is_some() {
            info!(device_id, "device reactivated");
        }
    }

    /// Devices currently snoozed, sorted by id.
    pub fn inactive_ids(&self) -> Vec<u64> {
        let now = Instant::now();
        let mut ids: Vec<u64> = self
            .inactive
            .iter()
            .filter(|e| *e.value() > now)
            .map(|e| *e.key())
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deactivated_device_resumes_after_window() {
        let activity = DeviceActivity::default();
        activity.deactivate(123);

        assert!(!activity.is_active(123));
        assert!(activity.is_active(456));

        tokio::time::advance(Duration::from_secs(19 * 60)).await;
        assert!(!activity.is_active(123));
        assert_eq!(activity.inactive_ids(), vec![123]);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(activity.is_active(123));
        assert!(activity.inactive_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reactivate_clears_snooze() {
        let activity = DeviceActivity::new(Duration::from_secs(60));
        activity.deactivate(1);
        activity.reactivate(1);
        assert!(activity.is_active(1));
    }
}
