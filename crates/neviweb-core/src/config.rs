// ── Runtime controller configuration ──
//
// Describes how to reach Neviweb and how often to poll. Never touches
// disk; the CLI builds a `ControllerConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use neviweb_api::{ClientConfig, TransportConfig};

use crate::activity::DEFAULT_SNOOZE;

/// Default poll period.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(540);

/// Shortest poll period the vendor tolerates without throttling.
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(300);

/// Longest poll period before sessions start expiring between polls.
pub const MAX_SCAN_INTERVAL: Duration = Duration::from_secs(600);

/// Configuration for one Neviweb account.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub client: ClientConfig,
    pub transport: TransportConfig,
    /// Period of the background poll task.
    pub scan_interval: Duration,
    /// How long an unavailable device is left out of polling.
    pub snooze: Duration,
    /// Where accumulated energy totals are kept. `None` disables tracking.
    pub energy_file: Option<PathBuf>,
}

impl ControllerConfig {
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            transport: TransportConfig::default(),
            scan_interval: DEFAULT_SCAN_INTERVAL,
            snooze: DEFAULT_SNOOZE,
            energy_file: None,
        }
    }
}
