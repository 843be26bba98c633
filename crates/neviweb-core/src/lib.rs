//! Polling layer between `neviweb-api` and front ends.
//!
//! - **[`Controller`]** owns the session client and runs poll cycles. Each
//!   in-band vendor error is routed by its disposition: an expired session
//!   triggers one reconnect and one retried read, an unavailable device is
//!   snoozed, and account-level problems go to the [`Notifier`].
//!
//! - **[`DataStore`]** keeps the latest attributes per device
//!   (`DashMap` plus a `watch` channel with the last refresh time).
//!
//! - **[`DeviceActivity`]** tracks devices excluded from polling for the
//!   snooze window after they report themselves unavailable.
//!
//! - **[`EnergyStore`]** accumulates hourly consumption per device in a
//!   JSON file that survives restarts.
//!
//! [`Notifier`]: neviweb_api::Notifier

pub mod activity;
pub mod capabilities;
pub mod config;
pub mod controller;
pub mod energy;
pub mod error;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use activity::{DEFAULT_SNOOZE, DeviceActivity};
pub use capabilities::DeviceKind;
pub use config::{ControllerConfig, DEFAULT_SCAN_INTERVAL, MAX_SCAN_INTERVAL, MIN_SCAN_INTERVAL};
pub use controller::{ConnectionState, Controller, RefreshOutcome, RefreshSummary};
pub use energy::{EnergyStore, EnergyTotal};
pub use error::CoreError;
pub use store::{DataStore, DeviceSnapshot};
