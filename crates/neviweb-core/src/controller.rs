// ── Polling controller ──
//
// Owns the Neviweb client, the device snapshot store, the snooze tracker
// and the energy counters. Every in-band vendor error met while polling is
// routed here by its disposition.

use std::sync::Arc;
use std::time::Duration;

use neviweb_api::{
    AttributeReply, Disposition, EnergyBucket, Error as ApiError, ErrorCode, NeviwebClient,
    NetworkSelection, Notifier, OccupancyMode, StatsPeriod, TracingNotifier, VendorError,
};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::activity::DeviceActivity;
use crate::config::ControllerConfig;
use crate::energy::EnergyStore;
use crate::error::CoreError;
use crate::store::{DataStore, DeviceSnapshot};

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

// ── Refresh results ──────────────────────────────────────────────

/// What one device refresh did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New attribute values were stored.
    Updated,
    /// The read succeeded but nothing changed.
    Unchanged,
    /// The device is snoozed, or its model has nothing to poll.
    Skipped,
    /// The gateway timed out; prior state kept.
    ReadTimeout,
    /// The device reported itself unavailable and was snoozed.
    Deactivated,
    /// The vendor answered with an error code; prior state kept.
    Rejected(ErrorCode),
}

/// Tally of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub timed_out: usize,
    pub deactivated: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl RefreshSummary {
    fn count(&mut self, outcome: &RefreshOutcome) {
        match outcome {
            RefreshOutcome::Updated => self.updated += 1,
            RefreshOutcome::Unchanged => self.unchanged += 1,
            RefreshOutcome::Skipped => self.skipped += 1,
            RefreshOutcome::ReadTimeout => self.timed_out += 1,
            RefreshOutcome::Deactivated => self.deactivated += 1,
            RefreshOutcome::Rejected(_) => self.rejected += 1,
        }
    }
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    client: Arc<NeviwebClient>,
    notifier: Arc<dyn Notifier>,
    store: Arc<DataStore>,
    activity: DeviceActivity,
    energy: Mutex<Option<EnergyStore>>,
    connection_state: watch::Sender<ConnectionState>,
}

impl Controller {
    /// Create a controller that reports notifications through `tracing`.
    /// Does NOT connect -- call [`connect()`](Self::connect).
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        Self::with_notifier(config, Arc::new(TracingNotifier))
    }

    /// Create a controller with a custom notification sink.
    pub fn with_notifier(
        config: ControllerConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, CoreError> {
        let client = NeviwebClient::new(config.client.clone(), &config.transport)?
            .with_notifier(Arc::clone(&notifier));
        let energy = config
            .energy_file
            .as_ref()
            .map(EnergyStore::load)
            .transpose()?;
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);

        Ok(Self {
            inner: Arc::new(ControllerInner {
                activity: DeviceActivity::new(config.snooze),
                config,
                client: Arc::new(client),
                notifier,
                store: Arc::new(DataStore::new()),
                energy: Mutex::new(energy),
                connection_state,
            }),
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    /// The underlying API client, for calls the controller does not wrap.
    pub fn client(&self) -> &Arc<NeviwebClient> {
        &self.inner.client
    }

    pub fn activity(&self) -> &DeviceActivity {
        &self.inner.activity
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    pub fn networks(&self) -> Arc<NetworkSelection> {
        self.inner.client.networks()
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Log in, select networks and enumerate their devices.
    ///
    /// Fails with [`CoreError::LoginRejected`] when Neviweb refuses the
    /// credentials; the reason has already gone to the notifier.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.set_state(ConnectionState::Connecting);
        match self.inner.client.reconnect().await {
            Ok(true) => {}
            Ok(false) => {
                self.set_state(ConnectionState::Failed);
                return Err(CoreError::LoginRejected);
            }
            Err(e) => {
                self.set_state(ConnectionState::Failed);
                return Err(e.into());
            }
        }

        self.sync_roster();
        self.set_state(ConnectionState::Connected);
        info!(
            networks = self.inner.client.networks().ids().len(),
            devices = self.inner.store.len(),
            "connected to Neviweb"
        );
        Ok(())
    }

    /// Persist energy totals and end the session.
    pub async fn disconnect(&self) {
        if let Err(e) = self.save_energy().await {
            warn!(error = %e, "failed to save energy totals");
        }
        if let Err(e) = self.inner.client.logout().await {
            warn!(error = %e, "logout failed (non-fatal)");
        }
        self.set_state(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// One-shot: connect, run closure, disconnect.
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let controller = Controller::new(config)?;
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    async fn reconnect(&self) -> Result<(), CoreError> {
        self.set_state(ConnectionState::Reconnecting);
        match self.inner.client.reconnect().await {
            Ok(true) => {
                self.sync_roster();
                self.set_state(ConnectionState::Connected);
                Ok(())
            }
            Ok(false) => {
                self.set_state(ConnectionState::Failed);
                Err(CoreError::LoginRejected)
            }
            Err(e) => {
                self.set_state(ConnectionState::Failed);
                Err(e.into())
            }
        }
    }

    fn sync_roster(&self) {
        let devices = self.inner.client.gateway_devices();
        self.inner.store.upsert_devices(&devices);
    }

    fn set_state(&self, state: ConnectionState) {
        self.inner.connection_state.send_replace(state);
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Read the polled attributes of one device and store the result.
    ///
    /// An expired session triggers exactly one reconnect followed by one
    /// retried read. Transport failures come back as `Err` and leave the
    /// stored state untouched.
    pub async fn refresh_device(&self, device_id: u64) -> Result<RefreshOutcome, CoreError> {
        let snapshot = self
            .inner
            .store
            .device(device_id)
            .ok_or(CoreError::DeviceNotFound { device_id })?;

        if !self.inner.activity.is_active(device_id) {
            debug!(device_id, "device snoozed, skipping");
            return Ok(RefreshOutcome::Skipped);
        }
        let attributes = snapshot.kind.attributes();
        if attributes.is_empty() {
            debug!(device_id, kind = %snapshot.kind, "nothing to poll for this model");
            return Ok(RefreshOutcome::Skipped);
        }

        let client = &self.inner.client;
        let mut reply = client.get_device_attributes(device_id, attributes).await?;
        if let AttributeReply::Error(err) = &reply {
            if err.disposition() == Disposition::Reconnect {
                info!(device_id, code = %err.code, "session expired, reconnecting");
                self.reconnect().await?;
                reply = client.get_device_attributes(device_id, attributes).await?;
            }
        }

        Ok(match reply {
            AttributeReply::Attributes(map) => {
                if self.inner.store.apply_attributes(device_id, map) {
                    RefreshOutcome::Updated
                } else {
                    RefreshOutcome::Unchanged
                }
            }
            AttributeReply::ReadTimeout => {
                debug!(device_id, "gateway read timed out, keeping previous state");
                RefreshOutcome::ReadTimeout
            }
            AttributeReply::Error(err) => self.dispatch_error(&snapshot, &err),
        })
    }

    fn dispatch_error(&self, snapshot: &DeviceSnapshot, err: &VendorError) -> RefreshOutcome {
        let device_id = snapshot.device.id;
        let name = snapshot.device.name.as_str();
        match err.disposition() {
            Disposition::Deactivate => {
                self.inner.activity.deactivate(device_id);
                let minutes = self.inner.activity.snooze().as_secs() / 60;
                self.notify(
                    "Neviweb device unavailable",
                    &format!(
                        "Device {name} ({device_id}) is disconnected or unavailable ({}); \
                         polling paused for {minutes} minutes.",
                        err.code
                    ),
                );
                RefreshOutcome::Deactivated
            }
            Disposition::Notify => {
                self.notify(
                    "Neviweb error",
                    &format!("Device {name} ({device_id}): {} ({})", err.code.description(), err.code),
                );
                RefreshOutcome::Rejected(err.code.clone())
            }
            Disposition::Reconnect | Disposition::Log => {
                warn!(
                    device_id,
                    code = %err.code,
                    "{}",
                    err.code.description()
                );
                RefreshOutcome::Rejected(err.code.clone())
            }
        }
    }

    fn notify(&self, title: &str, message: &str) {
        self.inner
            .config
            .client
            .notify
            .emit(self.inner.notifier.as_ref(), title, message);
    }

    /// One poll cycle over every known device, then the energy counters.
    ///
    /// A failing device never aborts the cycle.
    pub async fn refresh_all(&self) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        for device_id in self.inner.store.ids() {
            match self.refresh_device(device_id).await {
                Ok(outcome) => summary.count(&outcome),
                Err(e) => {
                    summary.failed += 1;
                    warn!(device_id, error = %e, "device refresh failed");
                }
            }
        }

        if let Err(e) = self.update_energy().await {
            warn!(error = %e, "energy update failed");
        }
        self.inner.store.mark_refreshed();
        debug!(?summary, "poll cycle complete");
        summary
    }

    /// Spawn the periodic poll task. The first cycle runs one scan
    /// interval after the call; cancel the token to stop it.
    pub fn start(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let ctrl = self.clone();
        let period = self.inner.config.scan_interval;
        tokio::spawn(refresh_task(ctrl, period, cancel))
    }

    // ── Energy counters ──────────────────────────────────────────

    async fn update_energy(&self) -> Result<(), CoreError> {
        let mut guard = self.inner.energy.lock().await;
        let Some(store) = guard.as_mut() else {
            return Ok(());
        };

        for snapshot in self.inner.store.snapshot() {
            let device_id = snapshot.device.id;
            if !snapshot.kind.tracks_energy() || !self.inner.activity.is_active(device_id) {
                continue;
            }
            match self.read_stats(device_id, StatsPeriod::Hourly).await {
                Ok(Some(buckets)) => {
                    let added = store.record(device_id, &buckets);
                    debug!(device_id, added_wh = added, "energy recorded");
                }
                Ok(None) => {}
                Err(e) => warn!(device_id, error = %e, "hourly stats unavailable"),
            }
        }
        store.save()
    }

    /// Fetch energy history; an expired session gets one reconnect and
    /// one retried read, as attribute polling does.
    async fn read_stats(
        &self,
        device_id: u64,
        period: StatsPeriod,
    ) -> Result<Option<Vec<EnergyBucket>>, CoreError> {
        let client = &self.inner.client;
        match client.get_device_stats(device_id, period).await {
            Err(ApiError::Vendor(err)) if err.disposition() == Disposition::Reconnect => {
                info!(device_id, code = %err.code, "session expired, reconnecting");
                self.reconnect().await?;
                Ok(client.get_device_stats(device_id, period).await?)
            }
            other => Ok(other?),
        }
    }

    /// Write the energy totals file, if tracking is enabled.
    pub async fn save_energy(&self) -> Result<(), CoreError> {
        match self.inner.energy.lock().await.as_ref() {
            Some(store) => store.save(),
            None => Ok(()),
        }
    }

    /// Accumulated Wh for a device, when energy tracking is enabled.
    pub async fn energy_total_wh(&self, device_id: u64) -> Option<f64> {
        self.inner
            .energy
            .lock()
            .await
            .as_ref()
            .and_then(|s| s.total_wh(device_id))
    }

    // ── Pass-through operations ──────────────────────────────────

    /// Write attributes to a device (best effort, see `NeviwebClient`).
    pub async fn set_device_attributes(
        &self,
        device_id: u64,
        data: &serde_json::Value,
    ) -> Result<(), CoreError> {
        if self.inner.store.device(device_id).is_none() {
            return Err(CoreError::DeviceNotFound { device_id });
        }
        self.inner
            .client
            .set_device_attributes(device_id, data)
            .await?;
        Ok(())
    }

    pub async fn device_stats(
        &self,
        device_id: u64,
        period: StatsPeriod,
    ) -> Result<Option<Vec<EnergyBucket>>, CoreError> {
        self.read_stats(device_id, period).await
    }

    /// Set home/away on a selected network, by id or name.
    pub async fn set_occupancy_mode(
        &self,
        network: &str,
        mode: &OccupancyMode,
    ) -> Result<(), CoreError> {
        let location_id = self.resolve_network(network)?;
        self.inner
            .client
            .set_occupancy_mode(location_id, mode)
            .await?;
        Ok(())
    }

    /// Resolve a selected network by numeric id or case-insensitive name.
    pub fn resolve_network(&self, identifier: &str) -> Result<u64, CoreError> {
        let networks = self.inner.client.networks();
        networks
            .locations()
            .find(|l| l.id.to_string() == identifier || l.name.eq_ignore_ascii_case(identifier))
            .map(|l| l.id)
            .ok_or_else(|| CoreError::NetworkNotFound {
                identifier: identifier.to_owned(),
            })
    }
}

// ── Background task ──────────────────────────────────────────────

async fn refresh_task(controller: Controller, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let summary = controller.refresh_all().await;
                debug!(?summary, "periodic refresh");
            }
        }
    }
    debug!("refresh task stopped");
}
