// Neviweb HTTP client
//
// Owns one authenticated session against the vendor cloud: the reqwest
// client (with its cookie jar), the `Session-Id` header value, and the
// cached discovery results. Endpoint groups (auth, locations, devices,
// stats) are inherent methods in sibling modules; this file keeps the
// transport mechanics.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::{ArcSwap, ArcSwapOption};
use reqwest::RequestBuilder;
use secrecy::SecretString;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};
use url::Url;

use crate::codes::VendorError;
use crate::error::Error;
use crate::models::{GatewayDevice, NetworkSelection, Session};
use crate::notify::{Notifier, NotifyMode, TracingNotifier};
use crate::transport::TransportConfig;

/// Header carrying the session token on every authenticated call.
pub const SESSION_HEADER: &str = "Session-Id";

/// Total attempts for a write that keeps coming back with a vendor error.
pub const WRITE_ATTEMPTS: usize = 3;

/// Account settings the client needs to log in and pick networks.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub username: String,
    pub password: SecretString,
    /// Up to three location names, by slot. With no name set at all, the
    /// first three locations of the account are taken in order.
    pub network_names: [Option<String>; 3],
    /// Silence the "miwi device not supported" hint during discovery.
    pub ignore_miwi: bool,
    pub notify: NotifyMode,
}

impl ClientConfig {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            network_names: [None, None, None],
            ignore_miwi: false,
            notify: NotifyMode::default(),
        }
    }
}

/// Authenticated client for the Neviweb cloud API.
///
/// `Send + Sync`; share it behind an `Arc`. Logins are serialized, every
/// other call runs concurrently on the shared session.
pub struct NeviwebClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    config: ClientConfig,
    notifier: Arc<dyn Notifier>,
    session: ArcSwapOption<Session>,
    /// Held for the duration of a login so only one is ever in flight.
    pub(crate) login_lock: Mutex<()>,
    networks: ArcSwap<NetworkSelection>,
    devices: ArcSwap<Vec<GatewayDevice>>,
}

impl NeviwebClient {
    /// Create a client. Does not contact the server.
    pub fn new(config: ClientConfig, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: transport.base_url.clone(),
            timeout: transport.timeout,
            config,
            notifier: Arc::new(TracingNotifier),
            session: ArcSwapOption::empty(),
            login_lock: Mutex::new(()),
            networks: ArcSwap::from_pointee(NetworkSelection::default()),
            devices: ArcSwap::from_pointee(Vec::new()),
        })
    }

    /// Replace the default (log-only) notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The current session, if logged in.
    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.load_full()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.load().is_some()
    }

    pub fn account_id(&self) -> Option<String> {
        self.session.load().as_ref().map(|s| s.account_id.clone())
    }

    /// Networks picked by the last discovery.
    pub fn networks(&self) -> Arc<NetworkSelection> {
        self.networks.load_full()
    }

    /// Devices enumerated by the last reconnect.
    pub fn gateway_devices(&self) -> Arc<Vec<GatewayDevice>> {
        self.devices.load_full()
    }

    // ── Shared state setters (used by endpoint modules) ─────────────

    pub(crate) fn set_session(&self, session: Option<Session>) {
        self.session.store(session.map(Arc::new));
    }

    pub(crate) fn set_networks(&self, selection: NetworkSelection) {
        self.networks.store(Arc::new(selection));
    }

    pub(crate) fn set_devices(&self, devices: Vec<GatewayDevice>) {
        self.devices.store(Arc::new(devices));
    }

    /// Surface a message through the configured notify mode.
    pub(crate) fn notify(&self, title: &str, message: &str) {
        self.config.notify.emit(self.notifier.as_ref(), title, message);
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Attach the session header, or fail if there is no session yet.
    pub(crate) fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder, Error> {
        let session = self.session.load();
        let session = session.as_ref().ok_or(Error::NotAuthenticated)?;
        Ok(builder.header(SESSION_HEADER, session.id.as_str()))
    }

    /// Send a request and decode the JSON body.
    ///
    /// Vendor error bodies come back as `Ok`; callers inspect them with
    /// [`VendorError::from_body`]. Timeouts map to [`Error::Timeout`].
    pub(crate) async fn send(&self, builder: RequestBuilder) -> Result<Value, Error> {
        let resp = builder.send().await.map_err(|e| self.map_transport(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        trace!(%status, body_len = body.len(), "response received");

        if body.trim().is_empty() {
            return if status.is_success() {
                Ok(Value::Null)
            } else {
                Err(Error::Http {
                    status: status.as_u16(),
                    body,
                })
            };
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(value) if status.is_success() || VendorError::from_body(&value).is_some() => {
                Ok(value)
            }
            Ok(_) => Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body),
            }),
            Err(e) if status.is_success() => Err(Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body,
            }),
            Err(_) => Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body),
            }),
        }
    }

    /// Authenticated GET.
    pub(crate) async fn get(&self, url: Url) -> Result<Value, Error> {
        debug!("GET {}", url);
        self.send(self.authed(self.http.get(url))?).await
    }

    /// Authenticated PUT with a JSON body.
    pub(crate) async fn put(&self, url: Url, body: &(impl Serialize + Sync)) -> Result<Value, Error> {
        debug!("PUT {}", url);
        self.send(self.authed(self.http.put(url).json(body))?).await
    }

    /// PUT with the best-effort retry policy.
    ///
    /// A vendor error in the response body is retried until
    /// [`WRITE_ATTEMPTS`] is reached, after which it is logged and dropped.
    /// Transport errors propagate immediately.
    pub(crate) async fn put_with_retry(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        for attempt in 1..=WRITE_ATTEMPTS {
            let value = self.put(url.clone(), body).await?;
            let Some(err) = VendorError::from_body(&value) else {
                return Ok(());
            };
            warn!(%url, attempt, code = %err.code, "write rejected: {}", err.code.description());
        }
        warn!(%url, attempts = WRITE_ATTEMPTS, "write abandoned after repeated vendor errors");
        Ok(())
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

impl std::fmt::Debug for NeviwebClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeviwebClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.config.username)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
