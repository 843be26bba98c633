// Session authentication
//
// Login posts the account credentials and keeps the returned session id;
// the session cookie lands in the client's jar on its own. Reconnect
// re-runs the full login → discovery → device enumeration sequence.

use secrecy::ExposeSecret;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::client::NeviwebClient;
use crate::codes::{ErrorCode, VendorError};
use crate::error::Error;
use crate::models::{LoginResponse, Session};

impl NeviwebClient {
    /// Authenticate with the configured username and password.
    ///
    /// `POST /api/login`
    ///
    /// Returns `Ok(true)` once a session is stored. A vendor refusal
    /// (bad credentials, too many sessions, ...) clears any previous
    /// session, surfaces a notification, and returns `Ok(false)`. Only
    /// transport failures are `Err`.
    pub async fn login(&self) -> Result<bool, Error> {
        let _guard = self.login_lock.lock().await;

        let url = self.api_url("login")?;
        debug!("logging in at {}", url);

        let body = json!({
            "username": self.config().username,
            "password": self.config().password.expose_secret(),
            "interface": "neviweb",
            "stayConnected": 1,
        });

        let value = self.send(self.http().post(url).json(&body)).await?;

        if let Some(err) = VendorError::from_body(&value) {
            self.set_session(None);
            self.report_login_failure(&err);
            return Ok(false);
        }

        let resp: LoginResponse =
            serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
                message: format!("unexpected login response: {e}"),
                body: value.to_string(),
            })?;

        self.set_session(Some(Session {
            id: resp.session,
            account_id: resp.account.id,
        }));
        info!(user = %self.config().username, "logged in to Neviweb");
        Ok(true)
    }

    /// End the current session.
    ///
    /// `DELETE /api/logout`
    ///
    /// The local session is dropped even if the server rejects the call.
    pub async fn logout(&self) -> Result<(), Error> {
        if !self.is_authenticated() {
            return Ok(());
        }
        let url = self.api_url("logout")?;
        debug!("logging out at {}", url);

        let result = match self.authed(self.http().delete(url)) {
            Ok(builder) => self.send(builder).await.map(|_| ()),
            Err(e) => Err(e),
        };
        self.set_session(None);
        result
    }

    /// Recover from an expired session.
    ///
    /// Runs login, network discovery, and device enumeration for every
    /// selected network, replacing the cached selection and device list.
    /// Returns `Ok(false)` when the login itself is refused.
    pub async fn reconnect(&self) -> Result<bool, Error> {
        info!("reconnecting to Neviweb");
        if !self.login().await? {
            return Ok(false);
        }

        let selection = self.discover_networks().await?;
        let mut devices = Vec::new();
        for network_id in selection.ids() {
            devices.extend(self.fetch_gateway_devices(network_id).await?);
        }
        debug!(count = devices.len(), "gateway devices refreshed");
        self.set_devices(devices);
        Ok(true)
    }

    fn report_login_failure(&self, err: &VendorError) {
        let message = match err.code {
            ErrorCode::TooManySessions => {
                "Too many active sessions. Close all Neviweb sessions you have opened on \
                 other platforms (mobile, browser, ...), wait a few minutes, then retry."
            }
            ErrorCode::BadLogin => "Bad Neviweb username or password, check your configuration.",
            ErrorCode::Maintenance => "Neviweb is under maintenance, login will be retried later.",
            _ => err.code.description(),
        };
        warn!(code = %err.code, "login refused");
        self.notify("Neviweb login failed", &format!("{message} ({})", err.code));
    }
}
