// ── Core error types ──
//
// User-facing errors from neviweb-core. Consumers never see reqwest errors
// or JSON parse failures directly; `From<neviweb_api::Error>` translates
// transport-layer errors into these variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach Neviweb at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Neviweb refused the login; see the notification for the reason")]
    LoginRejected,

    #[error("Not connected -- call connect() first")]
    NotConnected,

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: u64 },

    #[error("Network not found: {identifier}")]
    NetworkNotFound { identifier: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Vendor error code, when the failure came from Neviweb itself.
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Local storage ────────────────────────────────────────────────
    #[error("Energy store at {path}: {message}")]
    Storage { path: String, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl From<neviweb_api::Error> for CoreError {
    fn from(err: neviweb_api::Error) -> Self {
        use neviweb_api::Error as ApiError;

        match err {
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Http { status, body } => CoreError::Api {
                message: body,
                code: None,
                status: Some(status),
            },
            ApiError::NotAuthenticated => CoreError::NotConnected,
            ApiError::Vendor(err) => CoreError::Api {
                message: err.code.description().into(),
                code: Some(err.code.as_str().to_owned()),
                status: None,
            },
            ApiError::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Unexpected response: {message}"),
                code: None,
                status: None,
            },
        }
    }
}
