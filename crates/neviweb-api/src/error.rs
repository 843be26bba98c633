use thiserror::Error;

use crate::codes::VendorError;

/// Top-level error type for the `neviweb-api` crate.
///
/// Transport-level and protocol-level failures. Vendor application errors
/// (`{"error": {"code": ...}}`) on login and attribute calls are returned
/// in-band as [`VendorError`] values instead; the listing and stats
/// endpoints wrap them in [`Error::Vendor`].
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status without a vendor error body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    // ── Session ─────────────────────────────────────────────────────
    /// A call that needs a session was made before a successful login.
    #[error("Not authenticated -- call login() first")]
    NotAuthenticated,

    /// Vendor error on an endpoint that has no in-band representation
    /// (location and device listings, energy stats). Attribute reads and
    /// writes never produce this variant.
    #[error("Neviweb error: {0}")]
    Vendor(VendorError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The vendor error, when this is one.
    pub fn vendor_error(&self) -> Option<&VendorError> {
        match self {
            Self::Vendor(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` if the request never got a response in time.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}
