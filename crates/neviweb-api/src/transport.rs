// Transport configuration for the Neviweb HTTP client.
//
// Owns the reqwest builder settings: base URL, per-request timeout, TLS
// roots, and the cookie jar that carries the session cookie between calls.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use url::Url;

use crate::error::Error;

/// Production Neviweb host.
pub const DEFAULT_HOST: &str = "https://neviweb.com";

/// Uniform per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the bundled webpki roots.
    #[default]
    System,
    /// Additionally trust a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
}

/// Transport settings shared by every request a client makes.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: Url,
    pub tls: TlsMode,
    pub timeout: Duration,
    pub cookie_jar: Arc<Jar>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            tls: TlsMode::System,
            timeout: DEFAULT_TIMEOUT,
            cookie_jar: Arc::new(Jar::default()),
        }
    }
}

impl TransportConfig {
    /// Point the transport at another host (mock servers, staging).
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// Every response's `Set-Cookie` headers are merged into the shared jar
    /// before the next request goes out.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("neviweb-rs/", env!("CARGO_PKG_VERSION")))
            .cookie_provider(Arc::clone(&self.cookie_jar));

        if let TlsMode::CustomCa(path) = &self.tls {
            let cert_pem = std::fs::read(path)
                .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
            let cert = reqwest::Certificate::from_pem(&cert_pem)
                .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
            builder = builder.add_root_certificate(cert);
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_HOST).expect("DEFAULT_HOST is a valid URL")
}
