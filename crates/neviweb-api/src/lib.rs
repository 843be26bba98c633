// neviweb-api: Async Rust client for the Neviweb smart-home cloud API

pub mod auth;
pub mod client;
pub mod codes;
pub mod devices;
pub mod error;
pub mod locations;
pub mod models;
pub mod notify;
pub mod stats;
pub mod transport;

pub use client::{ClientConfig, NeviwebClient, SESSION_HEADER, WRITE_ATTEMPTS};
pub use codes::{Disposition, ErrorCode, VendorError};
pub use error::Error;
pub use locations::select_networks;
pub use models::{
    AttributeMap, AttributeReply, EnergyBucket, GatewayDevice, Location, NetworkSelection,
    OccupancyMode, Session, Signature, SoftVersion, StatsPeriod,
};
pub use notify::{Notifier, NotifyMode, RecordingNotifier, TracingNotifier};
pub use transport::{TlsMode, TransportConfig};
