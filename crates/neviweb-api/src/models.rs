// Neviweb wire types
//
// Fields use `#[serde(default)]` liberally: the vendor adds and drops keys
// across device families and firmware versions. Unmodeled keys land in
// `extra` so callers can still reach them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::codes::VendorError;

/// Flat bag of named device attributes.
pub type AttributeMap = serde_json::Map<String, Value>;

// ── Session ──────────────────────────────────────────────────────────

/// Authenticated context obtained at login.
///
/// The session cookie lives in the client's cookie jar; this holds the
/// `Session-Id` header value and the account that scopes discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub account_id: String,
}

/// Login response body.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub session: String,
    pub account: LoginAccount,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginAccount {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

// ── Locations ────────────────────────────────────────────────────────

/// Occupancy mode of a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyMode {
    Home,
    Away,
    #[serde(untagged)]
    Other(String),
}

impl OccupancyMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Home => "home",
            Self::Away => "away",
            Self::Other(s) => s,
        }
    }
}

impl std::str::FromStr for OccupancyMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "home" => Self::Home,
            "away" => Self::Away,
            other => Self::Other(other.to_owned()),
        })
    }
}

/// A Neviweb location ("network" / gateway group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mode: Option<OccupancyMode>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Up to three selected locations, by configuration slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkSelection {
    pub primary: Option<Location>,
    pub secondary: Option<Location>,
    pub tertiary: Option<Location>,
}

impl NetworkSelection {
    /// Selected locations in slot order, skipping empty slots.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        [&self.primary, &self.secondary, &self.tertiary]
            .into_iter()
            .flatten()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.locations().map(|l| l.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none() && self.tertiary.is_none()
    }
}

// ── Devices ──────────────────────────────────────────────────────────

/// Firmware version triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftVersion {
    #[serde(default)]
    pub major: u32,
    #[serde(default)]
    pub middle: u32,
    #[serde(default)]
    pub minor: u32,
}

impl std::fmt::Display for SoftVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.middle, self.minor)
    }
}

/// Vendor metadata block per device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    #[serde(default)]
    pub model: u32,
    #[serde(default)]
    pub model_cfg: u32,
    #[serde(default)]
    pub soft_build_cfg: u32,
    #[serde(default)]
    pub soft_version: SoftVersion,
    #[serde(default)]
    pub hard_rev: u32,
    #[serde(default)]
    pub protocol: Option<String>,
}

impl Signature {
    /// Zigbee-era "miwi" radios are not served by this client.
    pub fn is_miwi(&self) -> bool {
        self.protocol
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case("miwi"))
    }
}

/// A device as listed under a location, enriched with its signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayDevice {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub family: Option<String>,
    #[serde(default, rename = "location$id")]
    pub location_id: Option<u64>,
    #[serde(default)]
    pub signature: Option<Signature>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── Attribute reads ──────────────────────────────────────────────────

/// Outcome of an attribute read. Vendor errors are data, not `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeReply {
    /// The requested attributes (possibly a subset).
    Attributes(AttributeMap),
    /// The gateway or the HTTP request timed out; treat as "no data".
    ReadTimeout,
    /// Vendor application error.
    Error(VendorError),
}

impl AttributeReply {
    pub fn attributes(&self) -> Option<&AttributeMap> {
        match self {
            Self::Attributes(map) => Some(map),
            _ => None,
        }
    }

    pub fn into_attributes(self) -> Option<AttributeMap> {
        match self {
            Self::Attributes(map) => Some(map),
            _ => None,
        }
    }
}

// ── Energy statistics ────────────────────────────────────────────────

/// Granularity of a consumption history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StatsPeriod {
    Hourly,
    Daily,
    Monthly,
}

/// One consumption bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyBucket {
    #[serde(default)]
    pub date: Option<String>,
    /// Consumption in the bucket, in Wh.
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── Serde helpers ────────────────────────────────────────────────────

fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(de)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn device_with_numeric_family_and_signature() {
        let dev: GatewayDevice = serde_json::from_value(json!({
            "id": 42,
            "name": "Salon",
            "family": 1123,
            "location$id": 7,
            "signature": {
                "model": 1123,
                "modelCfg": 0,
                "softVersion": {"major": 1, "middle": 2, "minor": 9},
                "hardRev": 2,
                "protocol": "sinope"
            },
            "vendorOnly": true
        }))
        .expect("device");

        assert_eq!(dev.family.as_deref(), Some("1123"));
        assert_eq!(dev.location_id, Some(7));
        let sig = dev.signature.expect("signature");
        assert_eq!(sig.soft_version.to_string(), "1.2.9");
        assert!(!sig.is_miwi());
        assert!(dev.extra.contains_key("vendorOnly"));
    }

    #[test]
    fn location_mode_keeps_unknown_values() {
        let loc: Location =
            serde_json::from_value(json!({"id": 1, "name": "Chalet", "mode": "vacation"}))
                .expect("location");
        assert_eq!(loc.mode, Some(OccupancyMode::Other("vacation".into())));
    }

    #[test]
    fn selection_ids_skip_empty_slots() {
        let loc = |id| Location {
            id,
            name: String::new(),
            mode: None,
            extra: serde_json::Map::new(),
        };
        let sel = NetworkSelection {
            primary: Some(loc(1)),
            secondary: None,
            tertiary: Some(loc(3)),
        };
        assert_eq!(sel.ids(), vec![1, 3]);
    }
}
