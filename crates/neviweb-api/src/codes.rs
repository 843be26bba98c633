// Vendor application error codes
//
// Neviweb reports application failures with HTTP 200 and a body of the form
// `{"error": {"code": "USRSESSEXP", ...}}`, or `{"errorCode": "ReadTimeout"}`
// when the gateway could not reach the device in time. Codes are decoded
// once here into a closed enum; consumers branch on `Disposition`.

use std::str::FromStr;

use serde_json::Value;
use strum::EnumString;

/// Known Neviweb error codes, with a catch-all for anything new.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
pub enum ErrorCode {
    /// Session expired; a fresh login is required.
    #[strum(serialize = "USRSESSEXP")]
    SessionExpired,
    /// Too many sessions open for this account.
    #[strum(serialize = "ACCSESSEXC")]
    TooManySessions,
    /// Wrong username or password.
    #[strum(serialize = "USRBADLOGIN")]
    BadLogin,
    /// Daily request quota for the account is exhausted.
    #[strum(serialize = "ACCDAYREQMAX")]
    DailyRequestLimit,
    /// Vendor maintenance window.
    #[strum(serialize = "MAINTENANCE")]
    Maintenance,
    /// Device unavailable or disconnected from its gateway.
    #[strum(serialize = "DVCUNVLB")]
    DeviceUnavailable,
    #[strum(serialize = "DVCBUSY")]
    DeviceBusy,
    #[strum(serialize = "DVCCOMMTO")]
    DeviceCommTimeout,
    #[strum(serialize = "DVCACTNSPTD")]
    ActionNotSupported,
    #[strum(serialize = "DVCATTRNSPTD")]
    AttributeNotSupported,
    #[strum(serialize = "DVCERR")]
    DeviceError,
    #[strum(serialize = "SVCERR")]
    ServiceError,
    #[strum(serialize = "SVCINVREQ")]
    InvalidRequest,
    /// The account is not allowed to use this service.
    #[strum(serialize = "SVCUNAUTH")]
    Unauthorized,
    #[strum(serialize = "VALINVLD")]
    InvalidValue,
    /// Gateway read timeout, reported as `{"errorCode": "ReadTimeout"}`.
    #[strum(serialize = "ReadTimeout")]
    ReadTimeout,
    #[strum(default)]
    Unknown(String),
}

/// What a consumer should do when it observes an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Log a warning and carry on.
    Log,
    /// Surface a user-facing notification.
    Notify,
    /// The session is gone: run one reconnect cycle.
    Reconnect,
    /// Stop polling the device for the snooze window.
    Deactivate,
}

impl ErrorCode {
    /// Decode a raw vendor code string. Never fails.
    pub fn parse(raw: &str) -> Self {
        Self::from_str(raw).unwrap_or_else(|_| Self::Unknown(raw.to_owned()))
    }

    /// The wire representation of this code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SessionExpired => "USRSESSEXP",
            Self::TooManySessions => "ACCSESSEXC",
            Self::BadLogin => "USRBADLOGIN",
            Self::DailyRequestLimit => "ACCDAYREQMAX",
            Self::Maintenance => "MAINTENANCE",
            Self::DeviceUnavailable => "DVCUNVLB",
            Self::DeviceBusy => "DVCBUSY",
            Self::DeviceCommTimeout => "DVCCOMMTO",
            Self::ActionNotSupported => "DVCACTNSPTD",
            Self::AttributeNotSupported => "DVCATTRNSPTD",
            Self::DeviceError => "DVCERR",
            Self::ServiceError => "SVCERR",
            Self::InvalidRequest => "SVCINVREQ",
            Self::Unauthorized => "SVCUNAUTH",
            Self::InvalidValue => "VALINVLD",
            Self::ReadTimeout => "ReadTimeout",
            Self::Unknown(raw) => raw,
        }
    }

    /// Fixed mapping from code to consumer action.
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::SessionExpired => Disposition::Reconnect,
            Self::TooManySessions | Self::BadLogin | Self::DailyRequestLimit | Self::Unauthorized => {
                Disposition::Notify
            }
            Self::DeviceUnavailable => Disposition::Deactivate,
            Self::Maintenance
            | Self::DeviceBusy
            | Self::DeviceCommTimeout
            | Self::ActionNotSupported
            | Self::AttributeNotSupported
            | Self::DeviceError
            | Self::ServiceError
            | Self::InvalidRequest
            | Self::InvalidValue
            | Self::ReadTimeout
            | Self::Unknown(_) => Disposition::Log,
        }
    }

    /// Human-readable description used in log lines and notifications.
    pub fn description(&self) -> &'static str {
        match self {
            Self::SessionExpired => "session expired, reconnecting",
            Self::TooManySessions => {
                "too many active sessions; close other Neviweb sessions or wait for them to expire"
            }
            Self::BadLogin => "login failed, check username and password",
            Self::DailyRequestLimit => "maximum daily requests reached, increase the scan interval",
            Self::Maintenance => "Neviweb is under maintenance, retry later",
            Self::DeviceUnavailable => "device unavailable or disconnected from its gateway",
            Self::DeviceBusy => "device busy, will retry on next update",
            Self::DeviceCommTimeout => "device communication timeout",
            Self::ActionNotSupported => "device action not supported",
            Self::AttributeNotSupported => "device attribute not supported",
            Self::DeviceError => "device reported an error",
            Self::ServiceError => "Neviweb service error",
            Self::InvalidRequest => "invalid request sent to Neviweb",
            Self::Unauthorized => "service not authorized for this account",
            Self::InvalidValue => "invalid value sent to device",
            Self::ReadTimeout => "gateway read timeout",
            Self::Unknown(_) => "unknown Neviweb error",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An in-band vendor error, with the raw body kept for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorError {
    pub code: ErrorCode,
    pub raw: Value,
}

impl VendorError {
    /// Extract a vendor error from a decoded response body, if it carries one.
    ///
    /// Recognizes `{"error": {"code": "..."}}` and `{"errorCode": "..."}`.
    pub fn from_body(body: &Value) -> Option<Self> {
        let code = body
            .get("error")
            .and_then(|e| e.get("code"))
            .or_else(|| body.get("errorCode"))
            .and_then(Value::as_str)?;
        Some(Self {
            code: ErrorCode::parse(code),
            raw: body.clone(),
        })
    }

    pub fn disposition(&self) -> Disposition {
        self.code.disposition()
    }
}

impl std::fmt::Display for VendorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code, self.code.description())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn known_codes_round_trip_through_wire_form() {
        for raw in ["USRSESSEXP", "ACCSESSEXC", "MAINTENANCE", "DVCUNVLB", "DVCBUSY"] {
            assert_eq!(ErrorCode::parse(raw).as_str(), raw);
        }
    }

    #[test]
    fn unknown_code_is_preserved() {
        let code = ErrorCode::parse("NEWCODE");
        assert_eq!(code, ErrorCode::Unknown("NEWCODE".into()));
        assert_eq!(code.disposition(), Disposition::Log);
        assert_eq!(code.to_string(), "NEWCODE");
    }

    #[test]
    fn dispositions_follow_the_table() {
        assert_eq!(ErrorCode::SessionExpired.disposition(), Disposition::Reconnect);
        assert_eq!(ErrorCode::TooManySessions.disposition(), Disposition::Notify);
        assert_eq!(ErrorCode::DeviceUnavailable.disposition(), Disposition::Deactivate);
        assert_eq!(ErrorCode::Maintenance.disposition(), Disposition::Log);
    }

    #[test]
    fn vendor_error_from_nested_error_object() {
        let body = json!({"error": {"code": "DVCUNVLB", "data": {}}});
        let err = VendorError::from_body(&body).expect("vendor error");
        assert_eq!(err.code, ErrorCode::DeviceUnavailable);
    }

    #[test]
    fn vendor_error_from_flat_error_code() {
        let body = json!({"errorCode": "ReadTimeout"});
        let err = VendorError::from_body(&body).expect("vendor error");
        assert_eq!(err.code, ErrorCode::ReadTimeout);
    }

    #[test]
    fn plain_payload_is_not_an_error() {
        assert!(VendorError::from_body(&json!({"roomTemperature": 21.5})).is_none());
    }
}
