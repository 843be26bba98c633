// Device endpoints
//
// Device listing is location-scoped (`/api/devices?location$id={id}`);
// everything else hangs off `/api/device/{id}/...`. Reads return vendor
// errors in-band as `AttributeReply::Error`; writes retry, then log.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::NeviwebClient;
use crate::codes::{ErrorCode, VendorError};
use crate::error::Error;
use crate::locations::decode_list;
use crate::models::{AttributeReply, GatewayDevice, Signature};

/// Attribute holding the device's current error code bitmap.
pub const ERROR_CODE_ATTRIBUTE: &str = "errorCodeSet1";

impl NeviwebClient {
    /// List the devices of one location, each enriched with its signature.
    ///
    /// `GET /api/devices?location$id={id}`, then one
    /// `GET /api/device/{id}/attribute?attributes=signature` per device.
    pub async fn fetch_gateway_devices(&self, network_id: u64) -> Result<Vec<GatewayDevice>, Error> {
        let mut url = self.api_url("devices")?;
        url.query_pairs_mut()
            .append_pair("location$id", &network_id.to_string());
        debug!(network_id, "listing gateway devices");

        let mut devices: Vec<GatewayDevice> = decode_list(self.get(url).await?)?;

        for device in &mut devices {
            if device.location_id.is_none() {
                device.location_id = Some(network_id);
            }
            match self.get_device_attributes(device.id, &["signature"]).await? {
                AttributeReply::Attributes(mut attrs) => {
                    device.signature = attrs
                        .remove("signature")
                        .and_then(|v| serde_json::from_value::<Signature>(v).ok());
                }
                other => {
                    debug!(device_id = device.id, reply = ?other, "no signature for device");
                }
            }

            if let Some(sig) = &device.signature {
                if needs_miwi_hint(sig, self.config().ignore_miwi) {
                    warn!(
                        device_id = device.id,
                        name = %device.name,
                        model = sig.model,
                        "miwi device is not supported by this client; set ignore_miwi to silence"
                    );
                }
            }
        }

        info!(network_id, count = devices.len(), "gateway devices fetched");
        Ok(devices)
    }

    /// Read named attributes of a device.
    ///
    /// `GET /api/device/{id}/attribute?attributes=a,b,c`
    ///
    /// Vendor errors come back in-band; a gateway or HTTP timeout is
    /// [`AttributeReply::ReadTimeout`]. Only network failures are `Err`.
    pub async fn get_device_attributes(
        &self,
        device_id: u64,
        attributes: &[&str],
    ) -> Result<AttributeReply, Error> {
        let mut url = self.api_url(&format!("device/{device_id}/attribute"))?;
        url.query_pairs_mut()
            .append_pair("attributes", &attributes.join(","));
        self.get_in_band(url).await
    }

    /// Write attributes to a device.
    ///
    /// `PUT /api/device/{id}/attribute`
    ///
    /// On an in-band vendor error the write is retried, up to three
    /// attempts in total, then dropped with a warning. Only transport
    /// failures are `Err`.
    pub async fn set_device_attributes(
        &self,
        device_id: u64,
        data: &(impl Serialize + Sync),
    ) -> Result<(), Error> {
        let url = self.api_url(&format!("device/{device_id}/attribute"))?;
        debug!(device_id, "writing device attributes");
        self.put_with_retry(url, data).await
    }

    /// Device connectivity status.
    ///
    /// `GET /api/device/{id}/status`
    pub async fn get_device_status(&self, device_id: u64) -> Result<AttributeReply, Error> {
        let url = self.api_url(&format!("device/{device_id}/status"))?;
        self.get_in_band(url).await
    }

    /// Active alerts for a device.
    ///
    /// `GET /api/device/{id}/alert`
    pub async fn get_device_alert(&self, device_id: u64) -> Result<AttributeReply, Error> {
        let url = self.api_url(&format!("device/{device_id}/alert"))?;
        self.get_in_band(url).await
    }

    /// The device's error-code attribute.
    pub async fn get_device_error_code(&self, device_id: u64) -> Result<AttributeReply, Error> {
        self.get_device_attributes(device_id, &[ERROR_CODE_ATTRIBUTE])
            .await
    }

    /// GET that folds vendor errors and timeouts into an `AttributeReply`.
    async fn get_in_band(&self, url: url::Url) -> Result<AttributeReply, Error> {
        let value = match self.get(url.clone()).await {
            Ok(value) => value,
            Err(e) if e.is_timeout() => {
                warn!(%url, "read timed out");
                return Ok(AttributeReply::ReadTimeout);
            }
            Err(e) => return Err(e),
        };

        if let Some(err) = VendorError::from_body(&value) {
            if err.code == ErrorCode::ReadTimeout {
                debug!(%url, "gateway read timeout");
                return Ok(AttributeReply::ReadTimeout);
            }
            debug!(%url, code = %err.code, "vendor error on read");
            return Ok(AttributeReply::Error(err));
        }

        match value {
            Value::Object(map) => Ok(AttributeReply::Attributes(map)),
            Value::Null => Ok(AttributeReply::Attributes(serde_json::Map::new())),
            other => Err(Error::Deserialization {
                message: "expected a JSON object".into(),
                body: other.to_string(),
            }),
        }
    }
}

/// Miwi radios get a configuration hint unless the account opted out.
fn needs_miwi_hint(signature: &Signature, ignore_miwi: bool) -> bool {
    signature.is_miwi() && !ignore_miwi
}
