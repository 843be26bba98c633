// Energy consumption history
//
// `GET /api/device/{id}/energy/{hourly|daily|monthly}`. The bucket list
// arrives under `history` (newer firmware) or `values`. A payload with
// neither, or a gateway `ReadTimeout`, is a degraded response. Any other
// vendor code is an error the caller must act on (an expired session
// needs a reconnect).

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::NeviwebClient;
use crate::codes::{ErrorCode, VendorError};
use crate::error::Error;
use crate::models::{EnergyBucket, StatsPeriod};

impl NeviwebClient {
    /// Fetch consumption buckets for a device.
    ///
    /// Returns `Ok(None)` (with a warning) when the payload lacks both
    /// `history` and `values` or the gateway timed out. Other vendor codes
    /// come back as [`Error::Vendor`].
    pub async fn get_device_stats(
        &self,
        device_id: u64,
        period: StatsPeriod,
    ) -> Result<Option<Vec<EnergyBucket>>, Error> {
        let url = self.api_url(&format!("device/{device_id}/energy/{period}"))?;
        debug!(device_id, %period, "fetching energy stats");
        let value = self.get(url).await?;
        extract_buckets(device_id, period, value)
    }

    pub async fn get_device_hourly_stats(
        &self,
        device_id: u64,
    ) -> Result<Option<Vec<EnergyBucket>>, Error> {
        self.get_device_stats(device_id, StatsPeriod::Hourly).await
    }

    pub async fn get_device_daily_stats(
        &self,
        device_id: u64,
    ) -> Result<Option<Vec<EnergyBucket>>, Error> {
        self.get_device_stats(device_id, StatsPeriod::Daily).await
    }

    pub async fn get_device_monthly_stats(
        &self,
        device_id: u64,
    ) -> Result<Option<Vec<EnergyBucket>>, Error> {
        self.get_device_stats(device_id, StatsPeriod::Monthly).await
    }
}

fn extract_buckets(
    device_id: u64,
    period: StatsPeriod,
    mut value: Value,
) -> Result<Option<Vec<EnergyBucket>>, Error> {
    if let Some(err) = VendorError::from_body(&value) {
        if err.code == ErrorCode::ReadTimeout {
            warn!(device_id, %period, "energy stats read timed out");
            return Ok(None);
        }
        return Err(Error::Vendor(err));
    }

    let key = if value.get("history").is_some() {
        "history"
    } else {
        "values"
    };
    let Some(list) = value.get_mut(key).map(Value::take) else {
        warn!(device_id, %period, "energy stats payload has no history");
        return Ok(None);
    };

    match serde_json::from_value::<Vec<EnergyBucket>>(list) {
        Ok(buckets) => Ok(Some(buckets)),
        Err(e) => {
            warn!(device_id, %period, error = %e, "malformed energy stats payload");
            Ok(None)
        }
    }
}
