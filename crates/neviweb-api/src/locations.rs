// Location (network) endpoints
//
// Locations are account-scoped: `/api/locations?account$id={id}`. Up to
// three are selected for polling, by configured name or by position.

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::client::NeviwebClient;
use crate::codes::VendorError;
use crate::error::Error;
use crate::models::{Location, NetworkSelection, OccupancyMode};

impl NeviwebClient {
    /// List every location visible to the logged-in account.
    ///
    /// `GET /api/locations?account$id={account}`
    pub async fn list_locations(&self) -> Result<Vec<Location>, Error> {
        let account = self.account_id().ok_or(Error::NotAuthenticated)?;
        let mut url = self.api_url("locations")?;
        url.query_pairs_mut().append_pair("account$id", &account);
        debug!("listing locations");
        decode_list(self.get(url).await?)
    }

    /// Discover the account's locations and pick up to three.
    ///
    /// Configured names are matched exactly, then case-insensitively.
    /// Names that match nothing are logged with the available names and
    /// otherwise skipped. The selection is cached on the client.
    pub async fn discover_networks(&self) -> Result<NetworkSelection, Error> {
        let locations = self.list_locations().await?;
        let selection = select_networks(&locations, &self.config().network_names);
        info!(networks = ?selection.ids(), "selected Neviweb networks");
        self.set_networks(selection.clone());
        Ok(selection)
    }

    /// Pending notifications for a location.
    ///
    /// `GET /api/location/{id}/notifications`
    pub async fn get_location_notifications(&self, location_id: u64) -> Result<Vec<Value>, Error> {
        let url = self.api_url(&format!("location/{location_id}/notifications"))?;
        debug!(location_id, "fetching location notifications");
        decode_list(self.get(url).await?)
    }

    /// Switch a location between home and away.
    ///
    /// `PUT /api/location/{id}` with `{"mode": "..."}`, using the same
    /// best-effort retry as attribute writes.
    pub async fn set_occupancy_mode(
        &self,
        location_id: u64,
        mode: &OccupancyMode,
    ) -> Result<(), Error> {
        let url = self.api_url(&format!("location/{location_id}"))?;
        debug!(location_id, mode = mode.as_str(), "setting occupancy mode");
        self.put_with_retry(url, &json!({ "mode": mode.as_str() }))
            .await
    }
}

/// Pick up to three locations for the configured name slots.
///
/// With no names configured, the first three locations are taken in list
/// order. Otherwise each named slot takes the location whose name matches
/// exactly, falling back to a case-insensitive comparison; unnamed slots
/// stay empty.
pub fn select_networks(locations: &[Location], names: &[Option<String>; 3]) -> NetworkSelection {
    let names: Vec<Option<&str>> = names
        .iter()
        .map(|n| n.as_deref().filter(|n| !n.trim().is_empty()))
        .collect();

    if names.iter().all(Option::is_none) {
        let mut it = locations.iter().cloned();
        return NetworkSelection {
            primary: it.next(),
            secondary: it.next(),
            tertiary: it.next(),
        };
    }

    let mut picked: [Option<Location>; 3] = [None, None, None];
    for (slot, name) in names.into_iter().enumerate() {
        let Some(name) = name else { continue };
        let found = locations.iter().find(|l| l.name == name).or_else(|| {
            let folded = name.to_lowercase();
            locations.iter().find(|l| l.name.to_lowercase() == folded)
        });
        match found {
            Some(loc) => picked[slot] = Some(loc.clone()),
            None => {
                let available: Vec<&str> = locations.iter().map(|l| l.name.as_str()).collect();
                warn!(
                    slot = slot + 1,
                    configured = name,
                    ?available,
                    "network name not found; check spelling in the configuration"
                );
            }
        }
    }

    let [primary, secondary, tertiary] = picked;
    NetworkSelection {
        primary,
        secondary,
        tertiary,
    }
}

/// Decode a JSON array response, surfacing vendor errors as `Err`.
pub(crate) fn decode_list<T: serde::de::DeserializeOwned>(value: Value) -> Result<Vec<T>, Error> {
    if let Some(err) = VendorError::from_body(&value) {
        return Err(Error::Vendor(err));
    }
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}
