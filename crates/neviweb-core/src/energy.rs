// ── Energy counter persistence ──
//
// Running kWh totals per device, kept in a small JSON file so the counters
// survive restarts. The file is rewritten wholesale on every save.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use neviweb_api::EnergyBucket;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;

/// Accumulated consumption for one device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyTotal {
    /// Total consumption in Wh.
    pub total_wh: f64,
    /// Date string of the newest bucket already counted.
    #[serde(default)]
    pub last_bucket: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// File-backed energy totals, keyed by device id.
#[derive(Debug)]
pub struct EnergyStore {
    path: PathBuf,
    totals: BTreeMap<String, EnergyTotal>,
}

impl EnergyStore {
    /// Load totals from `path`. A missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let totals = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| storage_error(&path, &e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(storage_error(&path, &e)),
        };
        debug!(path = %path.display(), devices = totals.len(), "energy store loaded");
        Ok(Self { path, totals })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add the buckets not yet counted for `device_id`.
    ///
    /// Buckets are ordered by their date string. On the first sighting of a
    /// device only the newest bucket is counted, so history from before the
    /// store existed is not replayed. Returns the Wh added.
    pub fn record(&mut self, device_id: u64, buckets: &[EnergyBucket]) -> f64 {
        let mut dated: Vec<(&str, f64)> = buckets
            .iter()
            .filter_map(|b| Some((b.date.as_deref()?, b.energy?)))
            .collect();
        dated.sort_by(|a, b| a.0.cmp(b.0));

        let entry = self.totals.entry(device_id.to_string()).or_default();
        let fresh: Vec<(&str, f64)> = match entry.last_bucket.as_deref() {
            Some(last) => dated.into_iter().filter(|(date, _)| *date > last).collect(),
            None => dated.pop().into_iter().collect(),
        };

        let Some((newest, _)) = fresh.last() else {
            return 0.0;
        };
        entry.last_bucket = Some((*newest).to_owned());
        let added: f64 = fresh.iter().map(|(_, wh)| wh).sum();
        entry.total_wh += added;
        entry.updated_at = Some(Utc::now());
        added
    }

    /// Accumulated Wh for a device, if it was ever recorded.
    pub fn total_wh(&self, device_id: u64) -> Option<f64> {
        self.totals.get(&device_id.to_string()).map(|t| t.total_wh)
    }

    pub fn totals(&self) -> &BTreeMap<String, EnergyTotal> {
        &self.totals
    }

    /// Rewrite the backing file, creating parent directories as needed.
    pub fn save(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| storage_error(&self.path, &e))?;
            }
        }
        let json =
            serde_json::to_string_pretty(&self.totals).map_err(|e| storage_error(&self.path, &e))?;
        std::fs::write(&self.path, json).map_err(|e| storage_error(&self.path, &e))?;
        debug!(path = %self.path.display(), "energy store saved");
        Ok(())
    }
}

fn storage_error(path: &Path, err: &dyn std::fmt::Display) -> CoreError {
    CoreError::Storage {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;

    fn bucket(date: &str, wh: f64) -> EnergyBucket {
        EnergyBucket {
            date: Some(date.into()),
            energy: Some(wh),
            extra: Map::new(),
        }
    }

    #[test]
    fn first_sighting_counts_only_newest_bucket() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = EnergyStore::load(dir.path().join("energy.json")).expect("load");

        let added = store.record(7, &[bucket("2024-01-01T01", 100.0), bucket("2024-01-01T00", 50.0)]);
        assert!((added - 100.0).abs() < f64::EPSILON);

        let added = store.record(
            7,
            &[
                bucket("2024-01-01T01", 100.0),
                bucket("2024-01-01T02", 30.0),
                bucket("2024-01-01T03", 20.0),
            ],
        );
        assert!((added - 50.0).abs() < f64::EPSILON);
        assert_eq!(store.total_wh(7), Some(150.0));
    }

    #[test]
    fn totals_survive_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("energy.json");

        let mut store = EnergyStore::load(&path).expect("load");
        store.record(1, &[bucket("2024-02-01", 1200.0)]);
        store.save().expect("save");

        let reloaded = EnergyStore::load(&path).expect("load");
        assert_eq!(reloaded.total_wh(1), Some(1200.0));
        assert_eq!(
            reloaded.totals()["1"].last_bucket.as_deref(),
            Some("2024-02-01")
        );
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("energy.json");
        std::fs::write(&path, "{not json").expect("write");
        assert!(matches!(
            EnergyStore::load(&path),
            Err(CoreError::Storage { .. })
        ));
    }
}
