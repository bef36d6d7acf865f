use crate::error::ServiceError;
use serde::Deserialize;

/// Body of `GET /api/map`. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LocationSnapshot {
    #[serde(default, rename = "latlng")]
    pub coordinates: Option<(f64, f64)>,
    #[serde(default)]
    pub map_url: Option<String>,
}

impl LocationSnapshot {
    pub fn is_available(&self) -> bool {
        self.map_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    pub fn coordinates_label(&self) -> Option<String> {
        self.coordinates
            .map(|(lat, lng)| format!("Lat {:.4}, Lng {:.4}", lat, lng))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationStatus {
    Loading,
    Loaded(LocationSnapshot),
}

/// One-shot location fetch for the current connection.
#[derive(Debug)]
pub struct LocationFlow {
    status: LocationStatus,
}

impl LocationFlow {
    /// A flow whose request has just been issued.
    pub fn start() -> Self {
        Self {
            status: LocationStatus::Loading,
        }
    }

    pub fn status(&self) -> &LocationStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LocationStatus::Loading
    }

    pub fn snapshot(&self) -> Option<&LocationSnapshot> {
        match &self.status {
            LocationStatus::Loaded(s) => Some(s),
            LocationStatus::Loading => None,
        }
    }

    /// Settle the fetch. A failure renders the same as an empty snapshot.
    /// Only the first result is applied.
    pub fn finish(&mut self, result: Result<LocationSnapshot, ServiceError>) -> bool {
        if !self.is_loading() {
            return false;
        }
        let snapshot = match result {
            Ok(s) => s,
            Err(e) => {
                log::warn!("[location] failed to load map: {}", e);
                LocationSnapshot::default()
            }
        };
        self.status = LocationStatus::Loaded(snapshot);
        true
    }
}
