//! Domain types shared by leaf clients and pipelines.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PipelineError;

/// A WGS84 position. Axis order only matters at provider boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Builds a coordinate, rejecting NaN and out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, PipelineError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(PipelineError::Validation(format!(
                "latitude must be within [-90, 90], got {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(PipelineError::Validation(format!(
                "longitude must be within [-180, 180], got {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Result of reverse geocoding a coordinate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceInfo {
    pub name: Option<String>,
    pub address: Option<String>,
    pub admin_code: Option<String>,
}

impl PlaceInfo {
    /// Best human-readable label: address first, then name.
    pub fn label(&self) -> Option<&str> {
        self.address.as_deref().or(self.name.as_deref())
    }
}

/// One entry of a nearby search, in provider order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub name: String,
    pub address: String,
    /// The provider's full POI object (id, type, distance, location, ...).
    #[serde(default)]
    pub raw_fields: Map<String, Value>,
}

impl PointOfInterest {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            raw_fields: Map::new(),
        }
    }
}

/// A persisted check-in. Write-once: built by the check-in pipeline, owned by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub owner_id: String,
    pub location: Coordinate,
    pub poi_name: String,
    pub poi_address: String,
    pub admin_code: String,
    pub image_url: String,
    pub content: String,
    pub tags: BTreeSet<String>,
    pub mood: String,
    /// Assigned by the database; `None` on records not yet persisted.
    pub created_at: Option<DateTime<Utc>>,
}

/// Merged, capped view produced by the exploration pipeline. Not persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplorationResult {
    pub nearby_places: Vec<PointOfInterest>,
    pub nearby_memories: Vec<MemoryRecord>,
    /// Number of POIs the provider returned before capping.
    pub places_found: usize,
    /// Number of memories the repository returned before capping.
    pub memories_found: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_accepts_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    /// **Scenario**: Out-of-range or non-finite values are validation errors.
    #[test]
    fn coordinate_rejects_out_of_range_and_nan() {
        for (lat, lon) in [(90.1, 0.0), (0.0, -180.5), (f64::NAN, 0.0), (0.0, f64::INFINITY)] {
            let err = Coordinate::new(lat, lon).unwrap_err();
            assert!(matches!(err, PipelineError::Validation(_)), "{:?}", err);
        }
    }

    #[test]
    fn place_label_prefers_address() {
        let p = PlaceInfo {
            name: Some("Pleasant Bakery".into()),
            address: Some("123 Lake Rd".into()),
            admin_code: None,
        };
        assert_eq!(p.label(), Some("123 Lake Rd"));
        let p = PlaceInfo {
            name: Some("Pleasant Bakery".into()),
            ..Default::default()
        };
        assert_eq!(p.label(), Some("Pleasant Bakery"));
        assert_eq!(PlaceInfo::default().label(), None);
    }
}
