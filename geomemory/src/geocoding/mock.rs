//! Mock geocoder for tests and examples: fixed place, fixed POI list, optional failure.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::GeocodingProvider;
use crate::error::ClientError;
use crate::model::{Coordinate, PlaceInfo, PointOfInterest};

/// Which call a [`MockGeocoder`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailOn {
    Nothing,
    ReverseGeocode,
    SearchNearby,
}

/// Deterministic geocoder: every call returns the same configured data.
///
/// Counts calls and records the last coordinate so tests can assert on what the pipelines
/// sent. Failures are reported as `ClientError::Provider`.
///
/// **Interaction**: Implements `GeocodingProvider`; used by pipeline tests in place of
/// `AmapClient`.
pub struct MockGeocoder {
    place: PlaceInfo,
    pois: Vec<PointOfInterest>,
    fail_on: FailOn,
    reverse_calls: AtomicUsize,
    search_calls: AtomicUsize,
    last_coordinate: Mutex<Option<Coordinate>>,
}

impl MockGeocoder {
    /// Creates a mock resolving every coordinate to `place` and listing `pois`.
    pub fn new(place: PlaceInfo, pois: Vec<PointOfInterest>) -> Self {
        Self {
            place,
            pois,
            fail_on: FailOn::Nothing,
            reverse_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            last_coordinate: Mutex::new(None),
        }
    }

    /// A bakery on Lake Road with no POIs around it.
    pub fn bakery_example() -> Self {
        Self::new(
            PlaceInfo {
                name: Some("Pleasant Bakery".to_string()),
                address: Some("123 Lake Rd".to_string()),
                admin_code: Some("330106".to_string()),
            },
            Vec::new(),
        )
    }

    /// Make `reverse_geocode` fail (builder style).
    pub fn failing_reverse_geocode(mut self) -> Self {
        self.fail_on = FailOn::ReverseGeocode;
        self
    }

    /// Make `search_nearby` fail (builder style).
    pub fn failing_search(mut self) -> Self {
        self.fail_on = FailOn::SearchNearby;
        self
    }

    pub fn reverse_geocode_calls(&self) -> usize {
        self.reverse_calls.load(Ordering::SeqCst)
    }

    pub fn search_nearby_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Coordinate passed to the most recent call, if any.
    pub fn last_coordinate(&self) -> Option<Coordinate> {
        self.last_coordinate.lock().ok().and_then(|guard| *guard)
    }

    fn record(&self, coord: Coordinate) {
        if let Ok(mut guard) = self.last_coordinate.lock() {
            *guard = Some(coord);
        }
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::bakery_example()
    }
}

#[async_trait]
impl GeocodingProvider for MockGeocoder {
    async fn reverse_geocode(&self, coord: Coordinate) -> Result<PlaceInfo, ClientError> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        self.record(coord);
        if self.fail_on == FailOn::ReverseGeocode {
            return Err(ClientError::Provider("mock: reverse geocode failed".to_string()));
        }
        Ok(self.place.clone())
    }

    async fn search_nearby(
        &self,
        coord: Coordinate,
        _radius_meters: u32,
    ) -> Result<Vec<PointOfInterest>, ClientError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.record(coord);
        if self.fail_on == FailOn::SearchNearby {
            return Err(ClientError::Provider("mock: nearby search failed".to_string()));
        }
        Ok(self.pois.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Repeating reverse_geocode with the same coordinate yields identical places.
    #[tokio::test]
    async fn reverse_geocode_is_idempotent() {
        let geocoder = MockGeocoder::bakery_example();
        let coord = Coordinate::new(30.263, 120.122).unwrap();
        let first = geocoder.reverse_geocode(coord).await.unwrap();
        let second = geocoder.reverse_geocode(coord).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(geocoder.reverse_geocode_calls(), 2);
        assert_eq!(geocoder.last_coordinate(), Some(coord));
    }

    #[tokio::test]
    async fn failing_search_returns_provider_error() {
        let geocoder = MockGeocoder::default().failing_search();
        let coord = Coordinate::new(0.0, 0.0).unwrap();
        let err = geocoder.search_nearby(coord, 500).await.unwrap_err();
        assert!(matches!(err, ClientError::Provider(_)));
        assert!(geocoder.reverse_geocode(coord).await.is_ok());
    }
}
