//! Reverse geocoding and nearby POI search.
//!
//! [`GeocodingProvider`] is the seam the pipelines depend on. [`AmapClient`] talks to the
//! AMap REST v3 API; [`MockGeocoder`] returns fixed data for tests and examples.

mod amap;
mod mock;

pub use amap::{location_param, AmapClient, DEFAULT_AMAP_BASE_URL};
pub use mock::MockGeocoder;

use async_trait::async_trait;

use crate::error::ClientError;
use crate::model::{Coordinate, PlaceInfo, PointOfInterest};

/// Radius used by nearby search when the caller does not give one.
pub const DEFAULT_SEARCH_RADIUS_METERS: u32 = 500;
/// Largest radius the provider accepts.
pub const MAX_SEARCH_RADIUS_METERS: u32 = 50_000;
/// Page size requested from the nearby search.
pub const MAX_SEARCH_RESULTS: usize = 20;

/// Resolves coordinates to places and lists points of interest around them.
///
/// Implementations hold only configuration and are shared across concurrent requests.
///
/// **Interaction**: Used by `CheckinPipeline` (reverse_geocode) and `ExplorePipeline`
/// (search_nearby).
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Resolves `coord` to a place. On success the name is never empty when an address is known.
    async fn reverse_geocode(&self, coord: Coordinate) -> Result<PlaceInfo, ClientError>;

    /// Lists up to [`MAX_SEARCH_RESULTS`] POIs within `radius_meters`, in provider order.
    async fn search_nearby(
        &self,
        coord: Coordinate,
        radius_meters: u32,
    ) -> Result<Vec<PointOfInterest>, ClientError>;
}
