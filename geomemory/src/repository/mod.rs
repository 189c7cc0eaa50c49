//! Memory persistence and radius queries.
//!
//! [`GeoRepository`] is the seam used by both pipelines. [`SupabaseRepository`] targets
//! PostgREST over a PostGIS table (see `migrations/0001_memories.sql`);
//! `InMemoryRepository` (feature `in-memory`) filters by great-circle distance.
//!
//! Points cross the database boundary as EWKT `SRID=4326;POINT(lon lat)` on the way in and
//! come back as GeoJSON or (E)WKT, parsed by [`parse_point`].

#[cfg(feature = "in-memory")]
mod memory;
mod supabase;

#[cfg(feature = "in-memory")]
pub use memory::InMemoryRepository;
pub use supabase::{SupabaseRepository, DEFAULT_TABLE, NEARBY_MEMORIES_RPC};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;
use crate::model::{Coordinate, MemoryRecord};

/// Spatial reference id of WGS84 longitude/latitude.
pub const SRID_WGS84: u32 = 4326;

/// Storage for memory records with a server-side radius filter.
///
/// **Interaction**: `CheckinPipeline` inserts once per check-in as its last step;
/// `ExplorePipeline` queries and treats failures as "no memories".
#[async_trait]
pub trait GeoRepository: Send + Sync {
    /// Persists one record. No deduplication.
    async fn insert(&self, record: &MemoryRecord) -> Result<(), ClientError>;

    /// Records within `radius_meters` of `coord`, in the repository's order.
    async fn query_nearby(
        &self,
        coord: Coordinate,
        radius_meters: u32,
    ) -> Result<Vec<MemoryRecord>, ClientError>;
}

/// Encodes a coordinate as EWKT: `SRID=4326;POINT(lon lat)`.
pub fn to_ewkt(coord: Coordinate) -> String {
    format!(
        "SRID={};POINT({} {})",
        SRID_WGS84, coord.longitude, coord.latitude
    )
}

/// Decodes a point returned by the database.
///
/// Accepts a GeoJSON `Point` (as an object or as JSON text) and WKT/EWKT `POINT(lon lat)`.
/// Returns `None` for anything else or for out-of-range values.
pub fn parse_point(value: &Value) -> Option<Coordinate> {
    match value {
        Value::Object(obj) => {
            if obj.get("type").and_then(Value::as_str) != Some("Point") {
                return None;
            }
            let coords = obj.get("coordinates")?.as_array()?;
            let lon = coords.first()?.as_f64()?;
            let lat = coords.get(1)?.as_f64()?;
            Coordinate::new(lat, lon).ok()
        }
        Value::String(s) => {
            let s = s.trim();
            if s.starts_with('{') {
                let parsed: Value = serde_json::from_str(s).ok()?;
                return parse_point(&parsed);
            }
            parse_wkt_point(s)
        }
        _ => None,
    }
}

fn parse_wkt_point(s: &str) -> Option<Coordinate> {
    let wkt = match s.split_once(';') {
        Some((srid, rest)) if srid.trim().to_ascii_uppercase().starts_with("SRID=") => rest,
        Some(_) => return None,
        None => s,
    };
    let wkt = wkt.trim();
    let upper = wkt.to_ascii_uppercase();
    if !upper.starts_with("POINT") {
        return None;
    }
    let inner = wkt[5..].trim().strip_prefix('(')?.strip_suffix(')')?;
    let mut parts = inner.split_whitespace();
    let lon: f64 = parts.next()?.parse().ok()?;
    let lat: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Coordinate::new(lat, lon).ok()
}
