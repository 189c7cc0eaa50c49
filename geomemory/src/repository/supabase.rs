//! PostgREST repository: table insert and the `get_nearby_memories` RPC.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{parse_point, to_ewkt, GeoRepository};
use crate::error::ClientError;
use crate::model::{Coordinate, MemoryRecord};
use crate::supabase::SupabaseAuth;

/// Table used when `SUPABASE_TABLE` is not set.
pub const DEFAULT_TABLE: &str = "memories";
/// Postgres function performing the radius query; takes `(lat, lon, radius_meters)`.
pub const NEARBY_MEMORIES_RPC: &str = "get_nearby_memories";

/// Insert payload. Column names follow the `memories` table.
#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    user_id: &'a str,
    location: String,
    poi_name: &'a str,
    poi_address: &'a str,
    adcode: &'a str,
    image_url: &'a str,
    content: &'a str,
    tags: &'a BTreeSet<String>,
    mood: &'a str,
}

impl<'a> From<&'a MemoryRecord> for InsertRow<'a> {
    fn from(r: &'a MemoryRecord) -> Self {
        Self {
            user_id: &r.owner_id,
            location: to_ewkt(r.location),
            poi_name: &r.poi_name,
            poi_address: &r.poi_address,
            adcode: &r.admin_code,
            image_url: &r.image_url,
            content: &r.content,
            tags: &r.tags,
            mood: &r.mood,
        }
    }
}

/// One row returned by the RPC. Every column is optional so a partial projection still decodes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NearbyRow {
    user_id: Option<String>,
    location: Option<Value>,
    poi_name: Option<String>,
    poi_address: Option<String>,
    adcode: Option<String>,
    image_url: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
    mood: Option<String>,
    created_at: Option<String>,
}

impl NearbyRow {
    /// Converts to a record; `None` when the location cannot be decoded.
    fn into_record(self) -> Option<MemoryRecord> {
        let location: Coordinate = parse_point(self.location.as_ref()?)?;
        let created_at = self
            .created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        Some(MemoryRecord {
            owner_id: self.user_id.unwrap_or_default(),
            location,
            poi_name: self.poi_name.unwrap_or_default(),
            poi_address: self.poi_address.unwrap_or_default(),
            admin_code: self.adcode.unwrap_or_default(),
            image_url: self.image_url.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            tags: self.tags.unwrap_or_default().into_iter().collect(),
            mood: self.mood.unwrap_or_default(),
            created_at,
        })
    }
}

/// Repository backed by Supabase PostgREST.
///
/// Inserts into `table` with `Prefer: return=minimal`; radius queries go through the
/// [`NEARBY_MEMORIES_RPC`] function.
#[derive(Debug, Clone)]
pub struct SupabaseRepository {
    auth: SupabaseAuth,
    table: String,
}

impl SupabaseRepository {
    pub fn new(auth: SupabaseAuth, table: impl Into<String>) -> Self {
        Self {
            auth,
            table: table.into(),
        }
    }
}

#[async_trait]
impl GeoRepository for SupabaseRepository {
    async fn insert(&self, record: &MemoryRecord) -> Result<(), ClientError> {
        let row = InsertRow::from(record);
        let request = self
            .auth
            .post(&format!("/rest/v1/{}", self.table))
            .header("Prefer", "return=minimal")
            .json(&row);
        self.auth.send("memory insert", request).await?;
        debug!(table = %self.table, location = %row.location, "memory inserted");
        Ok(())
    }

    async fn query_nearby(
        &self,
        coord: Coordinate,
        radius_meters: u32,
    ) -> Result<Vec<MemoryRecord>, ClientError> {
        let request = self
            .auth
            .post(&format!("/rest/v1/rpc/{}", NEARBY_MEMORIES_RPC))
            .json(&json!({
                "lat": coord.latitude,
                "lon": coord.longitude,
                "radius_meters": radius_meters,
            }));
        let response = self.auth.send("nearby memories", request).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest("nearby memories read failed", e))?;
        // PostgREST answers `null` when the function returns no set.
        let rows: Option<Vec<NearbyRow>> = serde_json::from_str(&text)
            .map_err(|e| ClientError::InvalidResponse(format!("nearby memories json: {}", e)))?;
        let rows = rows.unwrap_or_default();
        let total = rows.len();
        let records: Vec<MemoryRecord> = rows.into_iter().filter_map(NearbyRow::into_record).collect();
        if records.len() < total {
            warn!(
                skipped = total - records.len(),
                "nearby memories: rows without a decodable location were skipped"
            );
        }
        Ok(records)
    }
}
