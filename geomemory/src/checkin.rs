//! Check-in ingestion: decode → store image → reverse geocode → compose → persist.
//!
//! Steps run strictly in order, each exactly once. Any failure aborts the remaining steps.
//! The record insert is the last step, so an aborted or cancelled check-in never leaves a
//! partial record. An image uploaded before a failed insert is not removed; the
//! `Persistence` error names it.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Local};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::blob_store::BlobStore;
use crate::compose::{ContentComposer, TemplateComposer};
use crate::error::PipelineError;
use crate::geocoding::GeocodingProvider;
use crate::model::{Coordinate, MemoryRecord, PlaceInfo};
use crate::repository::GeoRepository;

/// Owner recorded on every check-in until a session model exists.
pub const DEFAULT_OWNER_ID: &str = "default_user";

/// Arguments of the `publish_checkin` operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckinRequest {
    /// Image bytes, Base64 (standard alphabet). A `data:<mime>;base64,` prefix is accepted.
    pub image_base64: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub user_comment: Option<String>,
}

/// Outcome of a successful check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckinReceipt {
    pub place: PlaceInfo,
    pub record: MemoryRecord,
}

impl CheckinReceipt {
    /// Confirmation shown to the caller; embeds the resolved address.
    pub fn message(&self) -> String {
        format!(
            "✅ Check-in published! Location: {}",
            self.place.label().unwrap_or("unknown location")
        )
    }
}

/// Decodes the caller's Base64 payload. Malformed or empty input is a validation error.
pub fn decode_image(image_base64: &str) -> Result<Vec<u8>, PipelineError> {
    let payload = image_base64.trim();
    let payload = match payload.strip_prefix("data:") {
        Some(rest) => match rest.split_once(";base64,") {
            Some((_, data)) => data,
            None => {
                return Err(PipelineError::Validation(
                    "data URL must be base64-encoded".to_string(),
                ))
            }
        },
        None => payload,
    };
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| PipelineError::Validation(format!("image is not valid base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(PipelineError::Validation("image is empty".to_string()));
    }
    Ok(bytes)
}

/// Object name for an image uploaded at `now`: `checkin_YYYYmmdd_HHMMSS.jpg`.
///
/// Second resolution; two check-ins within the same second collide.
pub fn image_name(now: DateTime<Local>) -> String {
    format!("checkin_{}.jpg", now.format("%Y%m%d_%H%M%S"))
}

/// Orchestrates one check-in over the three leaf clients.
///
/// Holds shared, read-only collaborators; one instance serves concurrent requests.
///
/// **Interaction**: Called by `GeoMemoryService::publish_checkin`; uses `BlobStore`,
/// `GeocodingProvider`, `ContentComposer` and `GeoRepository` in that order.
pub struct CheckinPipeline {
    geocoder: Arc<dyn GeocodingProvider>,
    blob_store: Arc<dyn BlobStore>,
    repository: Arc<dyn GeoRepository>,
    composer: Arc<dyn ContentComposer>,
    owner_id: String,
}

impl CheckinPipeline {
    /// Creates a pipeline with the template composer and the placeholder owner.
    pub fn new(
        geocoder: Arc<dyn GeocodingProvider>,
        blob_store: Arc<dyn BlobStore>,
        repository: Arc<dyn GeoRepository>,
    ) -> Self {
        Self {
            geocoder,
            blob_store,
            repository,
            composer: Arc::new(TemplateComposer),
            owner_id: DEFAULT_OWNER_ID.to_string(),
        }
    }

    /// Replace the content composer (builder style).
    pub fn with_composer(mut self, composer: Arc<dyn ContentComposer>) -> Self {
        self.composer = composer;
        self
    }

    /// Replace the owner id stamped on records (builder style).
    pub fn with_owner_id(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    /// Runs the check-in. See the module docs for the step order and failure policy.
    pub async fn run(&self, request: &CheckinRequest) -> Result<CheckinReceipt, PipelineError> {
        // 1. Validate and decode. Nothing external is touched on failure.
        let location = Coordinate::new(request.latitude, request.longitude)?;
        let image = decode_image(&request.image_base64)?;
        debug!(size = image.len(), "checkin image decoded");

        // 2. Store the image.
        let name = image_name(Local::now());
        let image_url = self
            .blob_store
            .store(image, &name)
            .await
            .map_err(PipelineError::Storage)?;
        info!(image_url = %image_url, "checkin image stored");

        // 3. Resolve the place.
        let mut place = self
            .geocoder
            .reverse_geocode(location)
            .await
            .map_err(PipelineError::Geocoding)?;
        // A nameless place is named after its address.
        if place.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            place.name = place.address.clone();
        }
        debug!(name = ?place.name, address = ?place.address, "checkin place resolved");

        // 4. Compose.
        let composed = self
            .composer
            .compose(&place, request.user_comment.as_deref());

        // 5. Persist.
        let record = MemoryRecord {
            owner_id: self.owner_id.clone(),
            location,
            poi_name: place.name.clone().unwrap_or_default(),
            poi_address: place.address.clone().unwrap_or_default(),
            admin_code: place.admin_code.clone().unwrap_or_default(),
            image_url,
            content: composed.content,
            tags: composed.tags,
            mood: composed.mood,
            created_at: None,
        };
        if let Err(source) = self.repository.insert(&record).await {
            warn!(
                image_url = %record.image_url,
                error = %source,
                "memory insert failed; uploaded image is orphaned"
            );
            return Err(PipelineError::Persistence {
                image_url: record.image_url,
                source,
            });
        }
        info!(owner_id = %record.owner_id, poi = %record.poi_name, "checkin persisted");
        Ok(CheckinReceipt { place, record })
    }
}
