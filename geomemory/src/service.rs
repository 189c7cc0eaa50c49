//! Service façade: the two externally invocable operations.
//!
//! [`GeoMemoryService`] owns both pipelines and returns the human-readable strings callers
//! see. [`build_service`] wires the production clients from a [`ServiceConfig`].

use std::sync::Arc;

use tracing::info;

use crate::blob_store::{BlobStore, SupabaseStorage};
use crate::checkin::{CheckinPipeline, CheckinRequest};
use crate::config::{ConfigError, ServiceConfig};
use crate::error::PipelineError;
use crate::explore::{format_summary, ExplorePipeline, ExploreRequest};
use crate::geocoding::{AmapClient, GeocodingProvider};
use crate::repository::{GeoRepository, SupabaseRepository};
use crate::supabase::SupabaseAuth;

/// Façade over the check-in and exploration pipelines.
///
/// **Interaction**: Wrapped by `GeoMemoryToolSource` for tool-style RPC; built by
/// [`build_service`] or [`GeoMemoryService::new`] with any capability implementations.
pub struct GeoMemoryService {
    checkin: CheckinPipeline,
    explore: ExplorePipeline,
}

impl GeoMemoryService {
    /// Builds both pipelines over shared collaborators.
    pub fn new(
        geocoder: Arc<dyn GeocodingProvider>,
        blob_store: Arc<dyn BlobStore>,
        repository: Arc<dyn GeoRepository>,
    ) -> Self {
        Self::from_pipelines(
            CheckinPipeline::new(geocoder.clone(), blob_store, repository.clone()),
            ExplorePipeline::new(geocoder, repository),
        )
    }

    /// Uses pre-configured pipelines (custom composer, owner id).
    pub fn from_pipelines(checkin: CheckinPipeline, explore: ExplorePipeline) -> Self {
        Self { checkin, explore }
    }

    /// `publish_checkin`: returns the confirmation message.
    pub async fn publish_checkin(&self, request: &CheckinRequest) -> Result<String, PipelineError> {
        let receipt = self.checkin.run(request).await?;
        Ok(receipt.message())
    }

    /// `explore_nearby`: returns the formatted summary.
    pub async fn explore_nearby(&self, request: &ExploreRequest) -> Result<String, PipelineError> {
        let result = self.explore.run(request).await?;
        Ok(format_summary(&result))
    }
}

/// Builds the production service: AMap geocoding, Supabase Storage and PostgREST.
pub fn build_service(config: &ServiceConfig) -> Result<GeoMemoryService, ConfigError> {
    let geocoder: Arc<dyn GeocodingProvider> = Arc::new(AmapClient::new(
        config.amap_api_key.clone(),
        config.amap_base_url.clone(),
        config.http_timeout,
    )?);
    let auth = SupabaseAuth::new(
        config.supabase_url.clone(),
        config.supabase_key.clone(),
        config.http_timeout,
    )?;
    let blob_store: Arc<dyn BlobStore> =
        Arc::new(SupabaseStorage::new(auth.clone(), config.supabase_bucket.clone()));
    let repository: Arc<dyn GeoRepository> =
        Arc::new(SupabaseRepository::new(auth, config.supabase_table.clone()));

    info!(
        amap_base_url = %config.amap_base_url,
        supabase_url = %config.supabase_url,
        bucket = %config.supabase_bucket,
        table = %config.supabase_table,
        timeout_secs = config.http_timeout.as_secs(),
        "geomemory service built"
    );

    Ok(GeoMemoryService::from_pipelines(
        CheckinPipeline::new(geocoder.clone(), blob_store, repository.clone())
            .with_owner_id(config.owner_id.clone()),
        ExplorePipeline::new(geocoder, repository),
    ))
}
