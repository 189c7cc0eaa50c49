//! # geomemory
//!
//! Geotagged "memories" (photo + comment) recorded at a location, and exploration of the
//! points of interest and memories around a location.
//!
//! ## Pipelines
//!
//! - [`CheckinPipeline`]: decode image → store it → reverse geocode → compose → persist.
//!   Strictly sequential; every failure aborts and is reported by stage.
//! - [`ExplorePipeline`]: nearby POI search and nearby memory query run concurrently, then
//!   merge (5 places, 3 memories). A failed memory query degrades to "no memories".
//!
//! ## Capabilities
//!
//! | Trait                 | Production             | Tests / dev             |
//! |-----------------------|------------------------|-------------------------|
//! | [`GeocodingProvider`] | [`AmapClient`]         | [`MockGeocoder`]        |
//! | [`BlobStore`]         | [`SupabaseStorage`]    | [`InMemoryBlobStore`]   |
//! | [`GeoRepository`]     | [`SupabaseRepository`] | `InMemoryRepository`    |
//!
//! `InMemoryRepository` needs the `in-memory` feature (default on).
//!
//! ## Façade
//!
//! [`GeoMemoryService`] exposes `publish_checkin` and `explore_nearby` as strings;
//! [`GeoMemoryToolSource`] exposes the same operations as tools. [`build_service`] wires the
//! production clients from [`ServiceConfig::from_env`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use geomemory::{ExploreRequest, GeoMemoryService, InMemoryBlobStore, InMemoryRepository, MockGeocoder};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let service = GeoMemoryService::new(
//!     Arc::new(MockGeocoder::bakery_example()),
//!     Arc::new(InMemoryBlobStore::new()),
//!     Arc::new(InMemoryRepository::new()),
//! );
//! let summary = service
//!     .explore_nearby(&ExploreRequest { latitude: 30.263, longitude: 120.122, radius: None })
//!     .await
//!     .unwrap();
//! println!("{}", summary);
//! # }
//! ```

pub mod blob_store;
pub mod checkin;
pub mod compose;
pub mod config;
pub mod error;
pub mod explore;
pub mod geocoding;
pub mod model;
pub mod repository;
pub mod service;
pub mod supabase;
pub mod tool_source;

pub use blob_store::{BlobStore, InMemoryBlobStore, SupabaseStorage};
pub use checkin::{CheckinPipeline, CheckinReceipt, CheckinRequest, DEFAULT_OWNER_ID};
pub use compose::{ComposedContent, ContentComposer, TemplateComposer};
pub use config::{ConfigError, ServiceConfig};
pub use error::{ClientError, PipelineError};
pub use explore::{format_summary, ExplorePipeline, ExploreRequest};
pub use geocoding::{AmapClient, GeocodingProvider, MockGeocoder};
pub use model::{Coordinate, ExplorationResult, MemoryRecord, PlaceInfo, PointOfInterest};
#[cfg(feature = "in-memory")]
pub use repository::InMemoryRepository;
pub use repository::{GeoRepository, SupabaseRepository};
pub use service::{build_service, GeoMemoryService};
pub use supabase::SupabaseAuth;
pub use tool_source::{
    GeoMemoryToolSource, ToolCallContent, ToolSource, ToolSourceError, ToolSpec,
    TOOL_EXPLORE_NEARBY, TOOL_PUBLISH_CHECKIN,
};
