//! Image storage: persist bytes, get back a retrievable URL.
//!
//! The store does no image validation; callers decode and check payloads first.

mod memory;
mod supabase;

pub use memory::InMemoryBlobStore;
pub use supabase::{content_type_for, SupabaseStorage, DEFAULT_BUCKET};

use async_trait::async_trait;

use crate::error::ClientError;

/// Blob storage capability used by the check-in pipeline.
///
/// **Interaction**: `CheckinPipeline` calls `store` once per check-in, before geocoding.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `name` and returns a URL that can later be fetched.
    async fn store(&self, bytes: Vec<u8>, name: &str) -> Result<String, ClientError>;
}
