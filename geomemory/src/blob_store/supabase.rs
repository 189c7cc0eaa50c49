//! Supabase Storage upload: `POST /storage/v1/object/{bucket}/{name}`.

use async_trait::async_trait;
use tracing::debug;

use super::BlobStore;
use crate::error::ClientError;
use crate::supabase::SupabaseAuth;

/// Bucket used when `SUPABASE_BUCKET` is not set.
pub const DEFAULT_BUCKET: &str = "checkin-images";

/// Guesses a MIME type from the file extension of `name`.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Blob store backed by a public Supabase Storage bucket.
///
/// Uploads never overwrite (`x-upsert: false`); a name collision surfaces as a provider error.
/// The returned URL is the bucket's public object URL.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    auth: SupabaseAuth,
    bucket: String,
}

impl SupabaseStorage {
    pub fn new(auth: SupabaseAuth, bucket: impl Into<String>) -> Self {
        Self {
            auth,
            bucket: bucket.into(),
        }
    }

    /// Public URL of `name` in this bucket.
    pub fn public_url(&self, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.auth.base_url(),
            self.bucket,
            name
        )
    }
}

#[async_trait]
impl BlobStore for SupabaseStorage {
    async fn store(&self, bytes: Vec<u8>, name: &str) -> Result<String, ClientError> {
        if name.is_empty() || name.contains('/') {
            return Err(ClientError::Configuration(format!(
                "invalid object name: {:?}",
                name
            )));
        }
        let path = format!("/storage/v1/object/{}/{}", self.bucket, name);
        debug!(bucket = %self.bucket, name = %name, size = bytes.len(), "uploading image");
        let request = self
            .auth
            .post(&path)
            .header("Content-Type", content_type_for(name))
            .header("x-upsert", "false")
            .body(bytes);
        self.auth.send("storage upload", request).await?;
        Ok(self.public_url(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for("checkin_1.jpg"), "image/jpeg");
        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn public_url_layout() {
        let auth = SupabaseAuth::new("https://x.supabase.co", "k", Duration::from_secs(1)).unwrap();
        let storage = SupabaseStorage::new(auth, "imgs");
        assert_eq!(
            storage.public_url("checkin_1.jpg"),
            "https://x.supabase.co/storage/v1/object/public/imgs/checkin_1.jpg"
        );
    }
}
