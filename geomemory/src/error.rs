//! Error types for leaf clients and pipelines.
//!
//! Leaf clients (geocoding, blob store, repository) return [`ClientError`]. Pipelines wrap
//! those per stage in [`PipelineError`], keeping the leaf error as the `source()` so callers
//! can log the whole chain.

use thiserror::Error;

/// Failure raised by a leaf client talking to an external provider.
///
/// The kinds are kept distinct so pipelines can apply different policies (abort vs. degrade)
/// and so operators can tell a slow provider from a misconfigured one.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Required credentials or endpoints are missing. Detected before any network I/O.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request did not complete within the client's timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Network-level failure (connect, TLS, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered but reported a failure (status flag, non-2xx status).
    #[error("provider error: {0}")]
    Provider(String),

    /// The provider answered with a body we could not decode.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Maps a reqwest failure into `Timeout` or `Transport`.
    pub fn from_reqwest(context: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(format!("{}: {}", context, e))
        } else {
            ClientError::Transport(format!("{}: {}", context, e))
        }
    }
}

/// Failure of a check-in or exploration pipeline.
///
/// One variant per stage; each stage wrap chains the underlying [`ClientError`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed caller input (bad Base64, out-of-range coordinate or radius).
    #[error("validation error: {0}")]
    Validation(String),

    /// Uploading the image failed; nothing was persisted.
    #[error("storage error: {0}")]
    Storage(#[source] ClientError),

    /// Reverse geocoding or nearby search failed.
    #[error("geocoding error: {0}")]
    Geocoding(#[source] ClientError),

    /// Inserting the memory record failed. The image at `image_url` was already uploaded and
    /// is not rolled back.
    #[error("persistence error (image already stored at {image_url}): {source}")]
    Persistence {
        image_url: String,
        #[source]
        source: ClientError,
    },
}
