//! Shared plumbing for Supabase REST endpoints (Storage and PostgREST).
//!
//! Both services authenticate with the project key sent twice: as `apikey` and as a bearer
//! token. Non-2xx responses become `ClientError::Provider` with the status and body.

use std::time::Duration;

use crate::error::ClientError;

/// Project URL and key, plus the HTTP client used for every Supabase call.
#[derive(Clone)]
pub struct SupabaseAuth {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseAuth {
    /// Validates credentials and builds a client whose requests time out after `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Configuration(format!("http client: {}", e)))?;
        Self::with_client(client, base_url, api_key)
    }

    /// Same as [`new`](Self::new) with a caller-provided reqwest client.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let api_key = api_key.into().trim().to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("SUPABASE_URL is not set".to_string()));
        }
        if api_key.is_empty() {
            return Err(ClientError::Configuration("SUPABASE_KEY is not set".to_string()));
        }
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Starts a POST to `{base_url}{path}` with the auth headers set.
    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("apikey", self.api_key.as_str())
            .bearer_auth(&self.api_key)
    }

    /// Sends `request`, mapping transport failures and non-2xx statuses.
    pub(crate) async fn send(
        &self,
        context: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(context, e))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::Provider(format!(
                "{} HTTP {}: {}",
                context,
                status,
                if text.is_empty() { "no body" } else { &text }
            )));
        }
        Ok(response)
    }
}

impl std::fmt::Debug for SupabaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseAuth")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
