//! Age lookup backed by the public agify.io API.
//!
//! The lookup is strictly best-effort: transport failures, non-success
//! statuses, and unknown names all collapse to `None` so user creation can
//! never fail because of it.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Base URL of the agify.io API
pub const AGIFY_BASE_URL: &str = "https://api.agify.io";

/// Best-effort estimated-age lookup for a given first name
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgeLookup: Send + Sync {
    /// Returns the estimated age for `name`, or `None` when the lookup
    /// fails or the service has no data for the name
    async fn age_for_name(&self, name: &str) -> Option<i32>;
}

#[derive(Debug, Deserialize)]
struct AgifyResponse {
    age: Option<i32>,
}

/// HTTP client for agify.io
#[derive(Debug, Clone)]
pub struct AgifyClient {
    http: reqwest::Client,
    base_url: String,
}

impl AgifyClient {
    pub fn new() -> Self {
        Self::with_base_url(AGIFY_BASE_URL)
    }

    /// Point the client at a different endpoint (used by tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

impl Default for AgifyClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgeLookup for AgifyClient {
    async fn age_for_name(&self, name: &str) -> Option<i32> {
        let response = match self
            .http
            .get(&self.base_url)
            .query(&[("name", name)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(name, error = %e, "Error during agify age request");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(name, status = %response.status(), "Agify returned a non-success status");
            return None;
        }

        let body: AgifyResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(name, error = %e, "Unable to decode agify response");
                return None;
            }
        };

        match body.age {
            Some(age) => {
                tracing::debug!(name, age, "Age for name found");
                Some(age)
            }
            None => {
                tracing::warn!(name, "There is no age for name");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transport_error_yields_none() {
        // Nothing listens here; the request fails and is swallowed.
        let client = AgifyClient::with_base_url("http://127.0.0.1:1");
        assert_eq!(client.age_for_name("john").await, None);
    }

    #[test]
    fn test_response_decoding() {
        let body: AgifyResponse =
            serde_json::from_str(r#"{"age": 50, "count": 12345, "name": "john"}"#).unwrap();
        assert_eq!(body.age, Some(50));

        let body: AgifyResponse =
            serde_json::from_str(r#"{"age": null, "count": 0, "name": "zzz"}"#).unwrap();
        assert_eq!(body.age, None);
    }
}
