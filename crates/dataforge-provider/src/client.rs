// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the provider's chat-completions endpoint.
//!
//! A thin forwarder: the active key is supplied per call (it can change at
//! runtime as credentials are switched), the payload is serialized as-is,
//! and transient errors are retried once.

use std::time::Duration;

use dataforge_config::model::ProviderConfig;
use dataforge_core::DataforgeError;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, CompletionRequest, CompletionResponse};

/// HTTP client for provider API communication.
///
/// Manages connection pooling, per-request bearer authentication, and
/// retry logic for transient errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl ProviderClient {
    /// Creates a new provider client from configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self, DataforgeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DataforgeError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Sends a completion request with the given key and returns the
    /// parsed response.
    ///
    /// On transient errors (429, 500, 503), retries once after a 1-second delay.
    pub async fn complete(
        &self,
        api_key: &SecretString,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, DataforgeError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(api_key.expose_secret())
                .json(request)
                .send()
                .await
                .map_err(|e| DataforgeError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| DataforgeError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                let completion: CompletionResponse =
                    serde_json::from_str(&body).map_err(|e| DataforgeError::Provider {
                        message: format!("failed to parse API response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(completion);
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(DataforgeError::Provider {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            // Non-transient error or exhausted retries.
            let body = response.text().await.unwrap_or_default();
            let error_msg = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                match api_err.error.type_ {
                    Some(kind) => format!("provider API error ({kind}): {}", api_err.error.message),
                    None => format!("provider API error: {}", api_err.error.message),
                }
            } else {
                format!("API returned {status}: {body}")
            };
            return Err(DataforgeError::Provider {
                message: error_msg,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| DataforgeError::Provider {
            message: "completion request failed after retries".into(),
            source: None,
        }))
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
