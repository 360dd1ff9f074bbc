// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lightweight API-key validation against the provider's models-list endpoint.
//!
//! The probe is advisory UX, not a security boundary: a key that passes is
//! still only as trustworthy as the channel it is stored in. Rejections
//! carry a reason string instead of an error -- the caller renders it, it
//! never propagates.

use std::time::Duration;

use dataforge_config::model::ProviderConfig;
use dataforge_core::DataforgeError;
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ModelList};

/// Outcome of a key validation probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValidation {
    /// The provider accepted the key.
    Accepted,
    /// The key was rejected, with a human-readable reason.
    Rejected { reason: String },
}

impl KeyValidation {
    /// Whether the probe accepted the key.
    pub fn is_accepted(&self) -> bool {
        matches!(self, KeyValidation::Accepted)
    }

    /// The rejection reason, if rejected.
    pub fn reason(&self) -> Option<&str> {
        match self {
            KeyValidation::Accepted => None,
            KeyValidation::Rejected { reason } => Some(reason),
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        KeyValidation::Rejected {
            reason: reason.into(),
        }
    }
}

/// Probes candidate API keys against `GET {base_url}/models`.
#[derive(Debug, Clone)]
pub struct KeyValidator {
    client: reqwest::Client,
    base_url: String,
}

impl KeyValidator {
    /// Creates a validator using the provider configuration.
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
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Validate a candidate key with a bearer-authenticated probe.
    ///
    /// Empty or whitespace-only input is rejected locally, without any
    /// network call.
    pub async fn validate_key(&self, key: &str) -> KeyValidation {
        let key = key.trim();
        if key.is_empty() {
            return KeyValidation::rejected("missing key");
        }

        let url = format!("{}/models", self.base_url);
        let response = match self.client.get(&url).bearer_auth(key).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "key validation probe could not reach provider");
                return KeyValidation::rejected("could not validate, check connectivity");
            }
        };

        let status = response.status();
        debug!(status = %status, "key validation probe response");

        if status.is_success() {
            if let Ok(models) = response.json::<ModelList>().await {
                debug!(models = models.data.len(), "key accepted by provider");
            }
            return KeyValidation::Accepted;
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return KeyValidation::rejected("invalid key");
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_err) => KeyValidation::rejected(api_err.error.message),
            Err(_) => KeyValidation::rejected("unknown error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_validator(base_url: &str) -> KeyValidator {
        KeyValidator::new(&ProviderConfig::default())
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    #[tokio::test]
    async fn empty_key_is_rejected_without_a_probe() {
        let server = MockServer::start().await;

        // Expect zero requests: the rejection happens locally.
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let validator = test_validator(&server.uri());

        let result = validator.validate_key("").await;
        assert!(result.reason().unwrap().contains("missing key"));

        let result = validator.validate_key("   ").await;
        assert!(result.reason().unwrap().contains("missing key"));
    }

    #[tokio::test]
    async fn status_200_is_accepted() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "data": [{"id": "gpt-4o"}, {"id": "gpt-4o-mini"}]
        });
        Mock::given(method("GET"))
            .and(path("/models"))
            .and(header("authorization", "Bearer sk-proj-good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let validator = test_validator(&server.uri());
        let result = validator.validate_key("sk-proj-good").await;
        assert!(result.is_accepted());
    }

    #[tokio::test]
    async fn status_401_is_rejected_as_invalid_key() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        });
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(401).set_body_json(&body))
            .mount(&server)
            .await;

        let validator = test_validator(&server.uri());
        let result = validator.validate_key("sk-proj-bad").await;
        assert!(result.reason().unwrap().contains("invalid key"));
    }

    #[tokio::test]
    async fn other_status_surfaces_provider_message() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "error": {"message": "The engine is currently overloaded", "type": "server_error"}
        });
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(500).set_body_json(&body))
            .mount(&server)
            .await;

        let validator = test_validator(&server.uri());
        let result = validator.validate_key("sk-proj-x").await;
        assert!(result.reason().unwrap().contains("currently overloaded"));
    }

    #[tokio::test]
    async fn other_status_without_parseable_body_is_unknown_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream timeout"))
            .mount(&server)
            .await;

        let validator = test_validator(&server.uri());
        let result = validator.validate_key("sk-proj-x").await;
        assert!(result.reason().unwrap().contains("unknown error"));
    }

    #[tokio::test]
    async fn transport_failure_is_rejected_as_connectivity() {
        // Nothing listens on this port; the connection is refused.
        let validator = test_validator("http://127.0.0.1:9");
        let result = validator.validate_key("sk-proj-x").await;
        assert!(result.reason().unwrap().contains("connectivity"));
    }
}
