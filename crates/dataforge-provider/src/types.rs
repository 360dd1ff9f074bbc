// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider API request/response types (chat completions and models list).

use serde::{Deserialize, Serialize};

// --- Request types ---

/// A request to the provider's chat-completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// Model identifier (e.g., "gpt-4o-mini").
    pub model: String,

    /// Conversation messages.
    pub messages: Vec<ChatMessage>,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A single message in the chat conversation format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant".
    pub role: String,

    /// Plain text content.
    pub content: String,
}

impl ChatMessage {
    /// Creates a user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates a system-role message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

// --- Response types ---

/// A response from the chat-completions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    /// Response identifier.
    pub id: String,

    /// Model that produced the response.
    pub model: String,

    /// Generated choices; the first one carries the answer.
    pub choices: Vec<Choice>,

    /// Token accounting for the request.
    pub usage: Usage,
}

impl CompletionResponse {
    /// Text of the first choice, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// One generated completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// Position of this choice in the response.
    pub index: u32,

    /// The generated message.
    pub message: ChatMessage,

    /// Why generation stopped (e.g., "stop", "length").
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage reported by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

// --- Models list (used by the key validation probe) ---

/// Response of the models-list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelList {
    pub data: Vec<ModelEntry>,
}

/// One entry in the models list.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub id: String,
}

// --- Error envelope ---

/// Error response returned by the provider API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Detail of a provider API error.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable error message.
    pub message: String,

    /// Error category (e.g., "invalid_request_error").
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
}
