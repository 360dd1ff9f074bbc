// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI provider HTTP surface for the Dataforge credential core.
//!
//! Two endpoints are used: the models-list endpoint for advisory key
//! validation ([`KeyValidator`]) and the chat-completions endpoint for
//! actual feature use ([`ProviderClient`]). Both authenticate with the
//! active key as a bearer credential.

pub mod client;
pub mod types;
pub mod validation;

pub use client::ProviderClient;
pub use types::{ChatMessage, CompletionRequest, CompletionResponse};
pub use validation::{KeyValidation, KeyValidator};
