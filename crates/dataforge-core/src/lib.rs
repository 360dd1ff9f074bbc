// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Dataforge credential core.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Dataforge workspace: the credential and
//! session domain model, the closed model-tier set, and the repository
//! trait implemented by the storage layer.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::DataforgeError;
pub use traits::CredentialRepository;
pub use types::{mask_secret, Credential, CredentialId, ModelTier, OwnerId, Session, SessionState};
