// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reactive credential store for the Dataforge credential core.
//!
//! Tracks the process-wide "active API key + selected model" tuple,
//! reconciling a device-local cache with the durable credential
//! repository on startup and on every auth-session change. Consumers
//! read the resolved state through a watch channel and never block on
//! in-flight reconciliation.

pub mod cache;
pub mod store;

pub use cache::{CacheSnapshot, LocalCache};
pub use store::{CredentialStore, ResolvedState};
