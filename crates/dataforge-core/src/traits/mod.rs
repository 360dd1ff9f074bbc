// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Dataforge credential core.
//!
//! Traits use `#[async_trait]` for dynamic dispatch compatibility so the
//! credential store can hold `Arc<dyn CredentialRepository>`.

pub mod repository;

pub use repository::CredentialRepository;
