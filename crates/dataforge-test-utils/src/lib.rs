// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Dataforge integration tests.
//!
//! Provides mock adapters for fast, deterministic, CI-runnable tests
//! without external services.
//!
//! # Components
//!
//! - [`MockCredentialRepository`] - In-memory repository with failure
//!   injection, query gating, and call counting

pub mod mock_repository;

pub use mock_repository::MockCredentialRepository;
