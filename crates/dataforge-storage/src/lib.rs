// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Dataforge credential core.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed CRUD
//! operations for credential rows. The single-active-credential invariant
//! is enforced twice: by clear-then-set transactions in the query module
//! and by a partial unique index in the schema.

pub mod database;
pub mod migrations;
pub mod queries;
pub mod repository;

pub use database::Database;
pub use repository::SqliteCredentialRepository;
