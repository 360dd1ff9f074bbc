// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock credential repository for deterministic testing.
//!
//! `MockCredentialRepository` implements `CredentialRepository` in memory,
//! enabling fast, CI-runnable store tests without a database. Queries can
//! be failed, gated (held until released), and counted.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::{Mutex, Semaphore};

use dataforge_core::types::{Credential, CredentialId, OwnerId};
use dataforge_core::{CredentialRepository, DataforgeError};

/// An in-memory credential repository mirroring the storage contract:
/// first insert auto-activates, activation is clear-then-set, deleting
/// the active row promotes the newest remaining one.
pub struct MockCredentialRepository {
    rows: Mutex<Vec<Credential>>,
    fail_queries: AtomicBool,
    find_active_calls: AtomicUsize,
    gate: Mutex<Option<Arc<Semaphore>>>,
    seq: AtomicU64,
}

impl MockCredentialRepository {
    /// Create an empty mock repository.
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail_queries: AtomicBool::new(false),
            find_active_calls: AtomicUsize::new(0),
            gate: Mutex::new(None),
            seq: AtomicU64::new(0),
        }
    }

    /// Make every subsequent query return a storage error.
    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Number of `find_active` calls observed so far.
    pub fn find_active_calls(&self) -> usize {
        self.find_active_calls.load(Ordering::SeqCst)
    }

    /// Hold every subsequent query until a permit is added to the returned
    /// semaphore (`add_permits`). Used to interleave in-flight
    /// reconciliations deterministically.
    pub async fn gate_queries(&self) -> Arc<Semaphore> {
        let sem = Arc::new(Semaphore::new(0));
        *self.gate.lock().await = Some(sem.clone());
        sem
    }

    /// Remove the query gate.
    pub async fn ungate_queries(&self) {
        *self.gate.lock().await = None;
    }

    /// Seed a credential row directly, bypassing insert semantics. Lets
    /// tests construct arbitrary committed states.
    pub async fn push_credential(
        &self,
        owner: &OwnerId,
        label: &str,
        secret: &str,
        is_active: bool,
    ) -> Credential {
        let credential = Credential {
            id: CredentialId(uuid::Uuid::new_v4().to_string()),
            owner_id: owner.clone(),
            label: label.to_string(),
            secret_value: SecretString::from(secret.to_string()),
            created_at: self.next_timestamp(),
            is_active,
        };
        self.rows.lock().await.push(credential.clone());
        credential
    }

    async fn pass_gate(&self) {
        let gate = self.gate.lock().await.clone();
        if let Some(sem) = gate {
            let permit = sem.acquire().await.expect("gate semaphore closed");
            permit.forget();
        }
    }

    fn check_failure(&self) -> Result<(), DataforgeError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(DataforgeError::Storage {
                source: "mock query failure".into(),
            });
        }
        Ok(())
    }

    /// Monotonic fake timestamps so created_at ordering is deterministic.
    fn next_timestamp(&self) -> String {
        let n = self.seq.fetch_add(1, Ordering::SeqCst);
        format!("2026-01-01T00:00:00.{n:03}Z")
    }
}

impl Default for MockCredentialRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialRepository for MockCredentialRepository {
    async fn insert(
        &self,
        owner: &OwnerId,
        label: &str,
        secret: &str,
    ) -> Result<Credential, DataforgeError> {
        self.pass_gate().await;
        self.check_failure()?;
        let mut rows = self.rows.lock().await;
        let first = !rows.iter().any(|c| &c.owner_id == owner);
        let credential = Credential {
            id: CredentialId(uuid::Uuid::new_v4().to_string()),
            owner_id: owner.clone(),
            label: label.to_string(),
            secret_value: SecretString::from(secret.to_string()),
            created_at: self.next_timestamp(),
            is_active: first,
        };
        rows.push(credential.clone());
        Ok(credential)
    }

    async fn list(&self, owner: &OwnerId) -> Result<Vec<Credential>, DataforgeError> {
        self.pass_gate().await;
        self.check_failure()?;
        let rows = self.rows.lock().await;
        let mut owned: Vec<Credential> = rows
            .iter()
            .filter(|c| &c.owner_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.0.cmp(&a.id.0))
        });
        Ok(owned)
    }

    async fn find_active(&self, owner: &OwnerId) -> Result<Option<Credential>, DataforgeError> {
        self.find_active_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        self.check_failure()?;
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .find(|c| &c.owner_id == owner && c.is_active)
            .cloned())
    }

    async fn set_active(
        &self,
        owner: &OwnerId,
        id: &CredentialId,
    ) -> Result<bool, DataforgeError> {
        self.pass_gate().await;
        self.check_failure()?;
        let mut rows = self.rows.lock().await;
        if !rows.iter().any(|c| &c.owner_id == owner && &c.id == id) {
            return Ok(false);
        }
        for row in rows.iter_mut().filter(|c| &c.owner_id == owner) {
            row.is_active = &row.id == id;
        }
        Ok(true)
    }

    async fn delete(&self, owner: &OwnerId, id: &CredentialId) -> Result<bool, DataforgeError> {
        self.pass_gate().await;
        self.check_failure()?;
        let mut rows = self.rows.lock().await;
        let Some(pos) = rows
            .iter()
            .position(|c| &c.owner_id == owner && &c.id == id)
        else {
            return Ok(false);
        };
        let was_active = rows[pos].is_active;
        rows.remove(pos);
        if was_active {
            let newest = rows
                .iter()
                .filter(|c| &c.owner_id == owner)
                .max_by(|a, b| {
                    a.created_at
                        .cmp(&b.created_at)
                        .then_with(|| a.id.0.cmp(&b.id.0))
                })
                .map(|c| c.id.clone());
            if let Some(newest_id) = newest {
                for row in rows.iter_mut() {
                    if row.id == newest_id {
                        row.is_active = true;
                    }
                }
            }
        }
        Ok(true)
    }
}
