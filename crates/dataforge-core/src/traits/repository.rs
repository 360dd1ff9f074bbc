// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository trait for durable credential rows.

use async_trait::async_trait;

use crate::error::DataforgeError;
use crate::types::{Credential, CredentialId, OwnerId};

/// Adapter over the durable store that owns credential rows.
///
/// All operations are scoped to a single owner; implementations must never
/// return or mutate rows belonging to anyone else. The single-active
/// invariant (at most one `is_active` row per owner in any committed
/// state) is the implementation's responsibility: a failed activation must
/// leave the owner with zero active rows, never two.
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Insert a new credential.
    ///
    /// When the owner has no existing rows, the new credential is activated
    /// immediately. An insert for an owner with one or more rows (active or
    /// not) does not change which credential is active.
    async fn insert(
        &self,
        owner: &OwnerId,
        label: &str,
        secret: &str,
    ) -> Result<Credential, DataforgeError>;

    /// List the owner's credentials, newest first.
    async fn list(&self, owner: &OwnerId) -> Result<Vec<Credential>, DataforgeError>;

    /// Fetch the owner's active credential, if one exists.
    async fn find_active(&self, owner: &OwnerId) -> Result<Option<Credential>, DataforgeError>;

    /// Make the given credential the owner's single active one.
    ///
    /// Clears any other active row and sets the target in one transaction.
    /// Returns `false` (with no rows changed) when the target does not
    /// exist for this owner.
    async fn set_active(
        &self,
        owner: &OwnerId,
        id: &CredentialId,
    ) -> Result<bool, DataforgeError>;

    /// Delete a credential.
    ///
    /// Deleting the active credential promotes the most recently created
    /// remaining one, if any. Returns `false` when the target does not
    /// exist for this owner.
    async fn delete(&self, owner: &OwnerId, id: &CredentialId) -> Result<bool, DataforgeError>;
}
