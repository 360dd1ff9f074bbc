// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential CRUD operations carrying the single-active discipline.
//!
//! Every mutation runs inside one transaction. Activation clears the
//! owner's previous active row before setting the new one, so the partial
//! unique index on `(owner_id) WHERE is_active = 1` holds at every point
//! a transaction can commit. A failed activation therefore leaves the
//! owner with zero active rows, never two.

use dataforge_core::types::{Credential, CredentialId, OwnerId};
use dataforge_core::DataforgeError;
use rusqlite::params;
use secrecy::SecretString;
use tracing::debug;
use uuid::Uuid;

use crate::database::{map_tr_err, Database};

const CREDENTIAL_COLUMNS: &str = "id, owner_id, key_name, key_value, created_at, is_active";

fn map_credential_row(row: &rusqlite::Row<'_>) -> Result<Credential, rusqlite::Error> {
    Ok(Credential {
        id: CredentialId(row.get(0)?),
        owner_id: OwnerId(row.get(1)?),
        label: row.get(2)?,
        secret_value: SecretString::from(row.get::<_, String>(3)?),
        created_at: row.get(4)?,
        is_active: row.get(5)?,
    })
}

/// Insert a new credential for the owner.
///
/// The first credential an owner stores becomes active immediately; later
/// inserts never change which credential is active, even when the owner
/// currently has no active row.
pub async fn insert_credential(
    db: &Database,
    owner: &OwnerId,
    label: &str,
    secret: &str,
) -> Result<Credential, DataforgeError> {
    let id = Uuid::new_v4().to_string();
    let owner = owner.0.clone();
    let label = label.to_string();
    let secret = secret.to_string();

    let credential = db
        .connection()
        .call(move |conn| -> Result<Credential, rusqlite::Error> {
            let tx = conn.transaction()?;
            let existing: i64 = tx.query_row(
                "SELECT COUNT(*) FROM api_keys WHERE owner_id = ?1",
                params![owner],
                |row| row.get(0),
            )?;
            let is_active = existing == 0;
            tx.execute(
                "INSERT INTO api_keys (id, owner_id, key_name, key_value, created_at, is_active)
                 VALUES (?1, ?2, ?3, ?4, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'), ?5)",
                params![id, owner, label, secret, is_active],
            )?;
            let credential = tx.query_row(
                &format!("SELECT {CREDENTIAL_COLUMNS} FROM api_keys WHERE id = ?1"),
                params![id],
                map_credential_row,
            )?;
            tx.commit()?;
            Ok(credential)
        })
        .await
        .map_err(map_tr_err)?;

    debug!(
        id = %credential.id.0,
        active = credential.is_active,
        "credential inserted"
    );
    Ok(credential)
}

/// List the owner's credentials, newest first.
pub async fn list_credentials(
    db: &Database,
    owner: &OwnerId,
) -> Result<Vec<Credential>, DataforgeError> {
    let owner = owner.0.clone();
    db.connection()
        .call(move |conn| -> Result<Vec<Credential>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CREDENTIAL_COLUMNS} FROM api_keys
                 WHERE owner_id = ?1 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![owner], map_credential_row)?;
            let mut credentials = Vec::new();
            for row in rows {
                credentials.push(row?);
            }
            Ok(credentials)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch the owner's active credential, if any.
pub async fn find_active_credential(
    db: &Database,
    owner: &OwnerId,
) -> Result<Option<Credential>, DataforgeError> {
    let owner = owner.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<Credential>, rusqlite::Error> {
            let result = conn.query_row(
                &format!(
                    "SELECT {CREDENTIAL_COLUMNS} FROM api_keys
                     WHERE owner_id = ?1 AND is_active = 1 LIMIT 1"
                ),
                params![owner],
                map_credential_row,
            );
            match result {
                Ok(credential) => Ok(Some(credential)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Make the given credential the owner's single active one.
///
/// Clear-then-set inside one transaction: the previous active row is
/// cleared first so the single-active index is never violated. Returns
/// `false` without changing anything when the target row does not exist
/// for this owner.
pub async fn set_active_credential(
    db: &Database,
    owner: &OwnerId,
    id: &CredentialId,
) -> Result<bool, DataforgeError> {
    let owner = owner.0.clone();
    let target_id = id.0.clone();
    let id = target_id.clone();

    let applied = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let target: i64 = tx.query_row(
                "SELECT COUNT(*) FROM api_keys WHERE id = ?1 AND owner_id = ?2",
                params![id, owner],
                |row| row.get(0),
            )?;
            if target == 0 {
                // Dropping the transaction rolls back; nothing was written.
                return Ok(false);
            }
            tx.execute(
                "UPDATE api_keys SET is_active = 0 WHERE owner_id = ?1 AND is_active = 1",
                params![owner],
            )?;
            tx.execute(
                "UPDATE api_keys SET is_active = 1 WHERE id = ?1 AND owner_id = ?2",
                params![id, owner],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)?;

    debug!(id = %target_id, applied, "credential activation");
    Ok(applied)
}

/// Delete a credential.
///
/// Deleting the active credential promotes the most recently created
/// remaining row (ties broken by id) in the same transaction. Returns
/// `false` when the target does not exist for this owner.
pub async fn delete_credential(
    db: &Database,
    owner: &OwnerId,
    id: &CredentialId,
) -> Result<bool, DataforgeError> {
    let owner = owner.0.clone();
    let id = id.0.clone();

    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let tx = conn.transaction()?;
            let was_active = match tx.query_row(
                "SELECT is_active FROM api_keys WHERE id = ?1 AND owner_id = ?2",
                params![id, owner],
                |row| row.get::<_, bool>(0),
            ) {
                Ok(active) => active,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(false),
                Err(e) => return Err(e),
            };
            tx.execute(
                "DELETE FROM api_keys WHERE id = ?1 AND owner_id = ?2",
                params![id, owner],
            )?;
            if was_active {
                tx.execute(
                    "UPDATE api_keys SET is_active = 1 WHERE id = (
                         SELECT id FROM api_keys WHERE owner_id = ?1
                         ORDER BY created_at DESC, id DESC LIMIT 1
                     )",
                    params![owner],
                )?;
            }
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}
