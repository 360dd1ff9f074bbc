// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The credential store: one resolved "active API key + selected model"
//! per process, kept consistent across the local cache and the durable
//! repository, exposed reactively through a watch channel.
//!
//! Lifecycle: construct once, then either call [`CredentialStore::initialize`]
//! at startup and on every session change, or hand a session channel to
//! [`CredentialStore::run`] and let it drive reconciliation. Dropping the
//! store (or aborting the `run` task) is disposal; no background state
//! outlives it.
//!
//! Failure policy: no public operation here returns an error or panics.
//! Repository and cache failures degrade to the last known local value and
//! a `warn!`; losing AI functionality must never take rendering down with it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dataforge_core::types::{ModelTier, SessionState};
use dataforge_core::CredentialRepository;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::LocalCache;

/// The resolved state consumers observe: at most one active key, exactly
/// one selected model.
#[derive(Debug, Clone)]
pub struct ResolvedState {
    /// The active API key, if one is known.
    pub api_key: Option<SecretString>,
    /// The selected model; always a member of the enumerated set.
    pub model: ModelTier,
}

impl ResolvedState {
    fn empty() -> Self {
        Self {
            api_key: None,
            model: ModelTier::default(),
        }
    }

    /// Whether an API key is currently resolved.
    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Process-wide credential/model state container.
///
/// Reconciliation order on `initialize`: local cache first, then the
/// repository row for the signed-in owner. The remote row wins when both
/// exist; the cached value survives a failed or empty remote lookup.
///
/// Concurrent reconciliations are resolved with a generation counter:
/// every mutation and every `initialize` claims a new generation, and a
/// reconciliation publishes its result only if no newer claim happened
/// while it was in flight. Consumers keep observing the previous resolved
/// state until then (stale read, never a blocked reader).
pub struct CredentialStore {
    repo: Arc<dyn CredentialRepository>,
    cache: LocalCache,
    state: watch::Sender<ResolvedState>,
    generation: AtomicU64,
}

impl CredentialStore {
    /// Create a store over the given repository and cache.
    ///
    /// The state starts empty; nothing is read until `initialize`.
    pub fn new(repo: Arc<dyn CredentialRepository>, cache: LocalCache) -> Self {
        let (state, _) = watch::channel(ResolvedState::empty());
        Self {
            repo,
            cache,
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current resolved state.
    pub fn current(&self) -> ResolvedState {
        self.state.borrow().clone()
    }

    /// Subscribe to resolved-state changes.
    pub fn subscribe(&self) -> watch::Receiver<ResolvedState> {
        self.state.subscribe()
    }

    /// Reconcile local cache -> repository -> in-memory state.
    ///
    /// Invoked once at startup and again on every session change. Reads
    /// the cached key and model, corrects an out-of-set cached model to
    /// the default (persisting the correction), and, when a signed-in
    /// owner is present, lets that owner's active repository row overwrite
    /// the cached key. A failed repository query falls back to the cached
    /// value; nothing escapes to the caller.
    pub async fn initialize(&self, session: &SessionState) {
        let generation = self.claim_generation();
        let snapshot = self.cache.read();

        let model = match snapshot.model.as_deref() {
            None => ModelTier::default(),
            Some(raw) if ModelTier::is_member(raw) => ModelTier::coerce(raw),
            Some(raw) => {
                warn!(
                    cached = raw,
                    default = %ModelTier::default(),
                    "cached model is not in the allowed set, resetting"
                );
                let default = ModelTier::default();
                if let Err(e) = self.cache.write_model(&default.to_string()) {
                    warn!(error = %e, "failed to persist model correction");
                }
                default
            }
        };

        let mut api_key = snapshot.api_key.map(SecretString::from);

        if let Some(owner) = session.owner() {
            match self.repo.find_active(owner).await {
                Ok(Some(credential)) => {
                    // Check staleness before the cache write: a discarded
                    // reconciliation must not leave its key in the mirror.
                    if self.stale(generation) {
                        return;
                    }
                    if let Err(e) = self
                        .cache
                        .write_api_key(credential.secret_value.expose_secret())
                    {
                        warn!(error = %e, "failed to refresh cached key");
                    }
                    api_key = Some(credential.secret_value);
                    debug!(owner = %owner.0, "active credential loaded from repository");
                }
                Ok(None) => {
                    debug!(owner = %owner.0, "no active credential in repository, keeping cached key");
                }
                Err(e) => {
                    warn!(error = %e, "active credential query failed, falling back to cached key");
                }
            }
        }

        self.publish(generation, ResolvedState { api_key, model });
    }

    /// Set the in-memory key and write it through to the cache.
    ///
    /// No validation and no repository write: persisting a new credential
    /// row is an explicit page-level flow, not the store's job.
    pub fn set_api_key(&self, key: &str) {
        self.claim_generation();
        if let Err(e) = self.cache.write_api_key(key) {
            warn!(error = %e, "failed to cache api key");
        }
        self.state
            .send_modify(|state| state.api_key = Some(SecretString::from(key.to_string())));
        debug!("api key set");
    }

    /// Remove the in-memory key and the cache entry. Idempotent.
    pub fn clear_api_key(&self) {
        self.claim_generation();
        if let Err(e) = self.cache.clear_api_key() {
            warn!(error = %e, "failed to clear cached api key");
        }
        self.state.send_modify(|state| state.api_key = None);
        debug!("api key cleared");
    }

    /// Select a model, coercing out-of-set input to the default.
    ///
    /// Always succeeds: invalid input is corrected (and logged), never
    /// rejected. The selection is written through to the cache.
    pub fn set_selected_model(&self, raw: &str) {
        let model = if ModelTier::is_member(raw) {
            ModelTier::coerce(raw)
        } else {
            warn!(
                requested = raw,
                default = %ModelTier::default(),
                "requested model is not in the allowed set, using default"
            );
            ModelTier::default()
        };
        self.claim_generation();
        if let Err(e) = self.cache.write_model(&model.to_string()) {
            warn!(error = %e, "failed to cache model selection");
        }
        self.state.send_modify(|state| state.model = model);
        debug!(model = %model, "model selected");
    }

    /// Re-run the repository step of `initialize` on demand (after a
    /// page-level credential mutation).
    ///
    /// Returns whether an active credential was found and applied. Query
    /// errors and a missing session both yield `false` with a log line;
    /// nothing propagates.
    pub async fn load_active_credential_from_store(&self, session: &SessionState) -> bool {
        let Some(owner) = session.owner() else {
            debug!("no signed-in session, skipping repository lookup");
            return false;
        };
        let generation = self.claim_generation();
        match self.repo.find_active(owner).await {
            Ok(Some(credential)) => {
                if self.stale(generation) {
                    return false;
                }
                if let Err(e) = self
                    .cache
                    .write_api_key(credential.secret_value.expose_secret())
                {
                    warn!(error = %e, "failed to refresh cached key");
                }
                self.state
                    .send_modify(|state| state.api_key = Some(credential.secret_value));
                debug!(owner = %owner.0, "active credential applied");
                true
            }
            Ok(None) => {
                debug!(owner = %owner.0, "no active credential found");
                false
            }
            Err(e) => {
                warn!(error = %e, "active credential query failed");
                false
            }
        }
    }

    /// Drive reconciliation from a session channel until it closes.
    ///
    /// Resolves once with the channel's current value, then once per
    /// change. Spawn this on the runtime; aborting the task disposes the
    /// loop without tearing down the store's last resolved state.
    pub async fn run(self: Arc<Self>, mut sessions: watch::Receiver<SessionState>) {
        let current = sessions.borrow_and_update().clone();
        self.initialize(&current).await;
        while sessions.changed().await.is_ok() {
            let session = sessions.borrow_and_update().clone();
            debug!("session changed, reconciling credential state");
            self.initialize(&session).await;
        }
        debug!("session channel closed, credential store loop ending");
    }

    fn claim_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn stale(&self, generation: u64) -> bool {
        let newest = self.generation.load(Ordering::SeqCst);
        if newest != generation {
            debug!(generation, newest, "stale reconciliation discarded");
            return true;
        }
        false
    }

    fn publish(&self, generation: u64, state: ResolvedState) {
        if self.stale(generation) {
            return;
        }
        // send() only fails with no receivers, which is fine: current()
        // still observes the value through the sender.
        let _ = self.state.send(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataforge_core::types::{OwnerId, Session};
    use dataforge_test_utils::MockCredentialRepository;
    use std::time::Duration;
    use tempfile::tempdir;

    fn signed_in(user: &str) -> SessionState {
        SessionState::SignedIn(Session {
            user_id: OwnerId(user.to_string()),
            display_name: None,
            email: None,
        })
    }

    fn store_with(
        dir: &tempfile::TempDir,
        repo: Arc<MockCredentialRepository>,
    ) -> CredentialStore {
        let cache = LocalCache::new(dir.path().join("cache.toml"));
        CredentialStore::new(repo, cache)
    }

    fn key_of(state: &ResolvedState) -> Option<String> {
        state
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().to_string())
    }

    #[tokio::test]
    async fn initialize_without_session_uses_cached_values() {
        let dir = tempdir().unwrap();
        let repo = Arc::new(MockCredentialRepository::new());
        let store = store_with(&dir, repo.clone());
        store.cache.write_api_key("sk-cached").unwrap();
        store.cache.write_model("gpt-4-turbo").unwrap();

        store.initialize(&SessionState::SignedOut).await;

        let state = store.current();
        assert_eq!(key_of(&state).as_deref(), Some("sk-cached"));
        assert_eq!(state.model, ModelTier::Gpt4Turbo);
        // No repository traffic without a signed-in owner.
        assert_eq!(repo.find_active_calls(), 0);
    }

    #[tokio::test]
    async fn initialize_with_session_prefers_remote_over_cache() {
        let dir = tempdir().unwrap();
        let repo = Arc::new(MockCredentialRepository::new());
        let who = OwnerId("user-1".into());
        repo.push_credential(&who, "remote", "sk-remote", true).await;

        let store = store_with(&dir, repo.clone());
        store.cache.write_api_key("sk-cached").unwrap();

        store.initialize(&signed_in("user-1")).await;

        assert_eq!(key_of(&store.current()).as_deref(), Some("sk-remote"));
        // The cache mirror was refreshed too.
        assert_eq!(store.cache.read().api_key.as_deref(), Some("sk-remote"));
    }

    #[tokio::test]
    async fn initialize_falls_back_to_cache_on_query_failure() {
        let dir = tempdir().unwrap();
        let repo = Arc::new(MockCredentialRepository::new());
        repo.fail_queries(true);

        let store = store_with(&dir, repo.clone());
        store.cache.write_api_key("sk-cached").unwrap();

        // Must not panic or propagate.
        store.initialize(&signed_in("user-1")).await;

        assert_eq!(key_of(&store.current()).as_deref(), Some("sk-cached"));
        assert_eq!(store.cache.read().api_key.as_deref(), Some("sk-cached"));
    }

    #[tokio::test]
    async fn initialize_keeps_cached_key_when_remote_has_none() {
        let dir = tempdir().unwrap();
        let repo = Arc::new(MockCredentialRepository::new());
        let store = store_with(&dir, repo.clone());
        store.cache.write_api_key("sk-cached").unwrap();

        store.initialize(&signed_in("user-1")).await;

        assert_eq!(key_of(&store.current()).as_deref(), Some("sk-cached"));
        assert_eq!(repo.find_active_calls(), 1);
    }

    #[tokio::test]
    async fn initialize_corrects_out_of_set_cached_model() {
        let dir = tempdir().unwrap();
        let repo = Arc::new(MockCredentialRepository::new());
        let store = store_with(&dir, repo.clone());
        store.cache.write_model("gpt-9-ultra").unwrap();

        store.initialize(&SessionState::SignedOut).await;
        assert_eq!(store.current().model, ModelTier::default());
        // Correction is persisted, so the next read is already clean.
        assert_eq!(
            store.cache.read().model.as_deref(),
            Some(ModelTier::default().to_string().as_str())
        );

        // Idempotent on repeat.
        store.initialize(&SessionState::SignedOut).await;
        assert_eq!(store.current().model, ModelTier::default());
    }

    #[tokio::test]
    async fn set_selected_model_coerces_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let repo = Arc::new(MockCredentialRepository::new());
        let store = store_with(&dir, repo.clone());

        store.set_selected_model("not-a-model");
        assert_eq!(store.current().model, ModelTier::default());
        store.set_selected_model("not-a-model");
        assert_eq!(store.current().model, ModelTier::default());

        store.set_selected_model("gpt-4o");
        assert_eq!(store.current().model, ModelTier::Gpt4o);
        assert_eq!(store.cache.read().model.as_deref(), Some("gpt-4o"));
    }

    #[tokio::test]
    async fn set_and_clear_api_key_write_through() {
        let dir = tempdir().unwrap();
        let repo = Arc::new(MockCredentialRepository::new());
        let store = store_with(&dir, repo.clone());

        store.set_api_key("sk-user-entered");
        assert_eq!(key_of(&store.current()).as_deref(), Some("sk-user-entered"));
        assert_eq!(
            store.cache.read().api_key.as_deref(),
            Some("sk-user-entered")
        );

        store.clear_api_key();
        store.clear_api_key();
        assert!(store.current().api_key.is_none());
        assert!(store.cache.read().api_key.is_none());
    }

    #[tokio::test]
    async fn load_active_credential_reports_found_and_applied() {
        let dir = tempdir().unwrap();
        let repo = Arc::new(MockCredentialRepository::new());
        let who = OwnerId("user-1".into());
        let store = store_with(&dir, repo.clone());

        // No session: false, and no repository call at all.
        assert!(
            !store
                .load_active_credential_from_store(&SessionState::SignedOut)
                .await
        );
        assert_eq!(repo.find_active_calls(), 0);

        // Session but no credential: false.
        assert!(
            !store
                .load_active_credential_from_store(&signed_in("user-1"))
                .await
        );

        // Credential present: true, state refreshed.
        repo.push_credential(&who, "k", "sk-loaded", true).await;
        assert!(
            store
                .load_active_credential_from_store(&signed_in("user-1"))
                .await
        );
        assert_eq!(key_of(&store.current()).as_deref(), Some("sk-loaded"));

        // Query failure: false, state untouched.
        repo.fail_queries(true);
        assert!(
            !store
                .load_active_credential_from_store(&signed_in("user-1"))
                .await
        );
        assert_eq!(key_of(&store.current()).as_deref(), Some("sk-loaded"));
    }

    #[tokio::test]
    async fn stale_reconciliation_does_not_clobber_newer_state() {
        let dir = tempdir().unwrap();
        let repo = Arc::new(MockCredentialRepository::new());
        let who = OwnerId("user-1".into());
        repo.push_credential(&who, "old", "sk-old", true).await;

        let store = Arc::new(store_with(&dir, repo.clone()));

        // Hold the repository query mid-flight.
        let gate = repo.gate_queries().await;
        let in_flight = {
            let store = store.clone();
            tokio::spawn(async move { store.initialize(&signed_in("user-1")).await })
        };
        // Give the task time to claim its generation and block on the gate.
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The user sets a key while reconciliation is in flight.
        store.set_api_key("sk-user-wins");

        // Release the gated query; the stale result must be discarded.
        gate.add_permits(1);
        in_flight.await.unwrap();

        assert_eq!(key_of(&store.current()).as_deref(), Some("sk-user-wins"));
        // The cache mirror was not clobbered either.
        assert_eq!(
            store.cache.read().api_key.as_deref(),
            Some("sk-user-wins")
        );
    }

    #[tokio::test]
    async fn subscribers_observe_state_changes() {
        let dir = tempdir().unwrap();
        let repo = Arc::new(MockCredentialRepository::new());
        let store = store_with(&dir, repo.clone());
        let mut rx = store.subscribe();

        store.set_api_key("sk-observed");
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow()
                .api_key
                .as_ref()
                .map(|k| k.expose_secret().to_string())
                .as_deref(),
            Some("sk-observed")
        );
    }

    #[tokio::test]
    async fn run_reconciles_on_session_changes() {
        let dir = tempdir().unwrap();
        let repo = Arc::new(MockCredentialRepository::new());
        let who = OwnerId("user-1".into());
        repo.push_credential(&who, "remote", "sk-remote", true).await;

        let store = Arc::new(store_with(&dir, repo.clone()));
        let mut rx = store.subscribe();

        let (session_tx, session_rx) = watch::channel(SessionState::Loading);
        let loop_task = tokio::spawn(store.clone().run(session_rx));

        // Startup resolution (Loading: cache only, nothing cached).
        rx.changed().await.unwrap();
        assert!(rx.borrow().api_key.is_none());

        // Sign-in triggers a remote resolution.
        session_tx.send(signed_in("user-1")).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(key_of(&store.current()).as_deref(), Some("sk-remote"));

        // Closing the channel ends the loop.
        drop(session_tx);
        loop_task.await.unwrap();
    }
}
