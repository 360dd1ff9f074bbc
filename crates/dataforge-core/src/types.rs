// SPDX-FileCopyrightText: 2026 Dataforge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Dataforge credential core.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for the user that owns a set of credentials.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

/// Unique identifier for a stored credential, assigned at insert time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(pub String);

/// One stored API key belonging to an owner.
///
/// The secret value is held as a [`SecretString`] so that `Debug` output
/// and accidental serialization never leak the raw key. Display surfaces
/// go through [`mask_secret`].
#[derive(Debug, Clone)]
pub struct Credential {
    /// Row identifier (uuid-v4), assigned by the storage layer.
    pub id: CredentialId,
    /// The authenticated user this credential belongs to.
    pub owner_id: OwnerId,
    /// Human-chosen name, e.g. "OpenAI API Key".
    pub label: String,
    /// The raw key material.
    pub secret_value: SecretString,
    /// ISO-8601 creation timestamp. Newest-first is the default ordering.
    pub created_at: String,
    /// At most one credential per owner is active in any committed state.
    pub is_active: bool,
}

impl Credential {
    /// Masked preview of the secret for display surfaces ("sk-p...mnop").
    pub fn masked_secret(&self) -> String {
        use secrecy::ExposeSecret;
        mask_secret(self.secret_value.expose_secret())
    }
}

/// The authenticated identity consumed by the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: OwnerId,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// Auth-session lifecycle as observed by the credential store.
///
/// Replaced wholesale on every session-change notification from the auth
/// collaborator. `Loading` covers the window before the identity check
/// completes on first load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Identity check not yet complete.
    #[default]
    Loading,
    /// A resolved identity is present.
    SignedIn(Session),
    /// No identity; remote credential lookups are skipped.
    SignedOut,
}

impl SessionState {
    /// Returns the owner id when a resolved identity is present.
    pub fn owner(&self) -> Option<&OwnerId> {
        match self {
            SessionState::SignedIn(session) => Some(&session.user_id),
            SessionState::Loading | SessionState::SignedOut => None,
        }
    }
}

/// The closed set of selectable AI model tiers.
///
/// The selected model is always a member of this set; out-of-set input is
/// coerced to [`ModelTier::default`] (gpt-4o-mini) at the edges rather
/// than checked ad hoc at call sites.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
pub enum ModelTier {
    #[strum(serialize = "gpt-4o")]
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[default]
    #[strum(serialize = "gpt-4o-mini")]
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[strum(serialize = "gpt-4-turbo")]
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
    #[strum(serialize = "gpt-3.5-turbo")]
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
}

impl ModelTier {
    /// Parse a model identifier, falling back to the default tier.
    ///
    /// Coercion is idempotent: any out-of-set string maps to the same
    /// default regardless of prior state. Callers that care about the
    /// correction (to log or re-persist it) can compare against the input
    /// via [`ModelTier::is_member`].
    pub fn coerce(raw: &str) -> ModelTier {
        raw.parse().unwrap_or_default()
    }

    /// Whether the given string names a member of the enumerated set.
    pub fn is_member(raw: &str) -> bool {
        raw.parse::<ModelTier>().is_ok()
    }
}

/// Mask a secret value for display: "sk-proj-abc...xyz" format.
///
/// Shows prefix (up to 4 chars) and suffix (up to 4 chars) with "..." in
/// between. Short values (< 10 chars) are fully masked as "****".
pub fn mask_secret(value: &str) -> String {
    if value.len() < 10 {
        return "****".to_string();
    }
    let prefix = &value[..4.min(value.len())];
    let suffix = &value[value.len().saturating_sub(4)..];
    format!("{prefix}...{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn model_tier_round_trips_through_display() {
        let tiers = [
            ModelTier::Gpt4o,
            ModelTier::Gpt4oMini,
            ModelTier::Gpt4Turbo,
            ModelTier::Gpt35Turbo,
        ];
        for tier in tiers {
            let s = tier.to_string();
            let parsed = ModelTier::from_str(&s).expect("should parse back");
            assert_eq!(tier, parsed);
        }
    }

    #[test]
    fn model_tier_wire_names() {
        assert_eq!(ModelTier::Gpt4o.to_string(), "gpt-4o");
        assert_eq!(ModelTier::Gpt4oMini.to_string(), "gpt-4o-mini");
        assert_eq!(ModelTier::Gpt4Turbo.to_string(), "gpt-4-turbo");
        assert_eq!(ModelTier::Gpt35Turbo.to_string(), "gpt-3.5-turbo");
    }

    #[test]
    fn coerce_out_of_set_yields_default() {
        assert_eq!(ModelTier::coerce("gpt-5-ultra"), ModelTier::default());
        assert_eq!(ModelTier::coerce(""), ModelTier::default());
        // Idempotent: repeated coercion of the same bad input is stable.
        assert_eq!(
            ModelTier::coerce("bogus"),
            ModelTier::coerce("bogus")
        );
    }

    #[test]
    fn coerce_member_is_identity() {
        assert_eq!(ModelTier::coerce("gpt-4-turbo"), ModelTier::Gpt4Turbo);
        assert!(ModelTier::is_member("gpt-4o"));
        assert!(!ModelTier::is_member("gpt4o"));
    }

    #[test]
    fn model_tier_serde_uses_wire_names() {
        let json = serde_json::to_string(&ModelTier::Gpt4oMini).unwrap();
        assert_eq!(json, "\"gpt-4o-mini\"");
        let parsed: ModelTier = serde_json::from_str("\"gpt-4-turbo\"").unwrap();
        assert_eq!(parsed, ModelTier::Gpt4Turbo);
    }

    #[test]
    fn session_state_owner_resolution() {
        let signed_in = SessionState::SignedIn(Session {
            user_id: OwnerId("user-1".into()),
            display_name: None,
            email: None,
        });
        assert_eq!(signed_in.owner(), Some(&OwnerId("user-1".into())));
        assert_eq!(SessionState::Loading.owner(), None);
        assert_eq!(SessionState::SignedOut.owner(), None);
    }

    #[test]
    fn credential_debug_redacts_secret() {
        let cred = Credential {
            id: CredentialId("cred-1".into()),
            owner_id: OwnerId("user-1".into()),
            label: "OpenAI API Key".into(),
            secret_value: SecretString::from("sk-proj-verysecret123".to_string()),
            created_at: "2026-01-01T00:00:00.000Z".into(),
            is_active: true,
        };
        let rendered = format!("{cred:?}");
        assert!(!rendered.contains("verysecret"));
        assert_eq!(cred.masked_secret(), "sk-p...t123");
    }

    #[test]
    fn mask_secret_long_value() {
        assert_eq!(mask_secret("sk-proj-abcdefghijklmnop"), "sk-p...mnop");
    }

    #[test]
    fn mask_secret_short_value() {
        assert_eq!(mask_secret("short"), "****");
    }

    #[test]
    fn mask_secret_exact_boundary() {
        assert_eq!(mask_secret("1234567890"), "1234...7890");
    }
}
