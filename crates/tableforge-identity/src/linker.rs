//! Copies a freshly resolved profile onto a newly created account.

use std::collections::HashMap;

use serde_json::Value;
use tableforge_protocol::UserId;

use crate::{AccountStore, AccountUpdate, AuthenticateRequest};

/// Locale written to every linked account.
const DEFAULT_LANG_TAG: &str = "en";

/// Why the linker did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The account already existed; its profile was linked on creation.
    ExistingAccount,
    /// The host reported a new account but no user id for it.
    MissingUserId,
}

/// What [`AccountLinker::link`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The account was updated with the profile.
    Linked,
    /// No update was attempted.
    Skipped(SkipReason),
    /// The store refused the update. Already logged.
    Failed,
}

/// Writes the Steam profile onto the account, at most once per account.
///
/// Linking never fails authentication: the player is already signed in by
/// the time this runs, so store errors are logged and reported through
/// [`LinkOutcome`] only.
#[derive(Debug)]
pub struct AccountLinker<S: AccountStore> {
    store: S,
}

impl<S: AccountStore> AccountLinker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs after authentication completes.
    ///
    /// `created` is the host's "this login created the account" flag and
    /// `request` is the request as enriched by the authenticator.
    pub async fn link(
        &self,
        user_id: Option<&UserId>,
        created: bool,
        request: &AuthenticateRequest,
    ) -> LinkOutcome {
        if !created {
            return LinkOutcome::Skipped(SkipReason::ExistingAccount);
        }

        let Some(user_id) = user_id else {
            tracing::warn!(
                username = request.username.as_deref().unwrap_or_default(),
                "new account without a user id, skipping profile link"
            );
            return LinkOutcome::Skipped(SkipReason::MissingUserId);
        };

        let update = profile_update(user_id, request);

        match self.store.update_account(update).await {
            Ok(()) => {
                tracing::info!(%user_id, "account linked to steam profile");
                LinkOutcome::Linked
            }
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "failed to link account");
                LinkOutcome::Failed
            }
        }
    }
}

fn profile_update(user_id: &UserId, request: &AuthenticateRequest) -> AccountUpdate {
    let mut metadata = HashMap::new();
    if let Some(avatar) = request.vars.get("avatar") {
        metadata.insert("avatar_small".to_string(), Value::String(avatar.clone()));
    }

    AccountUpdate {
        user_id: user_id.clone(),
        display_name: request.username.clone(),
        lang_tag: Some(DEFAULT_LANG_TAG.to_string()),
        avatar_url: request.vars.get("avatarfull").cloned(),
        metadata,
    }
}
