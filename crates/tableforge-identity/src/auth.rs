//! The before/after authentication hooks.
//!
//! The host runtime owns the authentication flow itself: it receives a
//! request, calls [`Authenticator::authenticate`] to let us check and
//! enrich it, creates or loads the account, then calls
//! [`Authenticator::after_authenticate`] with the outcome.
//!
//! [`SteamAuthenticator`] is the Steam implementation: relay verification,
//! then profile resolution, then (on first login only) account linking.

use std::collections::HashMap;

use tableforge_protocol::UserId;

use crate::{
    AccountLinker, AccountStore, ConfigError, IdentityAssertion, IdentityError,
    LinkOutcome, Profile, ProfileResolver, RelayVerifier, SteamConfig,
};

/// A custom-authentication request as the host sees it.
///
/// `vars` carries the relayed `openid.*` fields on the way in, and the
/// avatar references on the way out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthenticateRequest {
    /// Id of the account to create or load.
    pub account_id: Option<String>,
    pub username: Option<String>,
    pub vars: HashMap<String, String>,
}

impl AuthenticateRequest {
    /// A request carrying only a variable bag, as a client sends it.
    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        Self {
            vars,
            ..Default::default()
        }
    }

    /// Rewrites the request from a resolved profile: the Steam id becomes
    /// the account id and the persona name the username.
    pub fn with_profile(mut self, profile: &Profile) -> Self {
        self.account_id = Some(profile.steam_id.clone());
        self.username = Some(profile.persona_name.clone());
        self.vars.insert("avatar".to_string(), profile.avatar.clone());
        self.vars
            .insert("avatarfull".to_string(), profile.avatar_full.clone());
        self
    }
}

/// Authentication hooks called by the host.
///
/// `Send + Sync + 'static`: one authenticator serves every request for the
/// life of the server, from many tasks at once.
pub trait Authenticator: Send + Sync + 'static {
    /// Checks the request and returns it enriched with the player's
    /// identity.
    ///
    /// # Errors
    /// Any [`IdentityError`]; the host must then refuse the login.
    fn authenticate(
        &self,
        request: AuthenticateRequest,
    ) -> impl std::future::Future<Output = Result<AuthenticateRequest, IdentityError>> + Send;

    /// Runs once the host has created or loaded the account.
    ///
    /// `user_id` is the host's id for the account, `created` whether this
    /// login created it. Never fails the login.
    fn after_authenticate(
        &self,
        user_id: Option<&UserId>,
        created: bool,
        request: &AuthenticateRequest,
    ) -> impl std::future::Future<Output = LinkOutcome> + Send;
}

/// Signs players in through Steam.
pub struct SteamAuthenticator<S: AccountStore> {
    verifier: RelayVerifier,
    resolver: ProfileResolver,
    linker: AccountLinker<S>,
}

impl<S: AccountStore> SteamAuthenticator<S> {
    /// Builds the verifier and resolver from `config`, sharing one HTTP
    /// client between them.
    ///
    /// # Errors
    /// [`ConfigError::HttpClient`] if the client can't be built.
    pub fn new(config: &SteamConfig, store: S) -> Result<Self, ConfigError> {
        let client = config.http_client()?;
        Ok(Self::from_parts(
            RelayVerifier::new(client.clone(), config.openid_endpoint.clone()),
            ProfileResolver::new(
                client,
                config.web_api_base.clone(),
                config.api_key.clone(),
            ),
            AccountLinker::new(store),
        ))
    }

    pub fn from_parts(
        verifier: RelayVerifier,
        resolver: ProfileResolver,
        linker: AccountLinker<S>,
    ) -> Self {
        Self {
            verifier,
            resolver,
            linker,
        }
    }

    pub fn store(&self) -> &S {
        self.linker.store()
    }
}

impl<S: AccountStore> Authenticator for SteamAuthenticator<S> {
    async fn authenticate(
        &self,
        request: AuthenticateRequest,
    ) -> Result<AuthenticateRequest, IdentityError> {
        let assertion = IdentityAssertion::from_vars(&request.vars)?;
        let verified = self.verifier.verify(&assertion).await?;

        let steam_id = verified.steam_id().ok_or_else(|| {
            IdentityError::Validation(format!(
                "claimed id has no steam id: {:?}",
                verified.claimed_id
            ))
        })?;

        let profile = self.resolver.resolve(steam_id).await?;
        tracing::info!(steam_id, username = %profile.persona_name, "player authenticated");

        Ok(request.with_profile(&profile))
    }

    async fn after_authenticate(
        &self,
        user_id: Option<&UserId>,
        created: bool,
        request: &AuthenticateRequest,
    ) -> LinkOutcome {
        self.linker.link(user_id, created, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_profile_sets_identity_and_avatars() {
        let mut vars = HashMap::new();
        vars.insert("openid.sig".to_string(), "s".to_string());
        let profile = Profile {
            steam_id: "76561198185501646".into(),
            persona_name: "Foo".into(),
            avatar: "a".into(),
            avatar_full: "b".into(),
        };

        let request = AuthenticateRequest::from_vars(vars).with_profile(&profile);

        assert_eq!(request.account_id.as_deref(), Some("76561198185501646"));
        assert_eq!(request.username.as_deref(), Some("Foo"));
        assert_eq!(request.vars["avatar"], "a");
        assert_eq!(request.vars["avatarfull"], "b");
        // The assertion fields ride along untouched.
        assert_eq!(request.vars["openid.sig"], "s");
    }
}
