//! `Tableforge` builder and request entry points.
//!
//! This is what a host runtime embeds. It ties the layers together:
//! identity hooks for sign-in, and the match registry for sessions.

use tableforge_identity::{
    AccountStore, AuthenticateRequest, Authenticator, LinkOutcome, SteamAuthenticator, SteamConfig,
};
use tableforge_match::{
    collect_info, JoinMetadata, MatchHandle, MatchInfo, MatchParams, MatchRegistry,
    SessionConfig, SessionHandler, DM_KEY, VERSION_KEY,
};
use tableforge_protocol::{
    Codec, JsonCodec, MatchId, Presence, StartSessionRequest, StartSessionResponse, UserId,
};
use tokio::sync::Mutex;

use crate::TableforgeError;

/// Builder for a [`Tableforge`] instance.
///
/// # Example
///
/// ```rust,ignore
/// use tableforge::prelude::*;
///
/// let forge = TableforgeBuilder::new()
///     .steam_config(SteamConfig::from_env()?)
///     .build(MemoryAccountStore::new())?;
/// ```
#[derive(Debug, Default)]
pub struct TableforgeBuilder {
    steam: Option<SteamConfig>,
    session: SessionConfig,
}

impl TableforgeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `config` instead of reading the environment at build time.
    pub fn steam_config(mut self, config: SteamConfig) -> Self {
        self.steam = Some(config);
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session = config;
        self
    }

    /// Builds with Steam sign-in, writing linked profiles to `store`.
    ///
    /// Reads [`SteamConfig::from_env`] unless a config was supplied.
    ///
    /// # Errors
    /// [`TableforgeError::Config`] if the configuration is missing or the
    /// HTTP client can't be built.
    pub fn build<S: AccountStore>(
        self,
        store: S,
    ) -> Result<Tableforge<SteamAuthenticator<S>>, TableforgeError> {
        let steam = match self.steam {
            Some(config) => config,
            None => SteamConfig::from_env()?,
        };
        tracing::debug!(config = ?steam, "steam configuration loaded");

        let auth = SteamAuthenticator::new(&steam, store)?;
        Ok(Tableforge::new(auth, self.session))
    }

    /// Builds with a custom authenticator. Any Steam config is ignored.
    pub fn build_with<A: Authenticator>(self, auth: A) -> Tableforge<A> {
        Tableforge::new(auth, self.session)
    }
}

/// Sign-in hooks plus the live sessions of one server.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct Tableforge<A: Authenticator> {
    auth: A,
    matches: Mutex<MatchRegistry<SessionHandler>>,
    codec: JsonCodec,
}

impl<A: Authenticator> Tableforge<A> {
    fn new(auth: A, session: SessionConfig) -> Self {
        Self {
            auth,
            matches: Mutex::new(MatchRegistry::new(SessionHandler::new(session))),
            codec: JsonCodec,
        }
    }

    pub fn authenticator(&self) -> &A {
        &self.auth
    }

    /// Before-authentication hook: verifies the request and rewrites it
    /// with the player's profile.
    pub async fn authenticate(
        &self,
        request: AuthenticateRequest,
    ) -> Result<AuthenticateRequest, TableforgeError> {
        Ok(self.auth.authenticate(request).await?)
    }

    /// After-authentication hook. Never fails the login.
    pub async fn after_authenticate(
        &self,
        user_id: Option<&UserId>,
        created: bool,
        request: &AuthenticateRequest,
    ) -> LinkOutcome {
        self.auth.after_authenticate(user_id, created, request).await
    }

    /// The start-session RPC.
    ///
    /// Decodes `{"version": "..."}`, creates a session with the caller as
    /// its dm, and answers `{"match_id": "M-<n>"}`.
    ///
    /// # Errors
    /// [`TableforgeError::Protocol`] for an undecodable payload;
    /// [`TableforgeError::Match`] (`InvalidParams`) when the version is
    /// missing.
    pub async fn start_session(
        &self,
        caller: &UserId,
        payload: &[u8],
    ) -> Result<Vec<u8>, TableforgeError> {
        let request: StartSessionRequest = self.codec.decode(payload)?;

        let mut params = MatchParams::new();
        if let Some(version) = request.version {
            params.insert(VERSION_KEY.to_string(), version);
        }
        params.insert(DM_KEY.to_string(), caller.to_string());

        let match_id = self.matches.lock().await.create_match(&params)?;
        tracing::info!(%match_id, dm = %caller, "session started");

        let response = StartSessionResponse {
            match_id: match_id.to_string(),
        };
        Ok(self.codec.encode(&response)?)
    }

    /// Joins `presence` to the session named by a client-supplied id
    /// (`M-12` or `12`).
    pub async fn join_session(
        &self,
        match_id: &str,
        presence: Presence,
        metadata: JoinMetadata,
    ) -> Result<(), TableforgeError> {
        let handle = self.handle(match_id).await?;
        Ok(handle.join(presence, metadata).await?)
    }

    pub async fn leave_session(
        &self,
        match_id: &str,
        presence: Presence,
    ) -> Result<(), TableforgeError> {
        let handle = self.handle(match_id).await?;
        Ok(handle.leave(vec![presence]).await?)
    }

    pub async fn session_info(&self, match_id: &str) -> Result<MatchInfo, TableforgeError> {
        let handle = self.handle(match_id).await?;
        Ok(handle.info().await?)
    }

    /// Info for every running session.
    pub async fn sessions(&self) -> Vec<MatchInfo> {
        let handles = self.matches.lock().await.handles();
        collect_info(handles).await
    }

    /// Forgets ended sessions. Call periodically.
    pub async fn reap_finished(&self) -> Vec<MatchId> {
        self.matches.lock().await.reap_finished()
    }

    /// Clones the handle so the registry lock isn't held across the
    /// actor round trip.
    async fn handle(&self, match_id: &str) -> Result<MatchHandle, TableforgeError> {
        let match_id: MatchId = match_id.parse()?;
        Ok(self.matches.lock().await.handle(match_id)?)
    }
}
