//! Resolves a Steam id to a player profile via the Steam Web API.

use serde::Deserialize;

use crate::IdentityError;

/// A player's public Steam profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(rename = "steamid")]
    pub steam_id: String,
    #[serde(rename = "personaname")]
    pub persona_name: String,
    /// 32×32 avatar URL.
    pub avatar: String,
    /// 184×184 avatar URL.
    #[serde(rename = "avatarfull")]
    pub avatar_full: String,
}

/// `GetPlayerSummaries` envelope: `{"response":{"players":[...]}}`.
#[derive(Debug, Deserialize)]
struct PlayerSummaries {
    response: PlayerList,
}

#[derive(Debug, Deserialize)]
struct PlayerList {
    #[serde(default)]
    players: Vec<Profile>,
}

/// Looks players up with `ISteamUser/GetPlayerSummaries/v0002`.
///
/// The API key is injected at construction; it never comes from the
/// request being authenticated.
#[derive(Clone)]
pub struct ProfileResolver {
    client: reqwest::Client,
    web_api_base: String,
    api_key: String,
}

impl ProfileResolver {
    pub fn new(
        client: reqwest::Client,
        web_api_base: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            web_api_base: web_api_base.into(),
            api_key: api_key.into(),
        }
    }

    /// Fetches the profile of a single Steam id.
    ///
    /// No retries; a caller that wants one should retry the whole
    /// authentication.
    ///
    /// # Errors
    /// [`IdentityError::ProfileLookupFailed`] on transport failure or
    /// timeout, a non-success status, an undecodable body, or an empty
    /// player list.
    pub async fn resolve(&self, steam_id: &str) -> Result<Profile, IdentityError> {
        let url = format!(
            "{}/ISteamUser/GetPlayerSummaries/v0002/",
            self.web_api_base.trim_end_matches('/')
        );

        let response = self
            .client
            .get(url)
            .query(&[("key", self.api_key.as_str()), ("steamids", steam_id)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            // The URL carries the API key; keep it out of errors and logs.
            .map_err(|e| {
                lookup_failed(steam_id, format!("request failed: {}", e.without_url()))
            })?;

        let summaries: PlayerSummaries = response
            .json()
            .await
            .map_err(|e| {
                lookup_failed(steam_id, format!("undecodable response: {}", e.without_url()))
            })?;

        let profile = summaries
            .response
            .players
            .into_iter()
            .next()
            .ok_or_else(|| lookup_failed(steam_id, "no player in response".into()))?;

        tracing::debug!(steam_id, persona = %profile.persona_name, "profile resolved");
        Ok(profile)
    }
}

fn lookup_failed(steam_id: &str, reason: String) -> IdentityError {
    tracing::warn!(steam_id, %reason, "profile lookup failed");
    IdentityError::ProfileLookupFailed(reason)
}
