//! The tabletop session: one Dungeon Master, any number of players, and a
//! client version everyone must share.
//!
//! ```text
//! Created ──join──▶ Active ──dm leaves / terminate──▶ Terminated
//!    │                │ ▲
//!    │                └─┘ join, leave (non-dm), tick, signal
//!    └──────────terminate──────────────────────────────▶
//! ```
//!
//! The dm and the version are fixed when the session is created and never
//! change afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tableforge_protocol::{MatchData, Presence, UserId};

use crate::{
    JoinMetadata, JoinRejection, MatchContext, MatchError, MatchHandler, MatchInit, MatchParams,
};

/// Creation parameter holding the client version.
pub const VERSION_KEY: &str = "version";

/// Creation parameter holding the dm's user id.
pub const DM_KEY: &str = "dm";

/// Session tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Heartbeat rate while players are connected.
    pub tick_rate: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { tick_rate: 30 }
    }
}

/// State of one session, owned by its actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    presences: HashMap<UserId, Presence>,
    dm: UserId,
    app_version: String,
}

impl SessionState {
    pub fn new(dm: impl Into<UserId>, app_version: impl Into<String>) -> Self {
        Self {
            presences: HashMap::new(),
            dm: dm.into(),
            app_version: app_version.into(),
        }
    }

    /// Connected participants, keyed by user id.
    pub fn presences(&self) -> &HashMap<UserId, Presence> {
        &self.presences
    }

    /// The participant whose departure ends the session.
    pub fn dm(&self) -> &UserId {
        &self.dm
    }

    /// The client version every joiner must present.
    pub fn app_version(&self) -> &str {
        &self.app_version
    }
}

/// [`MatchHandler`] for tabletop sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionHandler {
    config: SessionConfig,
}

impl SessionHandler {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

/// Blank values count as missing. The value itself is kept as given.
fn required_param<'a>(params: &'a MatchParams, key: &str) -> Result<&'a str, MatchError> {
    params
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| MatchError::InvalidParams(format!("missing parameter '{key}'")))
}

impl MatchHandler for SessionHandler {
    type State = SessionState;

    fn init(&self, params: &MatchParams) -> Result<MatchInit<SessionState>, MatchError> {
        let version = required_param(params, VERSION_KEY)?;
        let dm = required_param(params, DM_KEY)?;

        Ok(MatchInit {
            label: format!("{version}:{dm}"),
            state: SessionState::new(dm, version),
            tick_rate: self.config.tick_rate,
        })
    }

    fn join_attempt(
        &self,
        _ctx: &MatchContext,
        state: &SessionState,
        _presence: &Presence,
        metadata: &JoinMetadata,
    ) -> Result<(), JoinRejection> {
        let offered = metadata
            .get(VERSION_KEY)
            .ok_or(JoinRejection::MissingMetadata(VERSION_KEY))?;

        if *offered != state.app_version {
            return Err(JoinRejection::VersionMismatch {
                expected: state.app_version.clone(),
                offered: offered.clone(),
            });
        }
        Ok(())
    }

    fn join(
        &self,
        ctx: &MatchContext,
        mut state: SessionState,
        presences: &[Presence],
    ) -> Option<SessionState> {
        for presence in presences {
            tracing::debug!(
                match_id = %ctx.match_id,
                user_id = %presence.user_id,
                is_dm = presence.user_id == state.dm,
                "presence added"
            );
            state
                .presences
                .insert(presence.user_id.clone(), presence.clone());
        }
        Some(state)
    }

    fn leave(
        &self,
        ctx: &MatchContext,
        mut state: SessionState,
        presences: &[Presence],
    ) -> Option<SessionState> {
        let mut dm_left = false;
        for presence in presences {
            state.presences.remove(&presence.user_id);
            dm_left |= presence.user_id == state.dm;
        }

        if dm_left {
            tracing::info!(
                match_id = %ctx.match_id,
                dm = %state.dm,
                remaining = state.presences.len(),
                "dm left, ending session"
            );
            return None;
        }
        Some(state)
    }

    fn tick(
        &self,
        _ctx: &MatchContext,
        state: SessionState,
        _messages: Vec<MatchData>,
    ) -> Option<SessionState> {
        Some(state)
    }

    fn signal(
        &self,
        _ctx: &MatchContext,
        state: SessionState,
        _data: &str,
    ) -> (Option<SessionState>, String) {
        (Some(state), String::new())
    }

    fn terminate(
        &self,
        ctx: &MatchContext,
        _state: SessionState,
        grace_seconds: u32,
    ) -> Option<SessionState> {
        tracing::info!(match_id = %ctx.match_id, grace_seconds, "session terminated");
        None
    }
}

#[cfg(test)]
mod tests {
    use tableforge_protocol::MatchId;

    use super::*;

    fn ctx() -> MatchContext {
        MatchContext {
            match_id: MatchId(1),
            tick: 0,
        }
    }

    fn params(pairs: &[(&str, &str)]) -> MatchParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn metadata(version: Option<&str>) -> JoinMetadata {
        version
            .map(|v| (VERSION_KEY.to_string(), v.to_string()))
            .into_iter()
            .collect()
    }

    fn new_session() -> (SessionHandler, SessionState) {
        let handler = SessionHandler::default();
        let init = handler
            .init(&params(&[("version", "1.2.0"), ("dm", "gm")]))
            .unwrap();
        (handler, init.state)
    }

    #[test]
    fn test_init_sets_label_and_tick_rate() {
        let init = SessionHandler::default()
            .init(&params(&[("version", "1.2.0"), ("dm", "gm")]))
            .unwrap();

        assert_eq!(init.label, "1.2.0:gm");
        assert_eq!(init.tick_rate, 30);
        assert!(init.state.presences().is_empty());
        assert_eq!(init.state.dm().as_str(), "gm");
        assert_eq!(init.state.app_version(), "1.2.0");
    }

    #[test]
    fn test_init_missing_version_is_invalid() {
        let result = SessionHandler::default().init(&params(&[("dm", "gm")]));
        assert!(matches!(result, Err(MatchError::InvalidParams(m)) if m.contains("version")));
    }

    #[test]
    fn test_init_blank_dm_is_invalid() {
        let result =
            SessionHandler::default().init(&params(&[("version", "1.2.0"), ("dm", " ")]));
        assert!(matches!(result, Err(MatchError::InvalidParams(m)) if m.contains("dm")));
    }

    #[test]
    fn test_init_keeps_padded_version_for_exact_match() {
        let handler = SessionHandler::default();
        let init = handler
            .init(&params(&[("version", " 1.2.0 "), ("dm", "gm")]))
            .unwrap();
        assert_eq!(init.state.app_version(), " 1.2.0 ");

        let presence = Presence::new("p1", "s1", "p");
        let same = handler.join_attempt(&ctx(), &init.state, &presence, &metadata(Some(" 1.2.0 ")));
        let trimmed = handler.join_attempt(&ctx(), &init.state, &presence, &metadata(Some("1.2.0")));

        assert!(same.is_ok());
        assert!(matches!(trimmed, Err(JoinRejection::VersionMismatch { .. })));
    }

    #[test]
    fn test_join_attempt_without_version_is_rejected() {
        let (handler, state) = new_session();
        let before = state.clone();

        let result =
            handler.join_attempt(&ctx(), &state, &Presence::new("p1", "s1", "p"), &metadata(None));

        let rejection = result.unwrap_err();
        assert_eq!(rejection.to_string(), "missing metadata: 'version'");
        assert_eq!(state, before);
    }

    #[test]
    fn test_join_attempt_wrong_version_names_both() {
        let (handler, state) = new_session();

        let rejection = handler
            .join_attempt(
                &ctx(),
                &state,
                &Presence::new("p1", "s1", "p"),
                &metadata(Some("1.1.9")),
            )
            .unwrap_err();

        let message = rejection.to_string();
        assert!(message.contains("'1.2.0'"), "{message}");
        assert!(message.contains("'1.1.9'"), "{message}");
        assert!(state.presences().is_empty());
    }

    #[test]
    fn test_join_attempt_matching_version_then_join_adds_one_entry() {
        let (handler, state) = new_session();
        let presence = Presence::new("p1", "s1", "p");

        handler
            .join_attempt(&ctx(), &state, &presence, &metadata(Some("1.2.0")))
            .unwrap();
        let state = handler.join(&ctx(), state, &[presence.clone()]).unwrap();

        assert_eq!(state.presences().len(), 1);
        assert_eq!(state.presences()[&UserId::new("p1")], presence);
    }

    #[test]
    fn test_join_same_user_twice_keeps_one_entry() {
        let (handler, state) = new_session();

        let state = handler
            .join(&ctx(), state, &[Presence::new("p1", "s1", "p")])
            .unwrap();
        let state = handler
            .join(&ctx(), state, &[Presence::new("p1", "s2", "p")])
            .unwrap();

        assert_eq!(state.presences().len(), 1);
        assert_eq!(state.presences()[&UserId::new("p1")].session_id, "s2");
    }

    #[test]
    fn test_leave_non_dm_keeps_session_active() {
        let (handler, state) = new_session();
        let gm = Presence::new("gm", "s0", "gm");
        let p1 = Presence::new("p1", "s1", "p");
        let state = handler.join(&ctx(), state, &[gm, p1.clone()]).unwrap();

        let state = handler.leave(&ctx(), state, &[p1]).unwrap();

        assert_eq!(state.presences().len(), 1);
        assert!(state.presences().contains_key(&UserId::new("gm")));
    }

    #[test]
    fn test_leave_dm_terminates_even_with_players_left() {
        let (handler, state) = new_session();
        let gm = Presence::new("gm", "s0", "gm");
        let state = handler
            .join(
                &ctx(),
                state,
                &[
                    gm.clone(),
                    Presence::new("p1", "s1", "p"),
                    Presence::new("p2", "s2", "q"),
                ],
            )
            .unwrap();

        assert!(handler.leave(&ctx(), state, &[gm]).is_none());
    }

    #[test]
    fn test_tick_and_signal_pass_state_through() {
        let (handler, state) = new_session();
        let before = state.clone();

        let state = handler.tick(&ctx(), state, Vec::new()).unwrap();
        let (state, ack) = handler.signal(&ctx(), state, "ping");

        assert_eq!(state, Some(before));
        assert_eq!(ack, "");
    }

    #[test]
    fn test_terminate_is_unconditional() {
        let (handler, state) = new_session();
        assert!(handler.terminate(&ctx(), state, 30).is_none());
    }
}
