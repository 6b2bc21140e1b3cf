//! The `MatchHandler` trait: the per-session state machine the runtime
//! drives.
//!
//! Every lifecycle method except [`join_attempt`](MatchHandler::join_attempt)
//! consumes the state and returns `Option<State>`. Returning `None` ends
//! the match: the actor stops and later commands fail with
//! [`MatchError::Unavailable`](crate::MatchError::Unavailable).

use std::collections::HashMap;

use tableforge_protocol::{MatchData, MatchId, Presence};

use crate::{JoinRejection, MatchError};

/// Parameters a match is created with.
pub type MatchParams = HashMap<String, String>;

/// Metadata a client attaches to a join request.
pub type JoinMetadata = HashMap<String, String>;

/// What [`MatchHandler::init`] produces.
#[derive(Debug, Clone)]
pub struct MatchInit<S> {
    pub state: S,
    /// Tick rate in Hz. 0 means the match never ticks.
    pub tick_rate: u32,
    /// Free-form label, shown in match listings.
    pub label: String,
}

/// Read-only facts about the running match, passed to every callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchContext {
    pub match_id: MatchId,
    /// Ticks fired so far.
    pub tick: u64,
}

/// Session rules, implemented once per kind of match.
///
/// The runtime calls these strictly serially for a given match, from that
/// match's actor task; implementations never see concurrent access to a
/// state value.
pub trait MatchHandler: Send + Sync + 'static {
    /// Per-match state, owned by the actor.
    type State: Send + 'static;

    /// Builds the initial state from creation parameters.
    ///
    /// Runs on the caller's task before anything is spawned.
    fn init(&self, params: &MatchParams) -> Result<MatchInit<Self::State>, MatchError>;

    /// Admission check. Cannot mutate: a rejected presence must never
    /// appear in the state, even transiently.
    fn join_attempt(
        &self,
        ctx: &MatchContext,
        state: &Self::State,
        presence: &Presence,
        metadata: &JoinMetadata,
    ) -> Result<(), JoinRejection>;

    /// Admitted presences arriving.
    fn join(
        &self,
        ctx: &MatchContext,
        state: Self::State,
        presences: &[Presence],
    ) -> Option<Self::State>;

    /// Presences departing.
    fn leave(
        &self,
        ctx: &MatchContext,
        state: Self::State,
        presences: &[Presence],
    ) -> Option<Self::State>;

    /// One heartbeat, with the data queued since the previous one.
    fn tick(
        &self,
        ctx: &MatchContext,
        state: Self::State,
        messages: Vec<MatchData>,
    ) -> Option<Self::State>;

    /// An out-of-band request from the host. The string is returned to the
    /// signaller.
    fn signal(
        &self,
        ctx: &MatchContext,
        state: Self::State,
        data: &str,
    ) -> (Option<Self::State>, String);

    /// The host is shutting the match down; `grace_seconds` is advisory.
    fn terminate(
        &self,
        ctx: &MatchContext,
        state: Self::State,
        grace_seconds: u32,
    ) -> Option<Self::State>;
}
