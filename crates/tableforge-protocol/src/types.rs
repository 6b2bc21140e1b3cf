//! Core types shared by the identity and match layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's account identifier, as issued by the host runtime.
///
/// A string newtype rather than an integer: host ids are UUIDs, and the
/// Steam ids we link against don't survive a round trip through a
/// JavaScript number.
///
/// `#[serde(transparent)]` keeps it a bare string on the wire.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Wraps anything string-like as a `UserId`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A unique identifier for one running session (a "match").
///
/// Displayed and exchanged with clients as `M-<n>`; see the [`FromStr`]
/// impl for the accepted inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub u64);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// Parses the join code a client types in. Both `M-12` and a bare `12`
/// are accepted.
impl FromStr for MatchId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_prefix("M-").unwrap_or(s.trim());
        digits.parse::<u64>().map(MatchId).map_err(|_| {
            ProtocolError::InvalidMessage(format!("not a match id: {s:?}"))
        })
    }
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// One connected participant of a session.
///
/// A user may reconnect with a new `session_id`; the match keys presences
/// by `user_id` so a reconnect replaces the earlier handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    /// The participant's account.
    pub user_id: UserId,
    /// The connection this presence arrived on.
    pub session_id: String,
    /// Display name at the time of joining.
    pub username: String,
}

impl Presence {
    pub fn new(
        user_id: impl Into<UserId>,
        session_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            username: username.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// MatchData
// ---------------------------------------------------------------------------

/// A message sent by a participant into a running session.
///
/// Messages are queued by the match runtime and handed to the session
/// handler in bulk on the next tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchData {
    pub sender: UserId,
    /// Application-defined message kind.
    pub op_code: i64,
    /// Opaque payload.
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Start-session RPC payloads
// ---------------------------------------------------------------------------

/// Body of the start-session RPC.
///
/// `version` is the client's compatibility version; every player joining
/// the created session must present the same string. Older clients send
/// `Version`, so that spelling is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StartSessionRequest {
    #[serde(default, alias = "Version")]
    pub version: Option<String>,
}

/// Reply to the start-session RPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSessionResponse {
    /// The new session's id, formatted as `M-<n>`.
    pub match_id: String,
}
