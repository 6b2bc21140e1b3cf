//! Error types for the match layer.

use tableforge_protocol::MatchId;

/// Why a player was refused entry to a session.
///
/// The `Display` text is sent to the client verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinRejection {
    /// The join request lacked a required metadata key.
    #[error("missing metadata: '{0}'")]
    MissingMetadata(&'static str),

    /// The client runs a different build than the session was created
    /// with.
    #[error("Mismatch in client versions. Was expecting '{expected}' but was given '{offered}'")]
    VersionMismatch { expected: String, offered: String },
}

/// Errors that can occur during match operations.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// No match with this id is registered.
    #[error("match {0} not found")]
    NotFound(MatchId),

    /// Creation parameters were missing or unusable. Nothing was spawned.
    #[error("invalid match parameters: {0}")]
    InvalidParams(String),

    /// The handler refused a join. The session is unaffected.
    #[error(transparent)]
    Rejected(#[from] JoinRejection),

    /// The match has ended (or its channel is full and closed).
    #[error("match {0} is unavailable")]
    Unavailable(MatchId),
}
