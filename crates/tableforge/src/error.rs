//! Unified error type for Tableforge.

use tableforge_identity::{ConfigError, IdentityError};
use tableforge_match::MatchError;
use tableforge_protocol::ProtocolError;

/// Top-level error that wraps all crate-specific errors.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum TableforgeError {
    /// Startup configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Sign-in failed (validation, provider, profile lookup).
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// A session operation failed (not found, rejected, ended).
    #[error(transparent)]
    Match(#[from] MatchError),

    /// An RPC payload could not be decoded or encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
