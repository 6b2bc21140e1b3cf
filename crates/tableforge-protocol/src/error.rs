//! Error types for the protocol layer.
//!
//! Each Tableforge crate defines its own error enum. A `ProtocolError`
//! always means the problem is in turning bytes into types (or back),
//! never in identity verification or session management.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, wrong data types, or a truncated
    /// RPC payload.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The value parsed but is not meaningful, e.g. a match id string
    /// that isn't `M-<number>`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
