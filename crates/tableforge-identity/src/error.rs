//! Error types for the identity layer.

use tableforge_protocol::UserId;

/// Why an authentication request failed.
///
/// Callers need to tell these apart: an unreachable provider is worth a
/// retry and a "try again later" message, a rejected assertion is not.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// A required field is missing or malformed, e.g. the assertion has no
    /// `openid.sig`. Detected before any network call is made.
    #[error("invalid identity assertion: {0}")]
    Validation(String),

    /// Steam's relay endpoint could not be reached, timed out, or returned
    /// an unreadable body.
    #[error("identity provider unreachable: {0}")]
    ProviderUnreachable(#[source] reqwest::Error),

    /// Steam answered, and the answer was "not valid".
    #[error("identity assertion rejected by provider")]
    AssertionRejected,

    /// The Web API lookup failed: transport error, bad status, bad JSON,
    /// or no player in the response.
    #[error("profile lookup failed: {0}")]
    ProfileLookupFailed(String),
}

/// Errors an [`AccountStore`](crate::AccountStore) may report.
#[derive(Debug, thiserror::Error)]
pub enum AccountStoreError {
    /// No account exists with this id.
    #[error("account {0} not found")]
    NotFound(UserId),

    /// The backing storage failed.
    #[error("account store failure: {0}")]
    Backend(String),
}
