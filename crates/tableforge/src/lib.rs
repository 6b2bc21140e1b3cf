//! # Tableforge
//!
//! Steam sign-in and tabletop session lifecycle for game backends.
//!
//! A host runtime embeds one [`Tableforge`] and calls into it at three
//! points:
//!
//! - **authentication**: [`Tableforge::authenticate`] verifies a Steam
//!   OpenID assertion and fills in the player's profile;
//!   [`Tableforge::after_authenticate`] links that profile to a newly
//!   created account.
//! - **the start-session RPC**: [`Tableforge::start_session`] creates a
//!   session owned by the caller (its dm) and locked to a client version.
//! - **session events**: joins and leaves, routed to the session's actor.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tableforge::prelude::*;
//!
//! # async fn run() -> Result<(), TableforgeError> {
//! tableforge::init_tracing();
//!
//! let forge = TableforgeBuilder::new().build(MemoryAccountStore::new())?;
//! let _reply = forge
//!     .start_session(&UserId::new("gm"), br#"{"version":"1.4.0"}"#)
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod server;
mod telemetry;

pub use error::TableforgeError;
pub use server::{Tableforge, TableforgeBuilder};
pub use telemetry::init_tracing;

/// Everything a host needs, in one import.
pub mod prelude {
    pub use crate::{Tableforge, TableforgeBuilder, TableforgeError};
    pub use tableforge_identity::{
        Account, AccountStore, AccountStoreError, AccountUpdate, AuthenticateRequest,
        Authenticator, ConfigError, IdentityError, LinkOutcome, MemoryAccountStore, SkipReason,
        SteamAuthenticator, SteamConfig,
    };
    pub use tableforge_match::{
        JoinMetadata, JoinRejection, MatchError, MatchInfo, SessionConfig,
    };
    pub use tableforge_protocol::{
        MatchData, MatchId, Presence, ProtocolError, StartSessionRequest, StartSessionResponse,
        UserId,
    };
}
