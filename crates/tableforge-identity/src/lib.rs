//! Player identity for Tableforge.
//!
//! Players sign in through Steam's OpenID relay. The browser comes back
//! with a signed assertion; this crate turns that assertion into a
//! durable account:
//!
//! 1. **Relay verification**: replay the signed fields to Steam and read
//!    its verdict ([`RelayVerifier`]).
//! 2. **Profile resolution**: look the verified Steam id up in the Web
//!    API ([`ProfileResolver`]).
//! 3. **Account linking**: on the very first login, copy the profile onto
//!    the account record ([`AccountLinker`]).
//!
//! [`SteamAuthenticator`] runs the three steps as the before/after hooks of
//! an authentication request.
//!
//! # How it fits in the stack
//!
//! ```text
//! Facade (above)    ← calls authenticate / after_authenticate per request
//!     ↕
//! Identity (this crate)  ← talks to Steam, writes to the AccountStore
//!     ↕
//! Protocol (below)  ← provides UserId
//! ```

#![allow(async_fn_in_trait)]

mod assertion;
mod auth;
mod config;
mod error;
mod linker;
mod profile;
mod relay;
mod store;

pub use assertion::{IdentityAssertion, OPENID_NS, VerifiedIdentity};
pub use auth::{AuthenticateRequest, Authenticator, SteamAuthenticator};
pub use config::{ConfigError, SteamConfig};
pub use error::{AccountStoreError, IdentityError};
pub use linker::{AccountLinker, LinkOutcome, SkipReason};
pub use profile::{Profile, ProfileResolver};
pub use relay::RelayVerifier;
pub use store::{Account, AccountStore, AccountUpdate, MemoryAccountStore};
