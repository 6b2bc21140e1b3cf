//! Shared vocabulary for Tableforge.
//!
//! This crate defines the types every other layer speaks in:
//!
//! - **Identity** ([`UserId`], [`MatchId`]): who a player is and which
//!   session they are in.
//! - **Presence** ([`Presence`]): one connected participant of a session.
//! - **Session traffic** ([`MatchData`]): messages queued for a session's
//!   next tick.
//! - **RPC payloads** ([`StartSessionRequest`], [`StartSessionResponse`]):
//!   the JSON bodies of the start-session call.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how payloads are turned
//!   into bytes and back.
//!
//! # Architecture
//!
//! ```text
//! Identity (who are you?)  ──┐
//!                            ├──→ Protocol (shared types)
//! Match (which session?)   ──┘
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    MatchData, MatchId, Presence, StartSessionRequest, StartSessionResponse,
    UserId,
};
