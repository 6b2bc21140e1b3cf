//! Session lifecycle for Tableforge.
//!
//! Each match runs as an isolated Tokio task (actor model) that owns its
//! handler state, its presences, and a tick scheduler.
//!
//! # Key types
//!
//! - [`MatchHandler`]: the per-session state machine the runtime drives
//! - [`SessionHandler`]: the tabletop session (dm, players, version lock)
//! - [`MatchRegistry`]: creates matches and routes commands by id
//! - [`MatchHandle`]: sends commands to one running match

mod actor;
mod error;
mod handler;
mod registry;
mod session;

pub use actor::{MatchHandle, MatchInfo};
pub use error::{JoinRejection, MatchError};
pub use handler::{JoinMetadata, MatchContext, MatchHandler, MatchInit, MatchParams};
pub use registry::{MatchRegistry, collect_info};
pub use session::{DM_KEY, SessionConfig, SessionHandler, SessionState, VERSION_KEY};
