//! Match registry: creates matches and routes commands to them by id.

use std::collections::HashMap;
use std::sync::Arc;

use tableforge_protocol::{MatchData, MatchId, Presence};

use crate::actor::spawn_match;
use crate::{JoinMetadata, MatchError, MatchHandle, MatchHandler, MatchInfo, MatchParams};

/// Default command channel size for match actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// All live matches of one handler type.
///
/// Holds only handles; match state lives in the actors. Ended matches stay
/// listed (and answer [`MatchError::Unavailable`]) until
/// [`reap_finished`](Self::reap_finished) removes them.
pub struct MatchRegistry<H: MatchHandler> {
    handler: Arc<H>,
    matches: HashMap<MatchId, MatchHandle>,
    next_id: u64,
    channel_size: usize,
}

impl<H: MatchHandler> MatchRegistry<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
            matches: HashMap::new(),
            next_id: 1,
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }

    /// Sets the command queue bound for matches created from now on.
    pub fn with_channel_size(mut self, channel_size: usize) -> Self {
        self.channel_size = channel_size.max(1);
        self
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Initialises and spawns a match.
    ///
    /// # Errors
    /// Whatever [`MatchHandler::init`] returns; nothing is spawned and no
    /// id is consumed in that case.
    pub fn create_match(&mut self, params: &MatchParams) -> Result<MatchId, MatchError> {
        let init = self.handler.init(params).inspect_err(|e| {
            tracing::info!(error = %e, "match creation refused");
        })?;

        let match_id = MatchId(self.next_id);
        self.next_id += 1;

        let label = init.label.clone();
        let handle = spawn_match(match_id, Arc::clone(&self.handler), init, self.channel_size);
        self.matches.insert(match_id, handle);
        tracing::info!(%match_id, %label, "match created");
        Ok(match_id)
    }

    /// Returns a clone of a match's handle, for use without holding the
    /// registry.
    pub fn handle(&self, match_id: MatchId) -> Result<MatchHandle, MatchError> {
        self.matches
            .get(&match_id)
            .cloned()
            .ok_or(MatchError::NotFound(match_id))
    }

    pub async fn join(
        &self,
        match_id: MatchId,
        presence: Presence,
        metadata: JoinMetadata,
    ) -> Result<(), MatchError> {
        self.get(match_id)?.join(presence, metadata).await
    }

    pub async fn leave(
        &self,
        match_id: MatchId,
        presences: Vec<Presence>,
    ) -> Result<(), MatchError> {
        self.get(match_id)?.leave(presences).await
    }

    pub async fn send_data(&self, match_id: MatchId, data: MatchData) -> Result<(), MatchError> {
        self.get(match_id)?.send_data(data).await
    }

    pub async fn signal(
        &self,
        match_id: MatchId,
        data: impl Into<String>,
    ) -> Result<String, MatchError> {
        self.get(match_id)?.signal(data).await
    }

    pub async fn terminate(&self, match_id: MatchId, grace_seconds: u32) -> Result<(), MatchError> {
        self.get(match_id)?.terminate(grace_seconds).await
    }

    pub async fn info(&self, match_id: MatchId) -> Result<MatchInfo, MatchError> {
        self.get(match_id)?.info().await
    }

    /// Info for every match still running, in id order.
    pub async fn list(&self) -> Vec<MatchInfo> {
        collect_info(self.handles()).await
    }

    /// Clones every handle, ended matches included.
    pub fn handles(&self) -> Vec<MatchHandle> {
        self.matches.values().cloned().collect()
    }

    /// Drops ended matches and returns their ids.
    pub fn reap_finished(&mut self) -> Vec<MatchId> {
        let mut reaped = Vec::new();
        self.matches.retain(|match_id, handle| {
            let finished = handle.is_finished();
            if finished {
                reaped.push(*match_id);
            }
            !finished
        });
        for match_id in &reaped {
            tracing::debug!(%match_id, "match reaped");
        }
        reaped
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    fn get(&self, match_id: MatchId) -> Result<&MatchHandle, MatchError> {
        self.matches
            .get(&match_id)
            .ok_or(MatchError::NotFound(match_id))
    }
}

/// Asks each match for its info, skipping ended ones. Sorted by id.
///
/// Takes owned handles so callers can release whatever guards the
/// registry before the actor round trips.
pub async fn collect_info(handles: impl IntoIterator<Item = MatchHandle>) -> Vec<MatchInfo> {
    let mut infos = Vec::new();
    for handle in handles {
        if let Ok(info) = handle.info().await {
            infos.push(info);
        }
    }
    infos.sort_by_key(|info| info.match_id.0);
    infos
}
