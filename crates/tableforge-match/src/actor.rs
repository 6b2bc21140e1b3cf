//! Match actor: one Tokio task per running match.
//!
//! The actor owns the handler state outright and processes commands one at
//! a time, so a [`MatchHandler`] never needs a lock. The outside world
//! talks to it through a [`MatchHandle`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tableforge_protocol::{MatchData, MatchId, Presence, UserId};
use tableforge_tick::{TickInfo, TickScheduler};
use tokio::sync::{mpsc, oneshot};

use crate::{JoinMetadata, MatchContext, MatchError, MatchHandler, MatchInit};

/// Commands sent to a match actor through its channel.
pub(crate) enum MatchCommand {
    /// Admission check, then join, as one step.
    Join {
        presence: Presence,
        metadata: JoinMetadata,
        reply: oneshot::Sender<Result<(), MatchError>>,
    },

    Leave {
        presences: Vec<Presence>,
        reply: oneshot::Sender<()>,
    },

    /// Queue data for the next tick. No reply.
    Data(MatchData),

    Signal {
        data: String,
        reply: oneshot::Sender<String>,
    },

    Terminate {
        grace_seconds: u32,
        reply: oneshot::Sender<()>,
    },

    Info {
        reply: oneshot::Sender<MatchInfo>,
    },
}

/// A snapshot of match metadata (not the handler state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchInfo {
    pub match_id: MatchId,
    pub label: String,
    pub tick_rate: u32,
    /// Ticks fired so far.
    pub tick: u64,
    /// Connected user ids, sorted.
    pub presences: Vec<UserId>,
}

impl MatchInfo {
    pub fn presence_count(&self) -> usize {
        self.presences.len()
    }
}

/// Handle to a running match actor.
///
/// Cheap to clone. Every method fails with [`MatchError::Unavailable`]
/// once the match has ended.
#[derive(Debug, Clone)]
pub struct MatchHandle {
    match_id: MatchId,
    sender: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// `true` once the actor has stopped.
    pub fn is_finished(&self) -> bool {
        self.sender.is_closed()
    }

    /// Asks the match to admit `presence`.
    ///
    /// # Errors
    /// [`MatchError::Rejected`] if the handler refused; the match state is
    /// untouched in that case.
    pub async fn join(
        &self,
        presence: Presence,
        metadata: JoinMetadata,
    ) -> Result<(), MatchError> {
        let (reply, rx) = oneshot::channel();
        self.send(MatchCommand::Join {
            presence,
            metadata,
            reply,
        })
        .await?;
        rx.await.map_err(|_| self.unavailable())?
    }

    pub async fn leave(&self, presences: Vec<Presence>) -> Result<(), MatchError> {
        let (reply, rx) = oneshot::channel();
        self.send(MatchCommand::Leave { presences, reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Queues `data` for the next tick (fire-and-forget). Data from a
    /// sender who is not in the match is dropped by the actor.
    pub async fn send_data(&self, data: MatchData) -> Result<(), MatchError> {
        self.send(MatchCommand::Data(data)).await
    }

    pub async fn signal(&self, data: impl Into<String>) -> Result<String, MatchError> {
        let (reply, rx) = oneshot::channel();
        self.send(MatchCommand::Signal {
            data: data.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| self.unavailable())
    }

    pub async fn terminate(&self, grace_seconds: u32) -> Result<(), MatchError> {
        let (reply, rx) = oneshot::channel();
        self.send(MatchCommand::Terminate {
            grace_seconds,
            reply,
        })
        .await?;
        rx.await.map_err(|_| self.unavailable())
    }

    pub async fn info(&self) -> Result<MatchInfo, MatchError> {
        let (reply, rx) = oneshot::channel();
        self.send(MatchCommand::Info { reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    async fn send(&self, cmd: MatchCommand) -> Result<(), MatchError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> MatchError {
        MatchError::Unavailable(self.match_id)
    }
}

/// The internal actor. Runs inside a Tokio task.
struct MatchActor<H: MatchHandler> {
    match_id: MatchId,
    label: String,
    tick_rate: u32,
    handler: Arc<H>,
    /// `None` once the handler has ended the match.
    state: Option<H::State>,
    /// Mirror of who is connected, for data filtering and tick pausing.
    presences: HashMap<UserId, Presence>,
    queued: Vec<MatchData>,
    scheduler: TickScheduler,
    receiver: mpsc::Receiver<MatchCommand>,
}

impl<H: MatchHandler> MatchActor<H> {
    async fn run(mut self) {
        tracing::info!(match_id = %self.match_id, label = %self.label, "match actor started");

        while self.state.is_some() {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => {
                        tracing::debug!(match_id = %self.match_id, "all handles dropped");
                        break;
                    }
                },
                info = self.scheduler.wait_for_tick() => self.handle_tick(info),
            }
        }

        tracing::info!(
            match_id = %self.match_id,
            ticks = self.scheduler.tick_count(),
            "match actor stopped"
        );
    }

    fn handle_command(&mut self, cmd: MatchCommand) {
        match cmd {
            MatchCommand::Join {
                presence,
                metadata,
                reply,
            } => {
                let result = self.handle_join(presence, metadata);
                let _ = reply.send(result);
            }
            MatchCommand::Leave { presences, reply } => {
                self.handle_leave(presences);
                let _ = reply.send(());
            }
            MatchCommand::Data(data) => self.handle_data(data),
            MatchCommand::Signal { data, reply } => {
                let ctx = self.context();
                if let Some(state) = self.state.take() {
                    let (state, ack) = self.handler.signal(&ctx, state, &data);
                    self.state = state;
                    let _ = reply.send(ack);
                }
            }
            MatchCommand::Terminate {
                grace_seconds,
                reply,
            } => {
                self.apply(|h, ctx, state| h.terminate(ctx, state, grace_seconds));
                let _ = reply.send(());
            }
            MatchCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
        }

        if self.state.is_none() {
            tracing::info!(match_id = %self.match_id, "match ended");
        }
    }

    fn handle_join(
        &mut self,
        presence: Presence,
        metadata: JoinMetadata,
    ) -> Result<(), MatchError> {
        let ctx = self.context();
        let state = self
            .state
            .as_ref()
            .ok_or(MatchError::Unavailable(self.match_id))?;

        if let Err(rejection) = self.handler.join_attempt(&ctx, state, &presence, &metadata) {
            tracing::info!(
                match_id = %self.match_id,
                user_id = %presence.user_id,
                reason = %rejection,
                "join rejected"
            );
            return Err(rejection.into());
        }

        let joined = std::slice::from_ref(&presence);
        self.apply(|h, ctx, state| h.join(ctx, state, joined));
        if self.state.is_none() {
            return Ok(());
        }

        tracing::info!(
            match_id = %self.match_id,
            user_id = %presence.user_id,
            presences = self.presences.len() + 1,
            "player joined"
        );
        self.presences.insert(presence.user_id.clone(), presence);
        self.sync_scheduler();
        Ok(())
    }

    fn handle_leave(&mut self, presences: Vec<Presence>) {
        for presence in &presences {
            if self.presences.remove(&presence.user_id).is_some() {
                tracing::info!(
                    match_id = %self.match_id,
                    user_id = %presence.user_id,
                    presences = self.presences.len(),
                    "player left"
                );
            }
        }

        self.apply(|h, ctx, state| h.leave(ctx, state, &presences));
        self.sync_scheduler();
    }

    fn handle_data(&mut self, data: MatchData) {
        if !self.presences.contains_key(&data.sender) {
            tracing::warn!(
                match_id = %self.match_id,
                sender = %data.sender,
                "data from non-member, dropping"
            );
            return;
        }
        self.queued.push(data);
    }

    fn handle_tick(&mut self, info: TickInfo) {
        let messages = std::mem::take(&mut self.queued);
        tracing::trace!(
            match_id = %self.match_id,
            tick = info.tick,
            messages = messages.len(),
            "tick"
        );
        self.apply(|h, ctx, state| h.tick(ctx, state, messages));
    }

    /// Runs a consuming handler callback against the current state.
    fn apply(&mut self, f: impl FnOnce(&H, &MatchContext, H::State) -> Option<H::State>) {
        let ctx = self.context();
        if let Some(state) = self.state.take() {
            self.state = f(self.handler.as_ref(), &ctx, state);
        }
    }

    /// Ticks only while someone is connected.
    fn sync_scheduler(&mut self) {
        if self.presences.is_empty() {
            self.scheduler.pause();
        } else {
            self.scheduler.resume();
        }
    }

    fn context(&self) -> MatchContext {
        MatchContext {
            match_id: self.match_id,
            tick: self.scheduler.tick_count(),
        }
    }

    fn info(&self) -> MatchInfo {
        let mut presences: Vec<UserId> = self.presences.keys().cloned().collect();
        presences.sort();
        MatchInfo {
            match_id: self.match_id,
            label: self.label.clone(),
            tick_rate: self.tick_rate,
            tick: self.scheduler.tick_count(),
            presences,
        }
    }
}

/// Spawns a match actor for an already-initialised state and returns a
/// handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_match<H: MatchHandler>(
    match_id: MatchId,
    handler: Arc<H>,
    init: MatchInit<H::State>,
    channel_size: usize,
) -> MatchHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let mut scheduler = TickScheduler::with_rate(init.tick_rate);
    // Nobody is connected yet.
    scheduler.pause();

    let actor = MatchActor {
        match_id,
        label: init.label,
        tick_rate: init.tick_rate,
        handler,
        state: Some(init.state),
        presences: HashMap::new(),
        queued: Vec::new(),
        scheduler,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    MatchHandle {
        match_id,
        sender: tx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JoinRejection, MatchParams};

    /// Ends the match on the first join.
    struct OneShotHandler;

    impl MatchHandler for OneShotHandler {
        type State = ();

        fn init(&self, _params: &MatchParams) -> Result<MatchInit<()>, MatchError> {
            Ok(MatchInit {
                state: (),
                tick_rate: 10,
                label: "one-shot".into(),
            })
        }

        fn join_attempt(
            &self,
            _ctx: &MatchContext,
            _state: &(),
            _presence: &Presence,
            _metadata: &JoinMetadata,
        ) -> Result<(), JoinRejection> {
            Ok(())
        }

        fn join(&self, _ctx: &MatchContext, _state: (), _p: &[Presence]) -> Option<()> {
            None
        }

        fn leave(&self, _ctx: &MatchContext, state: (), _p: &[Presence]) -> Option<()> {
            Some(state)
        }

        fn tick(&self, _ctx: &MatchContext, state: (), _m: Vec<MatchData>) -> Option<()> {
            Some(state)
        }

        fn signal(&self, _ctx: &MatchContext, state: (), _data: &str) -> (Option<()>, String) {
            (Some(state), String::new())
        }

        fn terminate(&self, _ctx: &MatchContext, _state: (), _grace: u32) -> Option<()> {
            None
        }
    }

    fn actor() -> MatchActor<OneShotHandler> {
        let (_tx, rx) = mpsc::channel(1);
        let mut scheduler = TickScheduler::with_rate(10);
        scheduler.pause();
        MatchActor {
            match_id: MatchId(1),
            label: "one-shot".into(),
            tick_rate: 10,
            handler: Arc::new(OneShotHandler),
            state: Some(()),
            presences: HashMap::new(),
            queued: Vec::new(),
            scheduler,
            receiver: rx,
        }
    }

    #[tokio::test]
    async fn test_join_that_ends_match_leaves_no_presence() {
        let mut actor = actor();

        let result = actor.handle_join(Presence::new("p1", "s1", "p1"), JoinMetadata::new());

        assert!(result.is_ok());
        assert!(actor.state.is_none());
        assert!(actor.presences.is_empty());
        assert!(actor.scheduler.is_paused());
    }
}
