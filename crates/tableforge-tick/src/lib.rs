//! Fixed-timestep heartbeat for Tableforge sessions.
//!
//! Every active session ticks at a fixed rate (30 Hz by default). The tick
//! is the only scheduling heartbeat inside a session actor, so it lives in
//! the actor's `tokio::select!` next to the command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* join, leave, signal, ... */ }
//!         info = scheduler.wait_for_tick() => { /* drain queued data */ }
//!     }
//! }
//! ```
//!
//! A rate of 0 puts the scheduler in event-driven mode: `wait_for_tick`
//! never resolves and only the command branch makes progress. A paused
//! scheduler behaves the same way until resumed; session actors pause
//! while nobody is connected.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`TickScheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickConfig {
    /// Tick rate in Hz. 0 = event-driven (never ticks).
    pub tick_rate_hz: u32,
    /// Upper bound (µs) of random delay added to the first tick, so that
    /// sessions created in the same instant don't tick in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 0,
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    /// Highest tick rate the scheduler accepts; larger values are clamped.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    /// Config for a given rate with default jitter.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Returns a copy with the rate clamped to [`Self::MAX_TICK_RATE_HZ`].
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick rate above maximum, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self
    }

    /// Length of one tick, or `None` in event-driven mode.
    pub fn tick_duration(&self) -> Option<Duration> {
        (self.tick_rate_hz > 0)
            .then(|| Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz)))
    }
}

// ---------------------------------------------------------------------------
// TickInfo
// ---------------------------------------------------------------------------

/// What [`TickScheduler::wait_for_tick`] reports for each fired tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Tick number, starting at 1 and increasing by one per fired tick.
    pub tick: u64,
    /// Fixed step length (`1 / tick_rate`), independent of wall-clock lag.
    pub dt: Duration,
    /// The tick woke up more than 10% of a step late.
    pub overrun: bool,
    /// Whole steps that were skipped because of the overrun.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-timestep tick scheduler. One per session actor.
///
/// Overruns are handled by skipping: after a late wakeup the next tick is
/// scheduled one step from *now*, never from the missed deadline, so a
/// stalled actor cannot fall into a burst of back-to-back ticks.
#[derive(Debug)]
pub struct TickScheduler {
    rate_hz: u32,
    step: Option<Duration>,
    next_tick: Option<Instant>,
    tick_count: u64,
    total_skipped: u64,
    paused: bool,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let step = config.tick_duration();

        let next_tick = step.map(|step| {
            let jitter = match config.initial_jitter_us {
                0 => Duration::ZERO,
                max => Duration::from_micros(rand::rng().random_range(0..max)),
            };
            Instant::now() + step + jitter
        });

        match step {
            Some(step) => debug!(
                rate_hz = config.tick_rate_hz,
                step_ms = step.as_secs_f64() * 1000.0,
                "tick scheduler created"
            ),
            None => debug!("tick scheduler created in event-driven mode"),
        }

        Self {
            rate_hz: config.tick_rate_hz,
            step,
            next_tick,
            tick_count: 0,
            total_skipped: 0,
            paused: false,
        }
    }

    /// Scheduler for `tick_rate_hz` with default jitter.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Sleeps until the next tick is due and reports it.
    ///
    /// Pends forever in event-driven mode or while paused. Cancel-safe: if
    /// the future is dropped by `select!` before the deadline, no tick is
    /// consumed.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (deadline, step) = match (self.next_tick, self.step) {
            (Some(deadline), Some(step)) if !self.paused => (deadline, step),
            _ => std::future::pending().await,
        };

        time::sleep_until(deadline).await;

        let now = Instant::now();
        let late_by = now.saturating_duration_since(deadline);
        let overrun = late_by > step / 10;
        let ticks_skipped = if overrun {
            (late_by.as_nanos() / step.as_nanos()) as u64
        } else {
            0
        };

        self.tick_count += 1;
        self.total_skipped += ticks_skipped;
        self.next_tick = Some(now + step);

        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, skipping ahead"
            );
        }
        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: step,
            overrun,
            ticks_skipped,
        }
    }

    /// Stops ticking until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Restarts ticking one step from now. Time spent paused is not
    /// caught up. Idempotent.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = self.step.map(|step| Instant::now() + step);
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// `true` when the rate is 0 and ticks never fire.
    pub fn is_event_driven(&self) -> bool {
        self.step.is_none()
    }

    /// Number of ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Total steps skipped by overruns over the scheduler's lifetime.
    pub fn total_skipped(&self) -> u64 {
        self.total_skipped
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.rate_hz
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        self.step
    }
}
