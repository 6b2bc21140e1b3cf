//! Integration tests for the session heartbeat.
//!
//! Uses `start_paused = true` so tokio's clock only moves when every task
//! is idle (or when we `advance` it), which makes tick timing exact.

use std::time::Duration;

use tableforge_tick::{TickConfig, TickScheduler};

// =========================================================================
// Helpers
// =========================================================================

fn session_rate() -> TickConfig {
    TickConfig {
        initial_jitter_us: 0,
        ..TickConfig::with_rate(30)
    }
}

fn config_20hz() -> TickConfig {
    TickConfig {
        initial_jitter_us: 0,
        ..TickConfig::with_rate(20)
    }
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_is_event_driven() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.tick_rate_hz, 0);
    assert_eq!(cfg.tick_duration(), None);
}

#[test]
fn test_session_rate_duration_is_one_thirtieth() {
    let dur = session_rate().tick_duration().unwrap();
    assert_eq!(dur, Duration::from_secs_f64(1.0 / 30.0));
}

#[test]
fn test_validated_clamps_excessive_rate() {
    let cfg = TickConfig::with_rate(1_000).validated();
    assert_eq!(cfg.tick_rate_hz, TickConfig::MAX_TICK_RATE_HZ);
}

// =========================================================================
// Scheduler creation and accessors
// =========================================================================

#[test]
fn test_scheduler_initial_state() {
    let s = TickScheduler::new(config_20hz());
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.total_skipped(), 0);
    assert_eq!(s.tick_rate_hz(), 20);
    assert!(!s.is_event_driven());
    assert!(!s.is_paused());
    assert_eq!(s.tick_duration(), Some(Duration::from_millis(50)));
}

#[test]
fn test_with_rate_zero_is_event_driven() {
    let s = TickScheduler::with_rate(0);
    assert!(s.is_event_driven());
    assert_eq!(s.tick_duration(), None);
}

// =========================================================================
// Tick firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_fires_and_increments() {
    let mut s = TickScheduler::new(config_20hz());

    let info = s.wait_for_tick().await;

    assert_eq!(info.tick, 1);
    assert_eq!(info.dt, Duration::from_millis(50));
    assert!(!info.overrun);
    assert_eq!(info.ticks_skipped, 0);
    assert_eq!(s.tick_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_are_numbered_monotonically() {
    let mut s = TickScheduler::new(session_rate());

    for expected in 1..=5 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
    }
}

#[tokio::test(start_paused = true)]
async fn test_event_driven_never_fires() {
    let mut s = TickScheduler::with_rate(0);

    let result =
        tokio::time::timeout(Duration::from_secs(5), s.wait_for_tick()).await;

    assert!(result.is_err(), "event-driven scheduler should pend forever");
}

// =========================================================================
// Overrun handling
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_late_wakeup_skips_missed_steps() {
    let mut s = TickScheduler::new(config_20hz());

    // First deadline is at 50ms; wake up at 170ms → 120ms late = 2 steps.
    tokio::time::advance(Duration::from_millis(170)).await;
    let info = s.wait_for_tick().await;

    assert!(info.overrun);
    assert_eq!(info.ticks_skipped, 2);
    assert_eq!(s.total_skipped(), 2);

    // The schedule restarts from now, so the next tick is on time.
    let next = s.wait_for_tick().await;
    assert!(!next.overrun);
    assert_eq!(next.tick, 2);
}

// =========================================================================
// Pause / Resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_prevents_ticks() {
    let mut s = TickScheduler::new(config_20hz());
    s.wait_for_tick().await;

    s.pause();

    let result =
        tokio::time::timeout(Duration::from_secs(1), s.wait_for_tick()).await;
    assert!(result.is_err(), "paused scheduler should pend");
    assert_eq!(s.tick_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resume_does_not_catch_up_paused_time() {
    let mut s = TickScheduler::new(config_20hz());
    s.wait_for_tick().await;
    s.pause();
    tokio::time::advance(Duration::from_secs(10)).await;

    s.resume();
    let info = s.wait_for_tick().await;

    assert_eq!(info.tick, 2);
    assert!(!info.overrun, "time spent paused must not count as lag");
}

#[test]
fn test_pause_resume_idempotent() {
    let mut s = TickScheduler::new(config_20hz());

    s.pause();
    s.pause();
    assert!(s.is_paused());

    s.resume();
    s.resume();
    assert!(!s.is_paused());
}

// =========================================================================
// select! loop, the way a session actor drives it
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut s = TickScheduler::new(config_20hz());
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(4);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(160)).await;
        tx.send("terminate").await.ok();
    });

    let mut ticks_fired = 0u64;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "terminate");
                break;
            }
            info = s.wait_for_tick() => {
                ticks_fired += 1;
                assert_eq!(info.tick, ticks_fired);
            }
        }
    }

    assert!(ticks_fired >= 3, "expected at least 3 ticks, got {ticks_fired}");
}
