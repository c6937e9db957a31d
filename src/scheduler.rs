//! Anchor-based uplink scheduler.
//!
//! One uplink per cycle, fired at `fixed_interval + U(0, jitter_window)`
//! after the previous *scheduled* fire time:
//!
//! ```text
//!   t0        fire 1              fire 2              fire 3
//!   │◀── T + j1 ──▶│◀──── T + j2 ────▶│◀─── T + j3 ───▶│
//!   │              │ work ▓▓▓         │ work ▓▓▓▓▓▓▓    │
//!   │              │      sleep ░░░░░░│         sleep ░░│
//! ```
//!
//! The next fire is anchored on the previous scheduled time, never on "now",
//! so sensor reads and radio latency never accumulate into drift.  When the
//! work of a cycle overruns the period the next fire happens immediately and
//! the overrun is counted; the anchor is left untouched.

use core::ops::Add;
use core::time::Duration;

use log::{debug, info, warn};

use crate::app::ports::{ClockPort, RandomSource, Sleep};

// ═══════════════════════════════════════════════════════════════
//  Monotonic instant
// ═══════════════════════════════════════════════════════════════

/// Microseconds since boot on the monotonic timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Instant(u64);

impl Instant {
    pub const fn from_micros(us: u64) -> Self {
        Self(us)
    }

    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// `self - earlier`, or `None` if `earlier` is later than `self`.
    pub fn checked_duration_since(self, earlier: Instant) -> Option<Duration> {
        self.0.checked_sub(earlier.0).map(Duration::from_micros)
    }

    /// `self - earlier`, clamped at zero.
    pub fn saturating_duration_since(self, earlier: Instant) -> Duration {
        self.checked_duration_since(earlier).unwrap_or_default()
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        Instant(self.0.saturating_add(rhs.as_micros() as u64))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Schedule state
// ═══════════════════════════════════════════════════════════════

/// Anchor pair for the current cycle.  `next_fire > last_fire` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleState {
    /// Previous scheduled fire time (the boot anchor on the first cycle).
    pub last_fire: Instant,
    /// Scheduled fire time of the current cycle.
    pub next_fire: Instant,
}

/// A fired cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fire {
    /// Scheduled fire time (not the wall time the loop resumed).
    pub scheduled: Instant,
    /// Random part of this cycle's period.
    pub jitter: Duration,
    /// How long the scheduler slept; zero on overrun.
    pub waited: Duration,
    /// `Some(late_by)` when the previous cycle's work ran past this fire time.
    pub overrun: Option<Duration>,
}

/// Shutdown was requested while waiting for the next fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// The uplink scheduler.  Owned by the uplink loop; single-threaded.
#[derive(Debug, Clone)]
pub struct TransmissionScheduler {
    interval: Duration,
    jitter_window: Duration,
    state: Option<ScheduleState>,
    fired: u64,
    overruns: u64,
}

impl TransmissionScheduler {
    /// `interval` must be non-zero for fire times to strictly increase;
    /// [`NodeConfig::validate`](crate::config::NodeConfig::validate) enforces it.
    pub fn new(interval: Duration, jitter_window: Duration) -> Self {
        debug_assert!(!interval.is_zero(), "zero uplink interval");
        info!(
            "Scheduler: period {:.1}s + U(0, {:.1}s)",
            interval.as_secs_f32(),
            jitter_window.as_secs_f32()
        );
        Self {
            interval,
            jitter_window,
            state: None,
            fired: 0,
            overruns: 0,
        }
    }

    /// Draw one jitter value in `[0, jitter_window)`, whole microseconds.
    pub fn jitter(&self, rng: &mut impl RandomSource) -> Duration {
        let window_us = self.jitter_window.as_micros() as u64;
        if window_us == 0 {
            return Duration::ZERO;
        }
        let u = rng.uniform01();
        let u = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.0 };
        let us = ((u * window_us as f64) as u64).min(window_us - 1);
        Duration::from_micros(us)
    }

    /// Compute the next fire time and advance the anchor.
    ///
    /// The first call anchors on `now`; every later call anchors on the
    /// previous scheduled fire time and ignores `now`.
    pub fn plan(&mut self, now: Instant, rng: &mut impl RandomSource) -> (ScheduleState, Duration) {
        let jitter = self.jitter(rng);
        let last_fire = match self.state {
            Some(prev) => prev.next_fire,
            None => now,
        };
        let state = ScheduleState {
            last_fire,
            next_fire: last_fire + self.interval + jitter,
        };
        self.state = Some(state);
        (state, jitter)
    }

    /// Plan the next fire and sleep until it.
    ///
    /// Never sleeps a negative duration: if the fire time has already passed
    /// the cycle fires immediately and the overrun is reported.
    pub fn wait_for_next(
        &mut self,
        clock: &mut impl ClockPort,
        rng: &mut impl RandomSource,
    ) -> Result<Fire, Interrupted> {
        let (state, jitter) = self.plan(clock.now(), rng);
        let now = clock.now();
        debug!(
            "Scheduler: now={}us next_fire={}us jitter={}us",
            now.as_micros(),
            state.next_fire.as_micros(),
            jitter.as_micros()
        );

        let fire = match state.next_fire.checked_duration_since(now) {
            Some(wait) if !wait.is_zero() => {
                info!("Scheduler: waiting {:.3}s for next transmission", wait.as_secs_f32());
                if clock.sleep(wait) == Sleep::Interrupted {
                    info!("Scheduler: wait interrupted by shutdown");
                    return Err(Interrupted);
                }
                Fire {
                    scheduled: state.next_fire,
                    jitter,
                    waited: wait,
                    overrun: None,
                }
            }
            _ => {
                let late_by = now.saturating_duration_since(state.next_fire);
                self.overruns += 1;
                warn!(
                    "Scheduler: cycle overran by {:.3}s, transmitting immediately",
                    late_by.as_secs_f32()
                );
                Fire {
                    scheduled: state.next_fire,
                    jitter,
                    waited: Duration::ZERO,
                    overrun: Some(late_by),
                }
            }
        };
        self.fired += 1;
        Ok(fire)
    }

    /// Anchor pair of the most recent cycle, `None` before the first plan.
    pub fn state(&self) -> Option<ScheduleState> {
        self.state
    }

    /// Cycles fired since boot.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Cycles that fired late because the previous cycle overran.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
