//! ESP32 time adapter.
//!
//! Implements [`ClockPort`] for the uplink loop.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`** — uses `std::time::Instant` for
//!   host-side simulation.
//!
//! Sleeps are taken in short slices so a [`ShutdownSignal`] raised from
//! another thread stops a join wait or a scheduler wait promptly.

use core::time::Duration;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;

use crate::app::ports::{ClockPort, Sleep};
use crate::scheduler::Instant;

/// Longest uninterrupted slice of a [`MonotonicClock::sleep`].
const SLEEP_SLICE: Duration = Duration::from_millis(100);

// ───────────────────────────────────────────────────────────────
// Shutdown signal
// ───────────────────────────────────────────────────────────────

/// Cloneable stop flag shared between the uplink loop and whoever may stop it.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        if !self.0.swap(true, Ordering::SeqCst) {
            info!("Shutdown requested");
        }
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ───────────────────────────────────────────────────────────────
// Monotonic clock
// ───────────────────────────────────────────────────────────────

/// Clock adapter for the ESP32 platform.
///
/// [`MonotonicClock::default`] holds a signal nobody else can raise, which is
/// what the firmware uses; hosts that need to stop the loop pass their own
/// [`ShutdownSignal`] to [`MonotonicClock::new`].
pub struct MonotonicClock {
    shutdown: ShutdownSignal,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new(ShutdownSignal::new())
    }
}

impl MonotonicClock {
    pub fn new(shutdown: ShutdownSignal) -> Self {
        Self {
            shutdown,
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since the adapter was created (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl ClockPort for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.uptime_us())
    }

    fn sleep(&mut self, duration: Duration) -> Sleep {
        let deadline = self.now() + duration;
        loop {
            if self.shutdown.is_requested() {
                return Sleep::Interrupted;
            }
            let Some(left) = deadline.checked_duration_since(self.now()) else {
                return Sleep::Completed;
            };
            if left.is_zero() {
                return Sleep::Completed;
            }
            std::thread::sleep(left.min(SLEEP_SLICE));
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.is_requested()
    }
}
