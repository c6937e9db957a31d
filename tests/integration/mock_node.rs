//! Mock adapters for integration tests.
//!
//! Records every radio call and every emitted event so tests can assert on
//! the full history, and drives time by hand so schedules are exact.

use core::cell::Cell;
use core::time::Duration;

use loranode::activation::ActivationMode;
use loranode::app::events::AppEvent;
use loranode::app::ports::{ClockPort, EventSink, PayloadProducer, RadioPort, RandomSource, Sleep};
use loranode::config::DataRate;
use loranode::credentials::Eui64;
use loranode::error::{ProducerError, RadioError};
use loranode::payload::Payload;
use loranode::scheduler::Instant;

/// DevEUI of the first fleet entry (`PYCOM01`).
pub const PYCOM01: Eui64 = Eui64([0x70, 0xB3, 0xD5, 0x49, 0x94, 0xDE, 0x96, 0x8F]);

// ── Radio call record ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum RadioCall {
    Join(ActivationMode),
    SetDataRate(DataRate),
    SetConfirmed(bool),
    SetBlocking(bool),
    Send(Vec<u8>),
}

// ── MockRadio ─────────────────────────────────────────────────

#[derive(Debug)]
pub struct MockRadio {
    pub calls: Vec<RadioCall>,
    dev_eui: Eui64,
    /// `has_joined` returns true from this poll on; `None` never joins.
    join_after: Option<u32>,
    polls: Cell<u32>,
    /// 0-based send attempts that fail with `RadioError::Io`.
    fail_sends: Vec<usize>,
    send_attempts: usize,
}

#[allow(dead_code)]
impl MockRadio {
    pub fn new(dev_eui: Eui64) -> Self {
        Self {
            calls: Vec::new(),
            dev_eui,
            join_after: Some(0),
            polls: Cell::new(0),
            fail_sends: Vec::new(),
            send_attempts: 0,
        }
    }

    pub fn joining_after(mut self, polls: u32) -> Self {
        self.join_after = Some(polls);
        self
    }

    pub fn never_joining(mut self) -> Self {
        self.join_after = None;
        self
    }

    pub fn failing_sends(mut self, attempts: &[usize]) -> Self {
        self.fail_sends = attempts.to_vec();
        self
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RadioCall::Send(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }
}

impl RadioPort for MockRadio {
    fn join(&mut self, mode: &ActivationMode, _timeout: Duration) -> Result<(), RadioError> {
        self.calls.push(RadioCall::Join(*mode));
        Ok(())
    }

    fn has_joined(&self) -> bool {
        let n = self.polls.get();
        self.polls.set(n + 1);
        self.join_after.is_some_and(|after| n >= after)
    }

    fn set_data_rate(&mut self, rate: DataRate) -> Result<(), RadioError> {
        self.calls.push(RadioCall::SetDataRate(rate));
        Ok(())
    }

    fn set_confirmed(&mut self, confirmed: bool) -> Result<(), RadioError> {
        self.calls.push(RadioCall::SetConfirmed(confirmed));
        Ok(())
    }

    fn set_blocking(&mut self, blocking: bool) {
        self.calls.push(RadioCall::SetBlocking(blocking));
    }

    fn send(&mut self, payload: &[u8]) -> Result<usize, RadioError> {
        let attempt = self.send_attempts;
        self.send_attempts += 1;
        if self.fail_sends.contains(&attempt) {
            return Err(RadioError::Io);
        }
        self.calls.push(RadioCall::Send(payload.to_vec()));
        Ok(payload.len())
    }

    fn dev_eui(&self) -> Eui64 {
        self.dev_eui
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// Time moves only when slept on or advanced by the test.
pub struct ManualClock {
    now_us: u64,
    pub sleeps: Vec<Duration>,
    /// Requests shutdown once this many sleeps have completed.
    shutdown_after: Option<usize>,
    shutdown: bool,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            now_us: 0,
            sleeps: Vec::new(),
            shutdown_after: None,
            shutdown: false,
        }
    }

    pub fn stopping_after(mut self, sleeps: usize) -> Self {
        self.shutdown_after = Some(sleeps);
        self
    }

    /// Simulate work that takes `d`.
    pub fn advance(&mut self, d: Duration) {
        self.now_us += d.as_micros() as u64;
    }

    pub fn secs(&self) -> f64 {
        self.now_us as f64 / 1e6
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for ManualClock {
    fn now(&self) -> Instant {
        Instant::from_micros(self.now_us)
    }

    fn sleep(&mut self, duration: Duration) -> Sleep {
        if self.shutdown_after.is_some_and(|n| self.sleeps.len() >= n) {
            self.shutdown = true;
            return Sleep::Interrupted;
        }
        self.sleeps.push(duration);
        self.advance(duration);
        Sleep::Completed
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
    }
}

// ── Random sources ────────────────────────────────────────────

pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn uniform01(&mut self) -> f64 {
        self.0
    }
}

/// Cycles through a fixed list of draws.
pub struct ScriptedRandom {
    draws: Vec<f64>,
    next: usize,
}

#[allow(dead_code)]
impl ScriptedRandom {
    pub fn new(draws: &[f64]) -> Self {
        Self {
            draws: draws.to_vec(),
            next: 0,
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform01(&mut self) -> f64 {
        let u = self.draws[self.next % self.draws.len()];
        self.next += 1;
        u
    }
}

// ── Payload producer ──────────────────────────────────────────

/// Produces `seq-<sequence>`, failing on the listed calls (0-based).
pub struct FlakyProducer {
    fail_calls: Vec<usize>,
    calls: usize,
}

#[allow(dead_code)]
impl FlakyProducer {
    pub fn reliable() -> Self {
        Self::failing_on(&[])
    }

    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            fail_calls: calls.to_vec(),
            calls: 0,
        }
    }
}

impl PayloadProducer for FlakyProducer {
    fn produce(&mut self, sequence: u32) -> Result<Payload, ProducerError> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_calls.contains(&call) {
            return Err(ProducerError::SensorUnavailable);
        }
        let text = format!("seq-{sequence}");
        Payload::from_slice(text.as_bytes()).map_err(|_| ProducerError::PayloadOverflow)
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(sequence, scheduled)` of every `MessageSent`, in order.
    pub fn sent(&self) -> Vec<(u32, Instant)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::MessageSent {
                    sequence,
                    scheduled,
                    ..
                } => Some((*sequence, *scheduled)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|&e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
