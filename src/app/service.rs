//! Node service — the hexagonal core.
//!
//! [`NodeService`] owns the configuration and the device registry.  It brings
//! the node up (identity → activation) and hands back a [`TelemetryLoop`]
//! that owns the session and the scheduler for the rest of the boot.  All I/O
//! flows through port traits injected at call sites.
//!
//! ```text
//!    RadioPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!    ClockPort ──▶ │  NodeService / TelemetryLoop  │
//! RandomSource ──▶ │  identity · join · schedule   │
//!     Producer ──▶ └──────────────────────────────┘
//! ```

use log::{info, warn};

use crate::activation::{activate, Session};
use crate::config::{NodeConfig, ProducerFaultPolicy};
use crate::error::Error;
use crate::identity;
use crate::payload::{Message, Payload};
use crate::registry::DeviceRegistry;
use crate::scheduler::{Interrupted, TransmissionScheduler};

use super::events::{AppEvent, RunSummary};
use super::ports::{ClockPort, EventSink, PayloadProducer, RadioPort, RandomSource};

// ───────────────────────────────────────────────────────────────
// NodeService
// ───────────────────────────────────────────────────────────────

/// Startup orchestration: who am I, join, then start the uplink loop.
pub struct NodeService {
    config: NodeConfig,
    registry: DeviceRegistry,
}

impl NodeService {
    /// `config` is expected to have passed [`NodeConfig::validate`].
    pub fn new(config: NodeConfig, registry: DeviceRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Resolve the radio's identity and activate it.
    ///
    /// Every failure here is fatal for the boot: an unprovisioned device,
    /// malformed credentials, or a bounded join that ran out of polls.
    pub fn bring_up<R: RadioPort>(
        &self,
        radio: R,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<TelemetryLoop<R>, Error> {
        let dev_eui = radio.dev_eui();
        let record = identity::resolve(&self.registry, dev_eui.as_bytes())?;
        sink.emit(&AppEvent::IdentityResolved {
            dev_eui,
            tag: record.tag.clone(),
            dev_addr: record.dev_addr,
            sequence_no: record.sequence_no,
        });

        let mode = self.config.activation_mode(record)?;
        let session = activate(
            &mode,
            radio,
            self.config.activation_settings(),
            clock,
            sink,
        )?;

        Ok(TelemetryLoop::new(session, &self.config))
    }

    /// Bring the node up and transmit until shutdown is requested.
    pub fn run<R: RadioPort>(
        &self,
        radio: R,
        producer: &mut impl PayloadProducer,
        clock: &mut impl ClockPort,
        rng: &mut impl RandomSource,
        sink: &mut impl EventSink,
    ) -> Result<RunSummary, Error> {
        let mut uplink = self.bring_up(radio, clock, sink)?;
        Ok(uplink.run(producer, clock, rng, sink))
    }
}

// ───────────────────────────────────────────────────────────────
// Uplink loop
// ───────────────────────────────────────────────────────────────

/// What one fired cycle produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Sent { sequence: u32, bytes: usize },
    SendFailed { sequence: u32 },
    /// No payload was available; no sequence number consumed.
    Skipped,
}

/// Owns the joined session and the schedule for the rest of the boot.
pub struct TelemetryLoop<R> {
    session: Session<R>,
    scheduler: TransmissionScheduler,
    producer_fault: ProducerFaultPolicy,
    last_payload: Option<Payload>,
    sequence: u32,
    cycle: u32,
    summary: RunSummary,
}

impl<R: RadioPort> TelemetryLoop<R> {
    pub fn new(session: Session<R>, config: &NodeConfig) -> Self {
        let scheduler = TransmissionScheduler::new(config.fixed_interval(), config.jitter_window());
        Self {
            session,
            scheduler,
            producer_fault: config.producer_fault,
            last_payload: None,
            sequence: config.initial_sequence,
            cycle: 0,
            summary: RunSummary {
                next_sequence: config.initial_sequence,
                ..RunSummary::default()
            },
        }
    }

    /// One cycle: wait for the fire time → produce → send.
    ///
    /// Send and producer faults are recovered here; only a shutdown request
    /// during the wait ends the cycle with `Err`.
    pub fn step(
        &mut self,
        producer: &mut impl PayloadProducer,
        clock: &mut impl ClockPort,
        rng: &mut impl RandomSource,
        sink: &mut impl EventSink,
    ) -> Result<CycleOutcome, Interrupted> {
        let fire = self.scheduler.wait_for_next(clock, rng)?;
        let cycle = self.cycle;
        self.cycle = self.cycle.wrapping_add(1);
        self.summary.cycles = self.summary.cycles.saturating_add(1);

        match fire.overrun {
            Some(late_by) => {
                self.summary.overruns = self.summary.overruns.saturating_add(1);
                sink.emit(&AppEvent::Overrun {
                    scheduled: fire.scheduled,
                    late_by,
                });
            }
            None => sink.emit(&AppEvent::Fired {
                scheduled: fire.scheduled,
                waited: fire.waited,
                jitter: fire.jitter,
            }),
        }

        let Some(payload) = self.next_payload(producer, cycle, sink) else {
            self.summary.skipped = self.summary.skipped.saturating_add(1);
            return Ok(CycleOutcome::Skipped);
        };

        let message = Message {
            sequence: self.sequence,
            payload,
        };
        self.sequence = self.sequence.wrapping_add(1);
        self.summary.next_sequence = self.sequence;

        match self.session.send(&message.payload) {
            Ok(bytes) => {
                let sent_at = clock.now();
                info!(
                    "Uplink #{}: {} bytes sent at {:.3}s (scheduled {:.3}s)",
                    message.sequence,
                    bytes,
                    sent_at.as_micros() as f64 / 1e6,
                    fire.scheduled.as_micros() as f64 / 1e6
                );
                self.summary.sent = self.summary.sent.saturating_add(1);
                sink.emit(&AppEvent::MessageSent {
                    sequence: message.sequence,
                    bytes,
                    scheduled: fire.scheduled,
                    sent_at,
                });
                Ok(CycleOutcome::Sent {
                    sequence: message.sequence,
                    bytes,
                })
            }
            Err(error) => {
                warn!("Uplink #{} failed: {}", message.sequence, error);
                self.summary.send_failures = self.summary.send_failures.saturating_add(1);
                sink.emit(&AppEvent::SendFailed {
                    sequence: message.sequence,
                    error,
                });
                Ok(CycleOutcome::SendFailed {
                    sequence: message.sequence,
                })
            }
        }
    }

    /// Run cycles until shutdown is requested.
    pub fn run(
        &mut self,
        producer: &mut impl PayloadProducer,
        clock: &mut impl ClockPort,
        rng: &mut impl RandomSource,
        sink: &mut impl EventSink,
    ) -> RunSummary {
        info!("Uplink loop started at sequence {}", self.sequence);
        while !clock.shutdown_requested() {
            if self.step(producer, clock, rng, sink).is_err() {
                break;
            }
        }
        info!(
            "Uplink loop stopped: {} cycles, {} sent, {} failed",
            self.summary.cycles, self.summary.sent, self.summary.send_failures
        );
        sink.emit(&AppEvent::Stopped(self.summary));
        self.summary
    }

    // ── Queries ───────────────────────────────────────────────

    /// Sequence number the next message will carry.
    pub fn next_sequence(&self) -> u32 {
        self.sequence
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn scheduler(&self) -> &TransmissionScheduler {
        &self.scheduler
    }

    pub fn session(&self) -> &Session<R> {
        &self.session
    }

    // ── Internal ──────────────────────────────────────────────

    /// Producer output for the message about to take `self.sequence`, or the
    /// fallback the fault policy allows.  `None` means skip the cycle.
    fn next_payload(
        &mut self,
        producer: &mut impl PayloadProducer,
        cycle: u32,
        sink: &mut impl EventSink,
    ) -> Option<Payload> {
        let error = match producer.produce(self.sequence) {
            Ok(payload) => {
                if self.producer_fault == ProducerFaultPolicy::ReuseLast {
                    self.last_payload = Some(payload.clone());
                }
                return Some(payload);
            }
            Err(e) => e,
        };

        self.summary.producer_faults = self.summary.producer_faults.saturating_add(1);
        let fallback = match self.producer_fault {
            ProducerFaultPolicy::ReuseLast => self.last_payload.clone(),
            ProducerFaultPolicy::SkipCycle => None,
        };
        warn!(
            "Producer failed on cycle {}: {} ({})",
            cycle,
            error,
            if fallback.is_some() { "resending last payload" } else { "skipping" }
        );
        sink.emit(&AppEvent::ProducerFault {
            cycle,
            error,
            reused: fallback.is_some(),
        });
        fallback
    }
}
