//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

fn secs(us: u64) -> f64 {
    us as f64 / 1e6
}

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::IdentityResolved {
                dev_eui,
                tag,
                dev_addr,
                sequence_no,
            } => {
                info!(
                    "IDENT | DevEUI={} | tag={} | DevAddr={} | seq={}",
                    dev_eui, tag, dev_addr, sequence_no
                );
            }
            AppEvent::JoinStarted { mode } => {
                info!("JOIN  | {} started", mode);
            }
            AppEvent::JoinPending { polls } => {
                info!("JOIN  | not yet joined... ({})", polls);
            }
            AppEvent::Joined {
                polls,
                data_rate,
                confirmed,
            } => {
                info!(
                    "JOIN  | joined after {} polls | DR{} | {}",
                    polls,
                    data_rate.index(),
                    if *confirmed { "confirmed" } else { "unconfirmed" }
                );
            }
            AppEvent::JoinFailed(e) => {
                warn!("JOIN  | failed: {}", e);
            }
            AppEvent::Fired {
                scheduled,
                waited,
                jitter,
            } => {
                info!(
                    "SCHED | fire at {:.3}s | waited {:.3}s | jitter {:.3}s",
                    secs(scheduled.as_micros()),
                    waited.as_secs_f64(),
                    jitter.as_secs_f64()
                );
            }
            AppEvent::Overrun { scheduled, late_by } => {
                warn!(
                    "SCHED | overrun: fire at {:.3}s is {:.3}s late",
                    secs(scheduled.as_micros()),
                    late_by.as_secs_f64()
                );
            }
            AppEvent::MessageSent {
                sequence,
                bytes,
                scheduled,
                sent_at,
            } => {
                info!(
                    "TX    | #{} | {} bytes | sent {:.3}s | scheduled {:.3}s",
                    sequence,
                    bytes,
                    secs(sent_at.as_micros()),
                    secs(scheduled.as_micros())
                );
            }
            AppEvent::SendFailed { sequence, error } => {
                warn!("TX    | #{} | {}", sequence, error);
            }
            AppEvent::ProducerFault {
                cycle,
                error,
                reused,
            } => {
                warn!(
                    "DATA  | cycle {} | {} | {}",
                    cycle,
                    error,
                    if *reused { "reusing last payload" } else { "cycle skipped" }
                );
            }
            AppEvent::Stopped(s) => {
                info!(
                    "STOP  | cycles={} sent={} failed={} skipped={} overruns={} next_seq={}",
                    s.cycles, s.sent, s.send_failures, s.skipped, s.overruns, s.next_sequence
                );
            }
        }
    }
}
