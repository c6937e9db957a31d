//! Outbound application events.
//!
//! The [`NodeService`](super::service::NodeService) and the activation state
//! machine emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them: log to
//! serial, count them in a test, forward them upstream.

use core::time::Duration;

use crate::config::DataRate;
use crate::credentials::{DevAddr, Eui64};
use crate::error::{ActivationError, ProducerError, TransmissionError};
use crate::registry::DeviceTag;
use crate::scheduler::Instant;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The radio's DevEUI matched a provisioning record.
    IdentityResolved {
        dev_eui: Eui64,
        tag: DeviceTag,
        dev_addr: DevAddr,
        sequence_no: u16,
    },

    /// The join procedure was handed to the radio (`"OTAA"` / `"ABP"`).
    JoinStarted { mode: &'static str },

    /// Still waiting for the network after `polls` poll intervals.
    JoinPending { polls: u32 },

    /// The radio reported a session and the uplink options were applied.
    Joined {
        polls: u32,
        data_rate: DataRate,
        confirmed: bool,
    },

    /// Activation ended without a session.
    JoinFailed(ActivationError),

    /// A cycle fired on schedule after sleeping `waited`.
    Fired {
        scheduled: Instant,
        waited: Duration,
        jitter: Duration,
    },

    /// The previous cycle's work ran past this cycle's fire time.
    Overrun { scheduled: Instant, late_by: Duration },

    /// An uplink left the radio.
    MessageSent {
        sequence: u32,
        bytes: usize,
        scheduled: Instant,
        sent_at: Instant,
    },

    /// The radio refused or failed an uplink; the schedule continues.
    SendFailed {
        sequence: u32,
        error: TransmissionError,
    },

    /// The payload producer failed.  `reused` is true when the last good
    /// payload was sent instead.
    ProducerFault {
        cycle: u32,
        error: ProducerError,
        reused: bool,
    },

    /// The uplink loop stopped on a shutdown request.
    Stopped(RunSummary),
}

/// Counters for one run of the uplink loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles fired (including skipped ones).
    pub cycles: u32,
    /// Uplinks the radio accepted.
    pub sent: u32,
    pub send_failures: u32,
    pub producer_faults: u32,
    pub skipped: u32,
    pub overruns: u32,
    /// Sequence number the next message would carry.
    pub next_sequence: u32,
}
