//! Network activation state machine.
//!
//! ```text
//!            join()             has_joined()
//!   Idle ───────────▶ Joining{polls} ─────────▶ Joined ──▶ Session<R>
//!                         │    ▲
//!                         │    │ sleep(poll_interval)
//!                         └────┘
//!                         │
//!                         └── Bounded{max_polls} exhausted ──▶ Failed
//! ```
//!
//! The radio does its own join retransmission and backoff; this module only
//! starts the procedure and waits for the stack to report a session.  A
//! [`Session`] can only be obtained from a successful activation, so nothing
//! can transmit before the node has joined.

use core::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::events::AppEvent;
use crate::app::ports::{ClockPort, EventSink, RadioPort, Sleep};
use crate::config::DataRate;
use crate::credentials::{AesKey, DevAddr, Eui64};
use crate::error::{ActivationError, TransmissionError};

// ---------------------------------------------------------------------------
// Activation inputs
// ---------------------------------------------------------------------------

/// Credentials for one activation.  Exactly one per boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationMode {
    /// OTAA: session keys are negotiated with the join server.
    Negotiated { app_eui: Eui64, app_key: AesKey },
    /// ABP: session address and keys are provisioned ahead of time.
    PreShared {
        dev_addr: DevAddr,
        nwk_skey: AesKey,
        app_skey: AesKey,
    },
}

impl ActivationMode {
    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Negotiated { .. } => "OTAA",
            Self::PreShared { .. } => "ABP",
        }
    }
}

/// How long the node is willing to wait for the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinPolicy {
    /// Keep polling until the radio joins.  Unattended deployments use this.
    RetryForever,
    /// Give up with [`ActivationError::JoinTimeout`] after `max_polls` sleeps.
    Bounded { max_polls: u32 },
}

/// Everything the state machine needs besides the credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationSettings {
    pub poll_interval: Duration,
    pub policy: JoinPolicy,
    pub data_rate: DataRate,
    pub confirmed: bool,
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Idle,
    Joining { polls: u32 },
    Joined { polls: u32 },
    /// Terminal; only reachable under [`JoinPolicy::Bounded`] or shutdown.
    Failed,
}

/// Drives one activation from `Idle` to `Joined` (or `Failed`).
#[derive(Debug)]
pub struct Activation {
    settings: ActivationSettings,
    state: ActivationState,
}

impl Activation {
    pub fn new(settings: ActivationSettings) -> Self {
        Self {
            settings,
            state: ActivationState::Idle,
        }
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    /// Run the join to completion and configure the session.
    ///
    /// The radio is consumed: on success it lives on inside the returned
    /// [`Session`], on failure it is dropped with the attempt.
    pub fn run<R: RadioPort>(
        &mut self,
        mode: &ActivationMode,
        mut radio: R,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<Session<R>, ActivationError> {
        let polls = match self.join(mode, &mut radio, clock, sink) {
            Ok(polls) => polls,
            Err(e) => {
                warn!("Activation: {} join failed: {}", mode.label(), e);
                self.state = ActivationState::Failed;
                sink.emit(&AppEvent::JoinFailed(e));
                return Err(e);
            }
        };

        let ActivationSettings {
            data_rate,
            confirmed,
            ..
        } = self.settings;
        let configured = radio
            .set_data_rate(data_rate)
            .and_then(|()| radio.set_confirmed(confirmed));
        if let Err(e) = configured {
            self.state = ActivationState::Failed;
            let e = ActivationError::Radio(e);
            sink.emit(&AppEvent::JoinFailed(e));
            return Err(e);
        }
        radio.set_blocking(false);
        self.state = ActivationState::Joined { polls };

        info!(
            "Activation: joined via {} after {} polls (DR{}, {})",
            mode.label(),
            polls,
            data_rate.index(),
            if confirmed { "confirmed" } else { "unconfirmed" }
        );
        sink.emit(&AppEvent::Joined {
            polls,
            data_rate,
            confirmed,
        });

        Ok(Session::new(radio, data_rate, confirmed))
    }

    /// `Idle → Joining{..}` until the radio reports joined.  Returns the
    /// number of polls it took.
    fn join<R: RadioPort>(
        &mut self,
        mode: &ActivationMode,
        radio: &mut R,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<u32, ActivationError> {
        radio.join(mode, Duration::ZERO)?;
        info!("Activation: {} join started", mode.label());
        sink.emit(&AppEvent::JoinStarted { mode: mode.label() });

        let mut polls = 0u32;
        self.state = ActivationState::Joining { polls };
        loop {
            if radio.has_joined() {
                return Ok(polls);
            }
            if let JoinPolicy::Bounded { max_polls } = self.settings.policy {
                if polls >= max_polls {
                    return Err(ActivationError::JoinTimeout { polls });
                }
            }
            if clock.sleep(self.settings.poll_interval) == Sleep::Interrupted {
                return Err(ActivationError::Interrupted);
            }
            polls = polls.saturating_add(1);
            self.state = ActivationState::Joining { polls };
            info!("Activation: not yet joined ({polls})");
            sink.emit(&AppEvent::JoinPending { polls });
        }
    }
}

/// Join the network with `mode` and hand back a configured session.
pub fn activate<R: RadioPort>(
    mode: &ActivationMode,
    radio: R,
    settings: ActivationSettings,
    clock: &mut impl ClockPort,
    sink: &mut impl EventSink,
) -> Result<Session<R>, ActivationError> {
    Activation::new(settings).run(mode, radio, clock, sink)
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An activated radio.  Only [`activate`] constructs one.
#[derive(Debug)]
pub struct Session<R> {
    radio: R,
    data_rate: DataRate,
    confirmed: bool,
}

impl<R: RadioPort> Session<R> {
    pub(crate) fn new(radio: R, data_rate: DataRate, confirmed: bool) -> Self {
        Self {
            radio,
            data_rate,
            confirmed,
        }
    }

    /// Transmit one uplink in blocking mode, then return the radio to
    /// non-blocking.
    pub fn send(&mut self, payload: &[u8]) -> Result<usize, TransmissionError> {
        self.radio.set_blocking(true);
        let sent = self.radio.send(payload);
        self.radio.set_blocking(false);
        sent.map_err(TransmissionError::SendFailed)
    }

    pub fn data_rate(&self) -> DataRate {
        self.data_rate
    }

    pub fn confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn into_radio(self) -> R {
        self.radio
    }
}
