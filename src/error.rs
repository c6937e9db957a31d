//! Unified error types for the LoRaNode firmware.
//!
//! Every subsystem has its own small error enum; all of them convert into the
//! top-level [`Error`] so the startup path can propagate with `?` and the
//! entry point can hand the result to `anyhow`.  All variants are `Copy` so
//! they can be passed through events and logs without allocation.
//!
//! Startup faults (identity, credential decoding, configuration) are fatal.
//! Steady-state faults (a failed send) are recovered by skipping the cycle.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The device identity could not be resolved to a provisioning record.
    Identity(IdentityError),
    /// The network join did not complete.
    Activation(ActivationError),
    /// An uplink could not be transmitted.
    Transmission(TransmissionError),
    /// A hex-encoded credential or identifier is malformed.
    Decode(DecodeError),
    /// The fleet table could not be loaded.
    Registry(RegistryError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity(e) => write!(f, "identity: {e}"),
            Self::Activation(e) => write!(f, "activation: {e}"),
            Self::Transmission(e) => write!(f, "transmission: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Credential decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The hex string does not encode exactly the expected number of bytes.
    InvalidLength { expected: usize, found: usize },
    /// A character at `index` is not a hexadecimal digit.
    InvalidDigit { index: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { expected, found } => {
                write!(f, "expected {expected} hex digits, found {found}")
            }
            Self::InvalidDigit { index } => write!(f, "invalid hex digit at index {index}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Device registry
// ---------------------------------------------------------------------------

/// Errors raised while loading the fleet table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// A hex field failed to decode.
    Decode(DecodeError),
    /// Two entries share the same unique id.
    DuplicateId,
    /// The table has more rows than the registry capacity.
    Full,
    /// A tag exceeds the fixed tag capacity.
    TagTooLong,
    /// Sequence numbers start at 1.
    ZeroSequence,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "malformed entry: {e}"),
            Self::DuplicateId => write!(f, "duplicate unique id"),
            Self::Full => write!(f, "registry full"),
            Self::TagTooLong => write!(f, "device tag too long"),
            Self::ZeroSequence => write!(f, "sequence number must be positive"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<DecodeError> for RegistryError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<RegistryError> for Error {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ---------------------------------------------------------------------------
// Identity resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    /// The hardware identifier is not present in the device registry.
    NotProvisioned,
    /// The hardware identifier has the wrong number of bytes to be a key.
    InvalidLength(usize),
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotProvisioned => write!(f, "device not provisioned in registry"),
            Self::InvalidLength(n) => write!(f, "hardware id is {n} bytes, expected 8"),
        }
    }
}

impl std::error::Error for IdentityError {}

impl From<IdentityError> for Error {
    fn from(e: IdentityError) -> Self {
        Self::Identity(e)
    }
}

// ---------------------------------------------------------------------------
// Radio capability
// ---------------------------------------------------------------------------

/// Faults reported by a [`RadioPort`](crate::app::ports::RadioPort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The radio refused to start the join procedure.
    JoinRejected,
    /// An operation that requires a joined session was attempted too early.
    NotJoined,
    /// Payload exceeds the maximum for the current data rate.
    PayloadTooLarge,
    /// Regional duty-cycle budget exhausted; the radio declined to transmit.
    DutyCycleLimited,
    /// A socket option (data rate, confirmation) was not accepted.
    InvalidOption,
    /// Generic transceiver / driver failure.
    Io,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JoinRejected => write!(f, "join rejected"),
            Self::NotJoined => write!(f, "not joined"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
            Self::DutyCycleLimited => write!(f, "duty cycle limited"),
            Self::InvalidOption => write!(f, "invalid radio option"),
            Self::Io => write!(f, "radio I/O error"),
        }
    }
}

impl std::error::Error for RadioError {}

// ---------------------------------------------------------------------------
// Activation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationError {
    /// A bounded join policy ran out of polls before the radio joined.
    JoinTimeout { polls: u32 },
    /// Shutdown was requested while waiting for the join.
    Interrupted,
    /// The radio rejected the join request or a post-join setting.
    Radio(RadioError),
}

impl fmt::Display for ActivationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JoinTimeout { polls } => write!(f, "not joined after {polls} polls"),
            Self::Interrupted => write!(f, "interrupted while joining"),
            Self::Radio(e) => write!(f, "radio: {e}"),
        }
    }
}

impl std::error::Error for ActivationError {}

impl From<RadioError> for ActivationError {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

impl From<ActivationError> for Error {
    fn from(e: ActivationError) -> Self {
        Self::Activation(e)
    }
}

// ---------------------------------------------------------------------------
// Transmission
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmissionError {
    /// The radio failed to transmit the uplink.
    SendFailed(RadioError),
}

impl fmt::Display for TransmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed(e) => write!(f, "send failed: {e}"),
        }
    }
}

impl std::error::Error for TransmissionError {}

impl From<TransmissionError> for Error {
    fn from(e: TransmissionError) -> Self {
        Self::Transmission(e)
    }
}

// ---------------------------------------------------------------------------
// Payload production
// ---------------------------------------------------------------------------

/// Faults reported by a [`PayloadProducer`](crate::app::ports::PayloadProducer).
/// Never fatal: the uplink loop skips the cycle or reuses the last payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerError {
    /// A sensor could not be read.
    SensorUnavailable,
    /// The readings did not fit in an uplink payload.
    PayloadOverflow,
}

impl fmt::Display for ProducerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorUnavailable => write!(f, "sensor unavailable"),
            Self::PayloadOverflow => write!(f, "payload overflow"),
        }
    }
}

impl std::error::Error for ProducerError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
