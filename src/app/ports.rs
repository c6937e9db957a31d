//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeService (domain)
//! ```
//!
//! Driven adapters (radio, clock, RNG, payload producer, event sinks,
//! storage) implement these traits.  The [`NodeService`](super::service::NodeService)
//! consumes them via generics, so the domain core never touches hardware
//! directly and every path can be driven by test doubles.

use core::time::Duration;

use crate::activation::ActivationMode;
use crate::config::{DataRate, NodeConfig};
use crate::credentials::Eui64;
use crate::error::{ProducerError, RadioError};
use crate::payload::Payload;
use crate::scheduler::Instant;

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: domain ↔ LoRaWAN stack)
// ───────────────────────────────────────────────────────────────

/// The LoRaWAN radio stack, seen through the handful of operations the
/// node needs.  Channel plans, ADR, MAC commands, duty-cycle accounting and
/// join retransmission all live behind this trait.
pub trait RadioPort {
    /// Begin activation.  May return before the join completes; callers poll
    /// [`has_joined`](Self::has_joined).  `timeout` of zero means "do not block".
    fn join(&mut self, mode: &ActivationMode, timeout: Duration) -> Result<(), RadioError>;

    /// Whether the stack reports an established session.
    fn has_joined(&self) -> bool;

    /// Pin the uplink data rate.
    fn set_data_rate(&mut self, rate: DataRate) -> Result<(), RadioError>;

    /// Select acknowledged (`true`) or unacknowledged uplinks.
    fn set_confirmed(&mut self, confirmed: bool) -> Result<(), RadioError>;

    /// Toggle blocking mode for subsequent socket operations.
    fn set_blocking(&mut self, blocking: bool);

    /// Transmit one uplink.  Returns the number of bytes accepted.
    fn send(&mut self, payload: &[u8]) -> Result<usize, RadioError>;

    /// Factory-burned device EUI, used as the registry key.
    fn dev_eui(&self) -> Eui64;
}

// ───────────────────────────────────────────────────────────────
// Payload producer (driven adapter: sensors → domain)
// ───────────────────────────────────────────────────────────────

/// Supplies the uplink payload for each fired cycle.
pub trait PayloadProducer {
    /// Build the payload for the message that will carry `sequence`.
    ///
    /// A skipped cycle consumes no sequence number, so the next call asks
    /// for the same one again.
    fn produce(&mut self, sequence: u32) -> Result<Payload, ProducerError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Outcome of a [`ClockPort::sleep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sleep {
    /// The full duration elapsed.
    Completed,
    /// A shutdown request cut the sleep short.
    Interrupted,
}

/// Monotonic time source and suspension primitive.
pub trait ClockPort {
    /// Monotonic now.  Never goes backwards, never wraps at midnight.
    fn now(&self) -> Instant;

    /// Suspend for `duration`, returning early if shutdown is requested.
    fn sleep(&mut self, duration: Duration) -> Sleep;

    /// Whether a shutdown has been requested.  Always-on deployments never
    /// request one.
    fn shutdown_requested(&self) -> bool {
        false
    }
}

// ───────────────────────────────────────────────────────────────
// Random source
// ───────────────────────────────────────────────────────────────

/// Uniform randomness for transmit jitter.
///
/// Production implementations MUST be hardware or cryptographic.  A seeded
/// generator would give every node of a fleet the same jitter sequence and
/// put their uplinks on the air at the same instants.
pub trait RandomSource {
    /// A value uniformly distributed over `[0, 1)`.
    fn uniform01(&mut self) -> f64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists node configuration.
///
/// Implementations MUST validate before persisting; invalid values are
/// rejected with [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`NodeConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<NodeConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &NodeConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::NotFound => Self::Config("config not found"),
            ConfigError::Corrupted => Self::Config("config corrupted"),
            ConfigError::IoError => Self::Config("config storage I/O error"),
        }
    }
}
