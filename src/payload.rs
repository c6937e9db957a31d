//! Uplink payloads and the built-in test-pattern producer.

use core::fmt::Write;

use crate::app::ports::PayloadProducer;
use crate::error::ProducerError;

/// Largest LoRaWAN application payload (EU868, DR7 upper bound).
pub const MAX_PAYLOAD: usize = 242;

/// Fixed-capacity uplink payload.
pub type Payload = heapless::Vec<u8, MAX_PAYLOAD>;

/// One uplink: the sequence number assigned by the loop plus the bytes sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sequence: u32,
    pub payload: Payload,
}

/// Width the test pattern is padded to with dots.
const PATTERN_WIDTH: usize = 18;
const PATTERN_PREFIX: &str = "Testing data";

/// Produces `Testing data.....0`, `Testing data....42`, … : the counter is
/// right-aligned with dots to a fixed 18 characters, keeping at least one dot
/// once the counter outgrows the width.
#[derive(Debug, Default)]
pub struct TestPatternProducer;

impl TestPatternProducer {
    pub fn new() -> Self {
        Self
    }
}

impl PayloadProducer for TestPatternProducer {
    fn produce(&mut self, sequence: u32) -> Result<Payload, ProducerError> {
        let mut digits = heapless::String::<10>::new();
        write!(digits, "{sequence}").map_err(|_| ProducerError::PayloadOverflow)?;
        let dots = PATTERN_WIDTH
            .saturating_sub(PATTERN_PREFIX.len() + digits.len())
            .max(1);

        let mut payload = Payload::new();
        payload
            .extend_from_slice(PATTERN_PREFIX.as_bytes())
            .map_err(|_| ProducerError::PayloadOverflow)?;
        for _ in 0..dots {
            payload.push(b'.').map_err(|_| ProducerError::PayloadOverflow)?;
        }
        payload
            .extend_from_slice(digits.as_bytes())
            .map_err(|_| ProducerError::PayloadOverflow)?;
        Ok(payload)
    }
}
