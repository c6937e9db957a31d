//! LoRaWAN credential types and their hex representation.
//!
//! Credentials arrive as hex strings (config, registry table) and are decoded
//! exactly once, at load time, into fixed-size typed values.  Nothing past the
//! configuration layer handles credential strings.

use core::fmt;

use crate::error::DecodeError;

/// Uppercase hex string wide enough for a 64-bit identifier.
pub type HexId = heapless::String<16>;

// ───────────────────────────────────────────────────────────────
// Hex codec
// ───────────────────────────────────────────────────────────────

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode exactly `N` bytes from a hex string (either case, no separators).
pub fn decode_hex<const N: usize>(s: &str) -> Result<[u8; N], DecodeError> {
    let digits = s.as_bytes();
    if digits.len() != N * 2 {
        return Err(DecodeError::InvalidLength {
            expected: N * 2,
            found: digits.len(),
        });
    }

    let mut out = [0u8; N];
    for (i, pair) in digits.chunks_exact(2).enumerate() {
        let hi = nibble(pair[0]).ok_or(DecodeError::InvalidDigit { index: i * 2 })?;
        let lo = nibble(pair[1]).ok_or(DecodeError::InvalidDigit { index: i * 2 + 1 })?;
        out[i] = (hi << 4) | lo;
    }
    Ok(out)
}

/// Encode bytes as uppercase hex into a fixed-capacity string.
///
/// Returns `None` if the encoding does not fit in `CAP` characters.
pub fn encode_upper<const CAP: usize>(bytes: &[u8]) -> Option<heapless::String<CAP>> {
    use core::fmt::Write;
    let mut s = heapless::String::new();
    for b in bytes {
        write!(s, "{b:02X}").ok()?;
    }
    Some(s)
}

// ───────────────────────────────────────────────────────────────
// Typed credentials
// ───────────────────────────────────────────────────────────────

/// 64-bit extended unique identifier (DevEUI / AppEUI / JoinEUI).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Eui64(pub [u8; 8]);

impl Eui64 {
    pub fn from_hex(s: &str) -> Result<Self, DecodeError> {
        decode_hex(s).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Uppercase hex form, as used for registry keys and logs.
    pub fn to_hex(&self) -> HexId {
        // 8 bytes always fit in 16 characters.
        encode_upper(&self.0).unwrap_or_default()
    }
}

impl fmt::Debug for Eui64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Eui64({})", self.to_hex())
    }
}

impl fmt::Display for Eui64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// 32-bit device network address, stored big-endian as transmitted in config.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DevAddr(pub [u8; 4]);

impl DevAddr {
    pub fn from_hex(s: &str) -> Result<Self, DecodeError> {
        decode_hex(s).map(Self)
    }

    /// Numeric address (big-endian interpretation of the hex form).
    pub fn as_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl fmt::Debug for DevAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DevAddr({:08X})", self.as_u32())
    }
}

impl fmt::Display for DevAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.as_u32())
    }
}

/// 128-bit AES key (AppKey, NwkSKey, AppSKey).
///
/// `Debug` never prints key material.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AesKey(pub [u8; 16]);

impl AesKey {
    pub fn from_hex(s: &str) -> Result<Self, DecodeError> {
        decode_hex(s).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AesKey(<redacted>)")
    }
}
