//! Hardware randomness for transmit jitter.
//!
//! - **`target_os = "espidf"`** — the ESP32 hardware RNG via
//!   `esp_fill_random`.  True random once the RF subsystem is up.
//! - **`not(target_os = "espidf")`** — the OS CSPRNG (`rand_core::OsRng`).
//!
//! Both are `CryptoRng`: every node draws an independent jitter sequence.

use rand_core::{CryptoRng, RngCore};

use crate::app::ports::RandomSource;

/// 2^53: `u64 >> 11` over this is uniform on `[0, 1)` with full `f64` precision.
const F64_SCALE: f64 = (1u64 << 53) as f64;

/// [`RandomSource`] over any cryptographic generator.
#[derive(Debug, Default)]
pub struct HardwareRandom<R> {
    rng: R,
}

impl<R: RngCore + CryptoRng> HardwareRandom<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: RngCore + CryptoRng> RandomSource for HardwareRandom<R> {
    fn uniform01(&mut self) -> f64 {
        (self.rng.next_u64() >> 11) as f64 / F64_SCALE
    }
}

// ── Platform generator ───────────────────────────────────────

/// ESP32 hardware RNG.
#[cfg(target_os = "espidf")]
#[derive(Debug, Default, Clone, Copy)]
pub struct EspHardwareRng;

#[cfg(target_os = "espidf")]
impl RngCore for EspHardwareRng {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        // SAFETY: esp_fill_random writes exactly `dest.len()` bytes into a
        // buffer that is valid and exclusively borrowed.
        unsafe {
            esp_idf_svc::sys::esp_fill_random(dest.as_mut_ptr().cast(), dest.len());
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(target_os = "espidf")]
impl CryptoRng for EspHardwareRng {}

#[cfg(target_os = "espidf")]
pub type PlatformRng = EspHardwareRng;

#[cfg(not(target_os = "espidf"))]
pub type PlatformRng = rand_core::OsRng;

/// The jitter source for this platform.
pub fn platform_random() -> HardwareRandom<PlatformRng> {
    HardwareRandom::new(PlatformRng::default())
}
