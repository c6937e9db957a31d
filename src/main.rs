//! LoRaNode Firmware — Main Entry Point
//!
//! Hexagonal architecture: one startup pass, then a single uplink loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimRadio       LogEventSink   NvsAdapter   MonotonicClock     │
//! │  (RadioPort)    (EventSink)    (Config)     (ClockPort)        │
//! │  HardwareRandom TestPatternProducer                            │
//! │  (RandomSource) (PayloadProducer)                              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              NodeService (pure logic)                  │    │
//! │  │  Identity · Activation · TransmissionScheduler         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No transceiver driver is wired yet: the image drives [`SimRadio`], which
//! joins and accepts uplinks without keying a radio.  A LoRa driver slots in
//! behind `RadioPort` in step 4 without touching the service.
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::{Context, Result};
use log::{info, warn};

use loranode::adapters::device_id;
use loranode::adapters::log_sink::LogEventSink;
use loranode::adapters::nvs::NvsAdapter;
use loranode::adapters::radio::SimRadio;
use loranode::adapters::random::platform_random;
use loranode::adapters::time::MonotonicClock;
use loranode::app::ports::{ConfigError, ConfigPort};
use loranode::app::service::NodeService;
use loranode::config::NodeConfig;
use loranode::payload::TestPatternProducer;
use loranode::registry::{DeviceRegistry, FLEET};

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  LoRaNode v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new() {
        Ok(nvs) => match nvs.load() {
            Ok(cfg) => cfg,
            Err(ConfigError::Corrupted) => {
                warn!("Stored config corrupted, using defaults");
                NodeConfig::default()
            }
            Err(e) => return Err(e).context("loading node config"),
        },
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            NodeConfig::default()
        }
    };
    config.validate().context("validating node config")?;
    info!(
        "Config: uplink every {}ms + U(0, {}ms), {:?}, DR{}",
        config.fixed_interval_ms,
        config.jitter_window_ms,
        config.activation,
        config.data_rate.index()
    );

    // ── 3. Device registry ────────────────────────────────────
    let registry = DeviceRegistry::from_entries(FLEET).context("loading fleet table")?;

    // ── 4. Adapters ───────────────────────────────────────────
    // Nothing stops the node on target; it runs until reset.
    let mut clock = MonotonicClock::default();
    let mut rng = platform_random();
    let mut sink = LogEventSink::new();
    let mut producer = TestPatternProducer::new();
    let provisioned = config
        .provisioned_dev_eui()
        .context("decoding provisioned DevEUI")?;
    let radio = SimRadio::new(config.radio, device_id::read_dev_eui(provisioned));

    // ── 5. Identity → join → uplink loop ──────────────────────
    let service = NodeService::new(config, registry);
    let summary = service
        .run(radio, &mut producer, &mut clock, &mut rng, &mut sink)
        .context("node startup failed")?;

    info!("Node stopped after {} uplinks", summary.sent);
    Ok(())
}
