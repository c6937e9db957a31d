//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements      | Connects to                     |
//! |-------------|-----------------|---------------------------------|
//! | `device_id` | —               | eFuse MAC → DevEUI              |
//! | `log_sink`  | EventSink       | Serial log output               |
//! | `nvs`       | ConfigPort      | NVS / in-memory store           |
//! | `radio`     | RadioPort       | Simulated LoRaWAN stack         |
//! | `random`    | RandomSource    | ESP32 hardware RNG / OS CSPRNG  |
//! | `time`      | ClockPort       | ESP32 high-resolution timer     |

pub mod device_id;
pub mod log_sink;
pub mod nvs;
pub mod radio;
pub mod random;
pub mod time;
