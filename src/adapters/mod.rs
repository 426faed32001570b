//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements              | Connects to                  |
//! |-----------------|-------------------------|------------------------------|
//! | `sim`           | Transceiver             | in-process emulated peer     |
//! |                 | OutputPin / SpiDevice   | in-memory GPIO line / TC77   |
//! | `telemetry_log` | TelemetrySink           | append-only JSON-lines file  |
//! | `time`          | Clock                   | system wall clock            |

pub mod sim;
pub mod telemetry_log;
pub mod time;
