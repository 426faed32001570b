//! Port traits: the boundary between the control loops and the hardware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Boiler / Controller loop
//! ```
//!
//! Driven adapters (radio, relays, thermometer, telemetry store, clock)
//! implement these traits.  The loops own their adapters exclusively and
//! never share them across threads; the only cross-thread channel is the
//! button queue in [`events`](crate::events).

use crate::error::{LinkError, RelayError, SensorError, StorageError};
use crate::radio::{Channel, Frame};
use crate::sensors::TelemetryPoint;

// ───────────────────────────────────────────────────────────────
// Radio port
// ───────────────────────────────────────────────────────────────

/// Half-duplex wireless transceiver.
///
/// # Contract
///
/// `available` and `read` are only valid between `start_listening` and
/// `stop_listening`; `write` only outside that span.  Callers go through
/// [`Link`](crate::radio::link::Link), which makes the other order
/// unrepresentable.
pub trait Transceiver {
    /// Transmit one frame.  `true` when the peer acknowledged it within
    /// the driver's auto-retransmit budget.
    fn write(&mut self, frame: &[u8]) -> bool;

    fn start_listening(&mut self);

    fn stop_listening(&mut self);

    /// A received frame is waiting.
    fn available(&mut self) -> bool;

    /// Take the waiting frame.  Empty if none was waiting.
    fn read(&mut self) -> Frame;

    /// Retransmissions the last `write` needed (informational).
    fn retransmissions(&self) -> u8 {
        0
    }

    /// Driver's description of the last failure, if it keeps one.
    fn last_error(&self) -> Option<String> {
        None
    }

    /// Power the radio down and release the bus.
    fn end(&mut self) -> Result<(), LinkError> {
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Relay port
// ───────────────────────────────────────────────────────────────

/// A bank of on/off channels indexed `0..len()`.
pub trait RelayBank {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set(&mut self, index: usize, on: bool) -> Result<(), RelayError>;

    fn get(&self, index: usize) -> Result<bool, RelayError>;
}

// ───────────────────────────────────────────────────────────────
// Temperature port
// ───────────────────────────────────────────────────────────────

pub trait TemperatureSensor {
    /// One raw two-byte reading, exactly as the radio carries it.
    fn sample_raw(&mut self) -> Result<[u8; 2], SensorError>;

    fn to_celsius(&self, raw: [u8; 2]) -> f64 {
        crate::sensors::temperature::to_celsius(raw)
    }

    fn read_celsius(&mut self) -> Result<f64, SensorError> {
        let raw = self.sample_raw()?;
        Ok(self.to_celsius(raw))
    }

    fn close(&mut self) -> Result<(), SensorError> {
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Telemetry sink (driven adapter: domain → persistent store)
// ───────────────────────────────────────────────────────────────

/// Append-only time-series store.
///
/// Errors are transient from the caller's point of view: the point is
/// logged and dropped, never retried.
pub trait TelemetrySink {
    fn append(&mut self, point: &TelemetryPoint) -> Result<(), StorageError>;

    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.flush()
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock time source for timestamps and `time` boost deadlines.
pub trait Clock {
    /// Seconds since the Unix epoch.
    fn now(&self) -> f64;
}

// ───────────────────────────────────────────────────────────────
// Channel control (scheduler / dispatcher → Controller)
// ───────────────────────────────────────────────────────────────

/// What the action scheduler and the request dispatcher need from the
/// Controller: switch or read a channel, local or over the radio.
///
/// `Ok(false)` / `Ok(None)` mean the radio peer did not answer in time.
/// `Err` means the channel does not exist on the local bank.
pub trait ChannelControl {
    fn control(&mut self, channel: Channel, on: bool) -> Result<bool, RelayError>;

    fn query(&mut self, channel: Channel) -> Result<Option<bool>, RelayError>;
}
