//! Unified error types for both nodes.
//!
//! Every subsystem has its own small enum; all of them convert into the
//! crate-wide [`Error`] so the control loops can treat failures uniformly.
//! Transient link faults never travel through these types: a missed ACK is
//! a plain `false` from [`Transceiver::write`](crate::app::ports::Transceiver::write).

use core::fmt;
use std::io;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum Error {
    /// The radio could not be driven at all (not a missed ACK).
    Link(LinkError),
    /// A relay channel could not be switched or read.
    Relay(RelayError),
    /// The temperature sensor could not be read.
    Sensor(SensorError),
    /// The telemetry store rejected a write.
    Storage(StorageError),
    /// A control-socket request could not be understood.
    Request(RequestError),
    /// Control socket I/O.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Relay(e) => write!(f, "relay: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Request(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(StorageError::Io(e)) | Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The transceiver driver reported a hardware fault.
    Hardware(String),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware(msg) => write!(f, "radio hardware fault: {msg}"),
        }
    }
}

impl std::error::Error for LinkError {}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Relay errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    /// Index is outside `0..count`.
    OutOfRange { index: usize, count: usize },
    /// The GPIO write failed.
    GpioWriteFailed,
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { index, count } => {
                write!(f, "relay index {index} out of range (bank has {count})")
            }
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl std::error::Error for RelayError {}

impl From<RelayError> for Error {
    fn from(e: RelayError) -> Self {
        Self::Relay(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The SPI transfer failed.
    SpiTransferFailed,
    /// The sensor was already closed.
    Closed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiTransferFailed => write!(f, "SPI transfer failed"),
            Self::Closed => write!(f, "sensor closed"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StorageError {
    /// Underlying file I/O failed. Transient: the point is dropped.
    Io(io::Error),
    /// A record could not be encoded.
    Encode(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Encode(msg) => write!(f, "encode error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Request errors
// ---------------------------------------------------------------------------

/// Malformed control-socket input. The `Display` text is what the client
/// sees after `invalid request: `.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    Empty,
    NotUtf8,
    LineTooLong(usize),
    UnknownVerb(String),
    MissingArgument(&'static str),
    BadPin(String),
    PinOutOfRange(i64),
    BadMetric(String),
    BadThreshold(String),
    TrailingArguments(String),
    /// The channel exists on the wire but not on this bank.
    Relay(RelayError),
    /// The connection closed or timed out before a full line arrived.
    Incomplete,
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty request"),
            Self::NotUtf8 => write!(f, "request is not valid UTF-8"),
            Self::LineTooLong(max) => write!(f, "request exceeds {max} bytes"),
            Self::UnknownVerb(v) => write!(f, "unknown command {v:?}"),
            Self::MissingArgument(what) => write!(f, "missing {what}"),
            Self::BadPin(p) => write!(f, "invalid pin {p:?}"),
            Self::PinOutOfRange(p) => write!(f, "pin {p} out of range"),
            Self::BadMetric(m) => write!(f, "unknown boost metric {m:?} (expected temp or time)"),
            Self::BadThreshold(t) => write!(f, "invalid threshold {t:?}"),
            Self::TrailingArguments(rest) => write!(f, "unexpected arguments {rest:?}"),
            Self::Relay(e) => write!(f, "{e}"),
            Self::Incomplete => write!(f, "incomplete request line"),
        }
    }
}

impl std::error::Error for RequestError {}

impl From<RequestError> for Error {
    fn from(e: RequestError) -> Self {
        Self::Request(e)
    }
}

impl From<RelayError> for RequestError {
    fn from(e: RelayError) -> Self {
        Self::Relay(e)
    }
}
