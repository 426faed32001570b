//! Temperature sensing and the telemetry points it produces.
//!
//! The Controller samples its own TC77 (sensor 0) every cycle and receives
//! the Boiler's raw reading over the radio (sensor 1).  Both streams go
//! through the [`SampleFilter`](filter::SampleFilter) before reaching the
//! [`TelemetrySink`](crate::app::ports::TelemetrySink).

pub mod filter;
pub mod temperature;

use serde::{Deserialize, Serialize};

/// Telemetry stream identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(pub u8);

impl SensorId {
    /// The Controller's own sensor.
    pub const LOCAL: Self = Self(0);
    /// The Boiler's sensor, received over the radio.
    pub const REMOTE: Self = Self(1);
}

impl core::fmt::Display for SensorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which series a point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    /// Every sample, unfiltered.
    Raw,
    /// Trimmed-mean output of the sample window.
    Smoothed,
}

/// One persisted time-series point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPoint {
    /// Seconds since the Unix epoch.
    #[serde(rename = "ts")]
    pub timestamp: f64,
    pub sensor: SensorId,
    pub value: f64,
    pub stream: Stream,
}
