//! Trimmed-mean down-sampler.
//!
//! Each sensor keeps a sliding window of its last [`WINDOW`] samples.
//! Every sample is persisted as-is to the raw stream.  Once the window is
//! full, the mean of its middle [`KEEP`] sorted values is persisted to the
//! smoothed stream, stamped with the time of the 11th-oldest sample, and
//! the oldest sample is dropped so the window slides by one.
//!
//! ```text
//!  sorted window:  [ 7 lowest | 7 kept | 7 highest ]
//!                               ▲
//!                        mean → smoothed point
//! ```

use std::collections::BTreeMap;

use heapless::Deque;
use log::warn;

use super::{SensorId, Stream, TelemetryPoint};
use crate::app::ports::TelemetrySink;

/// Raw samples per smoothed point.
pub const WINDOW: usize = 21;

/// Samples discarded at each end of the sorted window.
const TRIM: usize = 7;

/// Samples averaged.
pub const KEEP: usize = WINDOW - 2 * TRIM;

/// Index (oldest = 0) of the sample whose timestamp the smoothed point takes.
const STAMP_INDEX: usize = WINDOW / 2;

#[derive(Debug, Clone, Copy)]
struct Sample {
    timestamp: f64,
    value: f64,
}

/// Per-sensor sliding windows.
#[derive(Default)]
pub struct SampleFilter {
    windows: BTreeMap<SensorId, Deque<Sample, WINDOW>>,
}

impl SampleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample for `sensor`.
    ///
    /// Storage failures are logged and the affected point is dropped; the
    /// window itself is unaffected.  Returns the smoothed point when one
    /// was produced.
    pub fn push(
        &mut self,
        sensor: SensorId,
        timestamp: f64,
        value: f64,
        sink: &mut impl TelemetrySink,
    ) -> Option<TelemetryPoint> {
        persist(
            sink,
            TelemetryPoint {
                timestamp,
                sensor,
                value,
                stream: Stream::Raw,
            },
        );

        let window = self.windows.entry(sensor).or_default();
        // The window never holds more than WINDOW - 1 samples between calls.
        if window.push_back(Sample { timestamp, value }).is_err() {
            window.pop_front();
            let _ = window.push_back(Sample { timestamp, value });
        }

        if !window.is_full() {
            return None;
        }

        let point = TelemetryPoint {
            timestamp: window
                .iter()
                .nth(STAMP_INDEX)
                .map_or(timestamp, |s| s.timestamp),
            sensor,
            value: trimmed_mean(window),
            stream: Stream::Smoothed,
        };
        window.pop_front();
        persist(sink, point);
        Some(point)
    }

    /// Samples currently buffered for `sensor`.
    pub fn buffered(&self, sensor: SensorId) -> usize {
        self.windows.get(&sensor).map_or(0, Deque::len)
    }
}

fn trimmed_mean(window: &Deque<Sample, WINDOW>) -> f64 {
    let mut values = [0.0f64; WINDOW];
    for (slot, sample) in values.iter_mut().zip(window.iter()) {
        *slot = sample.value;
    }
    values.sort_unstable_by(f64::total_cmp);
    values[TRIM..TRIM + KEEP].iter().sum::<f64>() / KEEP as f64
}

fn persist(sink: &mut impl TelemetrySink, point: TelemetryPoint) {
    if let Err(e) = sink.append(&point) {
        warn!(
            "telemetry: dropped {:?} point for sensor {}: {}",
            point.stream, point.sensor, e
        );
    }
}
