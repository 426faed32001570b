//! Edge-debounced button inputs.
//!
//! ## Hardware
//!
//! Momentary switches to ground with pull-ups, one GPIO line each.  The
//! GPIO layer calls [`ButtonInputs::on_falling_edge`] from its callback
//! thread; an edge is accepted only if the previous accepted edge on the
//! same line is at least the debounce window old.  Accepted edges push the
//! line's logical index (its position in the configured list) into the
//! shared [`ButtonQueue`].
//!
//! | Line list | Edge on | Queued index |
//! |-----------|---------|--------------|
//! | `[23, 24]`| 23      | 0            |
//! | `[23, 24]`| 24      | 1            |

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use log::debug;

use crate::events::ButtonQueue;

/// Marks a line that has never seen an accepted edge.
const NEVER: u64 = u64::MAX;

pub struct ButtonInputs {
    lines: Vec<u32>,
    last_edge_ms: Vec<AtomicU64>,
    debounce_ms: u64,
    queue: Arc<ButtonQueue>,
    epoch: Instant,
}

impl ButtonInputs {
    pub fn new(lines: Vec<u32>, debounce: Duration, queue: Arc<ButtonQueue>) -> Self {
        let last_edge_ms = lines.iter().map(|_| AtomicU64::new(NEVER)).collect();
        Self {
            lines,
            last_edge_ms,
            debounce_ms: u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX),
            queue,
            epoch: Instant::now(),
        }
    }

    /// Edge callback.  Safe to call from any thread.
    /// Returns `true` if the edge was accepted.
    pub fn on_falling_edge(&self, line: u32) -> bool {
        let now_ms = u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.on_falling_edge_at(line, now_ms)
    }

    /// As [`on_falling_edge`](Self::on_falling_edge) with an explicit
    /// monotonic timestamp.
    pub fn on_falling_edge_at(&self, line: u32, now_ms: u64) -> bool {
        let Some(index) = self.lines.iter().position(|&l| l == line) else {
            debug!("button: edge on unwatched line {}", line);
            return false;
        };
        let slot = &self.last_edge_ms[index];
        let last = slot.load(Ordering::Acquire);
        if last != NEVER && now_ms.saturating_sub(last) < self.debounce_ms {
            debug!("button: bounce on line {} ignored", line);
            return false;
        }
        // A concurrent edge on the same line that won the race owns this press.
        if slot
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        let Ok(index) = u8::try_from(index) else {
            return false;
        };
        self.queue.push(index)
    }
}
