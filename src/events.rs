//! Button event queue.
//!
//! The only state shared across threads.  GPIO edge callbacks run outside
//! the Boiler loop and push the logical index of the pressed button; the
//! loop drains the queue without blocking once per cycle.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ edge cb (0)  │────▶│              │     │              │
//! │ edge cb (1)  │────▶│  ButtonQueue │────▶│  Boiler loop │
//! │ ...          │────▶│  (lock-free) │     │  (consumer)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Callbacks never touch relay or radio state directly.

use heapless::mpmc::Q32;
use log::warn;

/// Maximum number of undrained presses.
pub const EVENT_QUEUE_CAP: usize = 32;

/// Lock-free multi-producer queue of button indices.
pub struct ButtonQueue {
    inner: Q32<u8>,
}

impl Default for ButtonQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ButtonQueue {
    pub const fn new() -> Self {
        Self { inner: Q32::new() }
    }

    /// Push a press.  Safe from any thread.
    /// Returns `false` if the queue is full (press dropped).
    pub fn push(&self, index: u8) -> bool {
        if self.inner.enqueue(index).is_err() {
            warn!("button queue full, dropping press on button {}", index);
            return false;
        }
        true
    }

    /// Pop the oldest press, if any.
    pub fn pop(&self) -> Option<u8> {
        self.inner.dequeue()
    }

    /// Hand every pending press to `handler` in arrival order.
    pub fn drain(&self, mut handler: impl FnMut(u8)) {
        while let Some(index) = self.pop() {
            handler(index);
        }
    }
}
