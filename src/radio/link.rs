//! Half-duplex link discipline.
//!
//! The transceiver cannot listen and transmit at once.  [`Link`] owns it
//! and keeps it in transmit mode except while a [`Listening`] guard is
//! alive:
//!
//! ```text
//!   link.listen() ──▶ start_listening ──▶ available/read ──▶ drop ──▶ stop_listening
//!   link.transmit()  (needs &mut Link, so no guard can be alive)
//! ```
//!
//! Dropping the guard restores transmit mode on every exit path, early
//! returns and unwinding included.

use std::time::{Duration, Instant};

use log::debug;

use super::Frame;
use crate::app::ports::Transceiver;
use crate::error::LinkError;

/// Outcome of a bounded receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reception {
    /// A frame arrived.
    Frame(Frame),
    /// The wake condition fired before any frame arrived.
    Woken,
    /// Nothing arrived before the deadline.
    TimedOut,
}

/// Exclusive owner of a [`Transceiver`].
pub struct Link<R> {
    radio: R,
    poll_interval: Duration,
}

impl<R: Transceiver> Link<R> {
    pub fn new(radio: R, poll_interval: Duration) -> Self {
        Self {
            radio,
            poll_interval,
        }
    }

    /// Enter listen mode until the returned guard is dropped.
    pub fn listen(&mut self) -> Listening<'_, R> {
        self.radio.start_listening();
        Listening {
            radio: &mut self.radio,
        }
    }

    /// Send one frame; `true` when acknowledged.
    pub fn transmit(&mut self, frame: &[u8]) -> bool {
        let acked = self.radio.write(frame);
        debug!("radio tx {:02x?} acked={}", frame, acked);
        acked
    }

    /// Listen for at most `timeout`, polling every `poll_interval`.
    ///
    /// `wake` is checked between polls so another readiness source (the
    /// control socket, a shutdown flag) can end the wait early.  The radio
    /// is back in transmit mode when this returns.
    pub fn receive(&mut self, timeout: Duration, mut wake: impl FnMut() -> bool) -> Reception {
        let poll = self.poll_interval;
        let deadline = Instant::now() + timeout;
        let mut rx = self.listen();
        loop {
            if rx.available() {
                let frame = rx.read();
                debug!("radio rx {:02x?}", frame);
                return Reception::Frame(frame);
            }
            if wake() {
                return Reception::Woken;
            }
            let now = Instant::now();
            if now >= deadline {
                return Reception::TimedOut;
            }
            std::thread::sleep(poll.min(deadline - now));
        }
    }

    pub fn retransmissions(&self) -> u8 {
        self.radio.retransmissions()
    }

    pub fn last_error(&self) -> Option<String> {
        self.radio.last_error()
    }

    /// Power the radio down.
    pub fn end(&mut self) -> Result<(), LinkError> {
        self.radio.end()
    }
}

/// The radio is in listen mode for as long as this lives.
pub struct Listening<'a, R: Transceiver> {
    radio: &'a mut R,
}

impl<R: Transceiver> Listening<'_, R> {
    pub fn available(&mut self) -> bool {
        self.radio.available()
    }

    pub fn read(&mut self) -> Frame {
        self.radio.read()
    }
}

impl<R: Transceiver> Drop for Listening<'_, R> {
    fn drop(&mut self) {
        self.radio.stop_listening();
    }
}
