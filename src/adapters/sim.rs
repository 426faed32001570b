//! In-process simulated hardware.
//!
//! Lets either node run on a development host with no radio, GPIO or SPI
//! attached:
//!
//! | Adapter    | Stands in for              | Behaviour                                  |
//! |------------|----------------------------|--------------------------------------------|
//! | `SimRadio` | nRF24L01 transceiver       | acks every frame; optionally emulates a Boiler peer |
//! | `SimPin`   | GPIO output line           | logs the driven level                      |
//! | `SimSpi`   | TC77 on spidev             | returns a slowly wobbling temperature      |

use std::collections::VecDeque;
use std::convert::Infallible;
use std::time::{Duration, Instant};

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};
use log::debug;

use crate::app::ports::Transceiver;
use crate::error::LinkError;
use crate::radio::Frame;
use crate::radio::command::Command;
use crate::sensors::temperature::from_celsius;

// ───────────────────────────────────────────────────────────────
// Radio
// ───────────────────────────────────────────────────────────────

/// Emulated Boiler on the far side of the link.
struct SimBoiler {
    relays: Vec<bool>,
    celsius: f64,
    period: Duration,
    last_telemetry: Instant,
}

pub struct SimRadio {
    listening: bool,
    inbox: VecDeque<Frame>,
    peer: Option<SimBoiler>,
    last_error: Option<String>,
}

impl SimRadio {
    /// A link whose peer acknowledges everything and never transmits.
    pub fn silent() -> Self {
        Self {
            listening: false,
            inbox: VecDeque::new(),
            peer: None,
            last_error: None,
        }
    }

    /// A link to an emulated Boiler with `relays` channels that reports
    /// `celsius` every `period`.
    pub fn with_boiler(relays: usize, celsius: f64, period: Duration) -> Self {
        Self {
            peer: Some(SimBoiler {
                relays: vec![false; relays],
                celsius,
                period,
                last_telemetry: Instant::now(),
            }),
            ..Self::silent()
        }
    }

    fn queue(&mut self, bytes: &[u8]) {
        if let Ok(frame) = Frame::from_slice(bytes) {
            self.inbox.push_back(frame);
        }
    }
}

impl Transceiver for SimRadio {
    fn write(&mut self, frame: &[u8]) -> bool {
        if self.listening {
            self.last_error = Some("write while listening".to_owned());
            return false;
        }
        let Some(peer) = self.peer.as_mut() else {
            return true;
        };
        let mut replies = Vec::new();
        for &byte in frame {
            let cmd = Command::decode(byte);
            let pin = usize::from(cmd.pin);
            if pin >= peer.relays.len() {
                debug!("sim boiler: no relay {}", pin);
                continue;
            }
            if cmd.query {
                replies.push(u8::from(peer.relays[pin]));
            } else {
                peer.relays[pin] = cmd.state;
            }
        }
        for reply in replies {
            self.queue(&[reply]);
        }
        true
    }

    fn start_listening(&mut self) {
        self.listening = true;
    }

    fn stop_listening(&mut self) {
        self.listening = false;
    }

    fn available(&mut self) -> bool {
        if let Some(peer) = self.peer.as_mut() {
            if peer.last_telemetry.elapsed() >= peer.period {
                peer.last_telemetry = Instant::now();
                let raw = from_celsius(peer.celsius);
                self.queue(&raw);
            }
        }
        !self.inbox.is_empty()
    }

    fn read(&mut self) -> Frame {
        self.inbox.pop_front().unwrap_or_default()
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    fn end(&mut self) -> Result<(), LinkError> {
        self.inbox.clear();
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// GPIO
// ───────────────────────────────────────────────────────────────

/// Output line that logs every level driven onto it.
#[derive(Debug, Clone, Copy)]
pub struct SimPin {
    line: u32,
}

impl SimPin {
    pub fn new(line: u32) -> Self {
        Self { line }
    }
}

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        debug!("sim gpio {} -> low", self.line);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        debug!("sim gpio {} -> high", self.line);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// SPI thermometer
// ───────────────────────────────────────────────────────────────

/// TC77 stand-in: `base` °C plus a small triangular wobble.
pub struct SimSpi {
    base: f64,
    reads: u32,
}

impl SimSpi {
    pub fn new(base: f64) -> Self {
        Self { base, reads: 0 }
    }

    fn celsius(&self) -> f64 {
        let phase = f64::from(self.reads % 16);
        let wobble = if phase < 8.0 { phase } else { 16.0 - phase };
        self.base + wobble * 0.125
    }
}

impl spi::ErrorType for SimSpi {
    type Error = Infallible;
}

impl SpiDevice for SimSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        let word = from_celsius(self.celsius());
        self.reads = self.reads.wrapping_add(1);
        for op in operations {
            match op {
                Operation::TransferInPlace(buf) | Operation::Read(buf) => {
                    for (dst, src) in buf.iter_mut().zip(word) {
                        *dst = src;
                    }
                }
                Operation::Transfer(read, _) => {
                    for (dst, src) in read.iter_mut().zip(word) {
                        *dst = src;
                    }
                }
                Operation::Write(_) | Operation::DelayNs(_) => {}
            }
        }
        Ok(())
    }
}
