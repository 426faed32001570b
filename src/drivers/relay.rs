//! Relay bank on GPIO outputs.
//!
//! The relay boards are active-low: driving a line low energises the
//! coil.  Every channel is driven off at construction, so a node that
//! restarts never leaves a boiler running from a stale latch.
//!
//! ## Dual-target design
//!
//! Generic over [`embedded_hal::digital::OutputPin`]: a Linux GPIO line on
//! the node, [`SimPin`](crate::adapters::sim::SimPin) on the host.  The
//! commanded state is tracked in software and is what `get` reports.

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::app::ports::RelayBank;
use crate::error::RelayError;

pub struct GpioRelayBank<P> {
    pins: Vec<P>,
    states: Vec<bool>,
}

impl<P: OutputPin> GpioRelayBank<P> {
    /// Take ownership of `pins` and switch every channel off.
    pub fn new(pins: Vec<P>) -> Result<Self, RelayError> {
        let states = vec![false; pins.len()];
        let mut bank = Self { pins, states };
        for index in 0..bank.pins.len() {
            bank.set(index, false)?;
        }
        Ok(bank)
    }

    fn check(&self, index: usize) -> Result<(), RelayError> {
        if index < self.pins.len() {
            Ok(())
        } else {
            Err(RelayError::OutOfRange {
                index,
                count: self.pins.len(),
            })
        }
    }
}

impl<P: OutputPin> RelayBank for GpioRelayBank<P> {
    fn len(&self) -> usize {
        self.pins.len()
    }

    fn set(&mut self, index: usize, on: bool) -> Result<(), RelayError> {
        self.check(index)?;
        let pin = &mut self.pins[index];
        let driven = if on { pin.set_low() } else { pin.set_high() };
        driven.map_err(|_| RelayError::GpioWriteFailed)?;
        self.states[index] = on;
        debug!("relay {} -> {}", index, if on { "on" } else { "off" });
        Ok(())
    }

    fn get(&self, index: usize) -> Result<bool, RelayError> {
        self.check(index)?;
        Ok(self.states[index])
    }
}
