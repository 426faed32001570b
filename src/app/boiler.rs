//! Boiler loop: the remote actuator node.
//!
//! ```text
//!  idle ──▶ receiving (≤ listen_timeout) ──▶ buttons appended
//!   ▲                                              │
//!   │                                              ▼
//!   └── transmitting (raw TC77) ◀── each byte: query → reply / set → relay
//! ```
//!
//! Button presses are turned into command bytes and run through the same
//! pipeline as radio traffic, so a press and a remote `on 0` are
//! indistinguishable to the relays.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use super::ports::{RelayBank, TemperatureSensor, Transceiver};
use crate::config::BoilerConfig;
use crate::error::Error;
use crate::events::ButtonQueue;
use crate::radio::command::Command;
use crate::radio::link::{Link, Reception};

/// Timing knobs for the Boiler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoilerSettings {
    pub listen_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for BoilerSettings {
    fn default() -> Self {
        Self::from_config(&BoilerConfig::default())
    }
}

impl BoilerSettings {
    pub fn from_config(config: &BoilerConfig) -> Self {
        Self {
            listen_timeout: config.listen_timeout(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Hardware handed to [`Boiler::new`].
pub struct BoilerParts<R, B, T> {
    pub radio: R,
    pub relays: B,
    pub sensor: T,
    pub buttons: Arc<ButtonQueue>,
}

/// What one cycle did, for logs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Command bytes processed: radio first, then buttons.
    pub commands: Vec<u8>,
    /// Whether the Controller acknowledged the temperature frame.
    pub telemetry_acked: bool,
}

pub struct Boiler<R, B, T> {
    link: Link<R>,
    relays: B,
    sensor: T,
    buttons: Arc<ButtonQueue>,
    settings: BoilerSettings,
}

impl<R, B, T> Boiler<R, B, T>
where
    R: Transceiver,
    B: RelayBank,
    T: TemperatureSensor,
{
    pub fn new(parts: BoilerParts<R, B, T>, settings: BoilerSettings) -> Self {
        Self {
            link: Link::new(parts.radio, settings.poll_interval),
            relays: parts.relays,
            sensor: parts.sensor,
            buttons: parts.buttons,
            settings,
        }
    }

    /// Run cycles until `shutdown` is set.  A failed cycle is logged and
    /// the next one starts.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        info!("boiler: running");
        while !shutdown.load(Ordering::Relaxed) {
            if let Err(e) = self.run_cycle(shutdown) {
                error!("boiler: cycle failed: {}", e);
                if let Some(radio_error) = self.link.last_error() {
                    error!("boiler: last radio error: {}", radio_error);
                }
            }
        }
        info!("boiler: shutdown requested");
    }

    pub fn run_cycle(&mut self, shutdown: &AtomicBool) -> Result<CycleReport, Error> {
        // 1. Receive, or carry on with nothing.
        let mut commands: Vec<u8> = match self
            .link
            .receive(self.settings.listen_timeout, || shutdown.load(Ordering::Relaxed))
        {
            Reception::Frame(frame) => frame.to_vec(),
            Reception::Woken | Reception::TimedOut => Vec::new(),
        };

        // 2. Button presses become local commands for channel 0.
        self.buttons
            .drain(|index| commands.push(Command::set(0, index != 0).encode()));

        // 3. Execute.
        for &byte in &commands {
            self.execute(Command::decode(byte));
        }

        // 4. Report temperature.
        let raw = self.sensor.sample_raw()?;
        let started = Instant::now();
        let telemetry_acked = self.link.transmit(&raw);
        if telemetry_acked {
            let retries = self.link.retransmissions();
            if retries != 0 {
                info!("last TX succeeded in {} retransmissions", retries);
            }
        } else {
            warn!(
                "no ACK from controller after {:?}: {}",
                started.elapsed(),
                self.link.last_error().as_deref().unwrap_or("no error reported")
            );
        }

        Ok(CycleReport {
            commands,
            telemetry_acked,
        })
    }

    fn execute(&mut self, cmd: Command) {
        let pin = usize::from(cmd.pin);
        debug!("pin {} query {} state {}", cmd.pin, cmd.query, cmd.state);
        if cmd.query {
            match self.relays.get(pin) {
                Ok(state) => {
                    if !self.link.transmit(&[u8::from(state)]) {
                        warn!("query reply for relay {} not acknowledged", pin);
                    }
                }
                Err(e) => warn!("query: {}", e),
            }
        } else if let Err(e) = self.relays.set(pin, cmd.state) {
            warn!("set: {}", e);
        }
    }

    /// Release the radio and the sensor.  Both run even if one fails.
    pub fn teardown(&mut self) -> Vec<Error> {
        let mut failures: Vec<Error> = Vec::new();
        if let Err(e) = self.link.end() {
            failures.push(e.into());
        }
        if let Err(e) = self.sensor.close() {
            failures.push(e.into());
        }
        for e in &failures {
            error!("boiler teardown: {}", e);
        }
        info!("boiler: teardown complete");
        failures
    }
}
