//! Controller loop: the control node.
//!
//! [`Controller`] owns the radio, the local relay bank, the local TC77,
//! the telemetry sink, the action scheduler and the control socket.  One
//! cycle:
//!
//! ```text
//!  ┌────────────────────────────────────────────────────────────────┐
//!  │ 1. listen ≤ listen_timeout, woken early by a client or shutdown│
//!  │    2-byte frame ──▶ SampleFilter (sensor 1)                    │
//!  │    local TC77   ──▶ SampleFilter (sensor 0)                    │
//!  │ 2. ActionScheduler::evaluate (at most one action fires)        │
//!  │ 3. non-blocking accept if the wait did not already take one    │
//!  │ 4. serve: one line in, one line out, close                     │
//!  └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on one thread.  The only fatal condition inside a
//! cycle is an accept error other than "no pending connection".

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use super::ports::{ChannelControl, Clock, RelayBank, TelemetrySink, TemperatureSensor, Transceiver};
use crate::config::ControllerConfig;
use crate::error::{Error, RelayError};
use crate::radio::command::{Command, QUERY_REPLY_LEN, TELEMETRY_FRAME_LEN};
use crate::radio::link::{Link, Reception};
use crate::radio::{Channel, Frame};
use crate::rpc::engine::{dispatch, serve_connection};
use crate::rpc::transport::ControlServer;
use crate::scheduler::ActionScheduler;
use crate::sensors::filter::SampleFilter;
use crate::sensors::{SensorId, temperature};

// ───────────────────────────────────────────────────────────────
// Settings
// ───────────────────────────────────────────────────────────────

/// Timing knobs for the Controller loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub listen_timeout: Duration,
    pub query_timeout: Duration,
    pub client_timeout: Duration,
    pub poll_interval: Duration,
    /// Local samples closer together than this are skipped.
    pub min_sample_interval: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}

impl ControllerSettings {
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            listen_timeout: config.listen_timeout(),
            query_timeout: config.query_timeout(),
            client_timeout: config.client_timeout(),
            poll_interval: config.poll_interval(),
            min_sample_interval: config.min_sample_interval(),
        }
    }
}

/// Hardware and endpoints handed to [`Controller::new`].
pub struct ControllerParts<R, B, T, S, C, V> {
    pub radio: R,
    pub relays: B,
    pub sensor: T,
    pub sink: S,
    pub clock: C,
    pub server: V,
}

// ───────────────────────────────────────────────────────────────
// Channel I/O
// ───────────────────────────────────────────────────────────────

/// The part of the Controller that switches and reads channels.
///
/// Split out so the request dispatcher and the scheduler can borrow it
/// while the Controller also holds the connection being served.
pub struct ControllerIo<R, B, S, C> {
    link: Link<R>,
    relays: B,
    sink: S,
    clock: C,
    filter: SampleFilter,
    query_timeout: Duration,
}

impl<R, B, S, C> ControllerIo<R, B, S, C>
where
    R: Transceiver,
    B: RelayBank,
    S: TelemetrySink,
    C: Clock,
{
    /// Feed a raw reading from the Boiler into the filter.
    fn record_remote(&mut self, frame: &Frame) {
        if let [hi, lo] = frame.as_slice() {
            let celsius = temperature::to_celsius([*hi, *lo]);
            debug!("remote temperature {:.4} °C", celsius);
            self.filter
                .push(SensorId::REMOTE, self.clock.now(), celsius, &mut self.sink);
        }
    }

    fn send_command(&mut self, cmd: Command) -> bool {
        let acked = self.link.transmit(&[cmd.encode()]);
        if !acked {
            warn!(
                "radio: command {:#04x} not acknowledged (last error: {})",
                cmd.encode(),
                self.link.last_error().as_deref().unwrap_or("none")
            );
        }
        acked
    }

    /// Listen up to the query timeout for the Boiler's one-byte answer.
    /// Telemetry that arrives meanwhile is recorded and waiting resumes.
    fn await_reply(&mut self) -> Option<bool> {
        let deadline = Instant::now() + self.query_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            match self.link.receive(remaining, || false) {
                Reception::Frame(frame) if frame.len() == QUERY_REPLY_LEN => {
                    return Some(frame[0] != 0);
                }
                Reception::Frame(frame) if frame.len() == TELEMETRY_FRAME_LEN => {
                    self.record_remote(&frame);
                }
                Reception::Frame(frame) => {
                    debug!("radio: ignoring {}-byte frame while awaiting reply", frame.len());
                }
                Reception::Woken | Reception::TimedOut => return None,
            }
        }
    }
}

impl<R, B, S, C> ChannelControl for ControllerIo<R, B, S, C>
where
    R: Transceiver,
    B: RelayBank,
    S: TelemetrySink,
    C: Clock,
{
    fn control(&mut self, channel: Channel, on: bool) -> Result<bool, RelayError> {
        match channel {
            Channel::Local(index) => {
                self.relays.set(index, on)?;
                info!("local relay {} -> {}", index, if on { "on" } else { "off" });
                Ok(true)
            }
            Channel::Remote(pin) => Ok(self.send_command(Command::set(pin, on))),
        }
    }

    fn query(&mut self, channel: Channel) -> Result<Option<bool>, RelayError> {
        match channel {
            Channel::Local(index) => self.relays.get(index).map(Some),
            Channel::Remote(pin) => {
                if !self.send_command(Command::query(pin)) {
                    return Ok(None);
                }
                Ok(self.await_reply())
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller<R, B, T, S, C, V: ControlServer> {
    io: ControllerIo<R, B, S, C>,
    sensor: T,
    scheduler: ActionScheduler,
    server: V,
    /// Connection accepted during the wait, served later in the cycle.
    pending: Option<V::Conn>,
    settings: ControllerSettings,
    /// Latest local reading; `None` until the first successful sample.
    temperature: Option<f64>,
    last_local_sample: Option<Instant>,
}

impl<R, B, T, S, C, V> Controller<R, B, T, S, C, V>
where
    R: Transceiver,
    B: RelayBank,
    T: TemperatureSensor,
    S: TelemetrySink,
    C: Clock,
    V: ControlServer,
{
    pub fn new(parts: ControllerParts<R, B, T, S, C, V>, settings: ControllerSettings) -> Self {
        Self {
            io: ControllerIo {
                link: Link::new(parts.radio, settings.poll_interval),
                relays: parts.relays,
                sink: parts.sink,
                clock: parts.clock,
                filter: SampleFilter::new(),
                query_timeout: settings.query_timeout,
            },
            sensor: parts.sensor,
            scheduler: ActionScheduler::new(),
            server: parts.server,
            pending: None,
            settings,
            temperature: None,
            last_local_sample: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run cycles until `shutdown` is set.  Only a fatal socket error
    /// ends the loop early.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<(), Error> {
        info!("controller: running");
        while !shutdown.load(Ordering::Relaxed) {
            self.run_cycle(shutdown)?;
        }
        info!("controller: shutdown requested");
        Ok(())
    }

    /// One pass of the loop.
    pub fn run_cycle(&mut self, shutdown: &AtomicBool) -> Result<(), Error> {
        // 1. Wait for the radio, a client or shutdown, whichever comes first.
        let mut accept_error = None;
        let server = &mut self.server;
        let pending = &mut self.pending;
        let reception = self.io.link.receive(self.settings.listen_timeout, || {
            if shutdown.load(Ordering::Relaxed) || pending.is_some() {
                return true;
            }
            match server.accept() {
                Ok(Some(conn)) => {
                    *pending = Some(conn);
                    true
                }
                Ok(None) => false,
                Err(e) => {
                    accept_error = Some(e);
                    true
                }
            }
        });
        if let Some(e) = accept_error {
            error!("control socket accept failed: {}", e);
            return Err(e.into());
        }

        match reception {
            Reception::Frame(frame) if frame.len() == TELEMETRY_FRAME_LEN => {
                self.io.record_remote(&frame);
            }
            Reception::Frame(frame) => {
                debug!("radio: ignoring unsolicited {}-byte frame", frame.len());
            }
            Reception::Woken | Reception::TimedOut => {}
        }
        self.sample_local();

        // 2. Deferred actions.
        let now = self.io.clock.now();
        if let Some(firing) = self.scheduler.evaluate(self.temperature, now, &mut self.io) {
            debug!("scheduler: {} succeeded={}", firing.action, firing.succeeded);
        }

        // 3. Accept, unless the wait already did.
        if self.pending.is_none() {
            self.pending = self.server.accept().inspect_err(|e| {
                error!("control socket accept failed: {}", e);
            })?;
        }

        // 4. Serve.
        if let Some(mut conn) = self.pending.take() {
            let io = &mut self.io;
            let scheduler = &mut self.scheduler;
            let temperature = self.temperature;
            let reply = serve_connection(&mut conn, self.settings.client_timeout, |request| {
                let now = io.clock.now();
                dispatch(request, io, scheduler, temperature, now)
            });
            info!("control: replied {:?}", reply.to_string());
        }
        Ok(())
    }

    fn sample_local(&mut self) {
        if let Some(last) = self.last_local_sample {
            if last.elapsed() < self.settings.min_sample_interval {
                return;
            }
        }
        self.last_local_sample = Some(Instant::now());
        match self.sensor.read_celsius() {
            Ok(celsius) => {
                self.temperature = Some(celsius);
                let now = self.io.clock.now();
                self.io
                    .filter
                    .push(SensorId::LOCAL, now, celsius, &mut self.io.sink);
            }
            Err(e) => warn!("local temperature read failed: {}", e),
        }
    }

    /// Release everything in order: radio, telemetry store, control
    /// socket, sensor.  Every step runs even if an earlier one fails; the
    /// failures are logged and returned.
    pub fn teardown(&mut self) -> Vec<Error> {
        let mut failures: Vec<Error> = Vec::new();
        if let Err(e) = self.io.link.end() {
            failures.push(e.into());
        }
        if let Err(e) = self.io.sink.close() {
            failures.push(e.into());
        }
        self.pending = None;
        if let Err(e) = self.server.close() {
            failures.push(e.into());
        }
        if let Err(e) = self.sensor.close() {
            failures.push(e.into());
        }
        for e in &failures {
            error!("controller teardown: {}", e);
        }
        info!("controller: teardown complete");
        failures
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn scheduler(&self) -> &ActionScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut ActionScheduler {
        &mut self.scheduler
    }
}
