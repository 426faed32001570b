//! Mock hardware adapters for integration tests.
//!
//! Every adapter records its calls behind a shared handle, so a test can
//! keep a clone, hand the other to a Controller or Boiler, and assert on
//! the full history afterwards.  [`MockRadio`] panics on any call made in
//! the wrong half-duplex mode.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::time::Duration;

use autoboiler::app::ports::{Clock, RelayBank, TelemetrySink, TemperatureSensor, Transceiver};
use autoboiler::error::{LinkError, RelayError, SensorError, StorageError};
use autoboiler::radio::Frame;
use autoboiler::radio::command::Command;
use autoboiler::rpc::transport::{Connection, ControlServer};
use autoboiler::sensors::temperature::from_celsius;
use autoboiler::sensors::{SensorId, Stream, TelemetryPoint};

/// Shutdown calls across adapters, in the order they happened.  Each
/// mock owns one by default; share a single handle between several to
/// observe their relative order.
pub type Journal = Rc<RefCell<Vec<&'static str>>>;

// ── Radio ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCall {
    Write(Vec<u8>),
    StartListening,
    StopListening,
    Read(Vec<u8>),
    End,
}

#[derive(Default)]
pub struct RadioState {
    pub listening: bool,
    pub calls: Vec<RadioCall>,
    pub inbox: VecDeque<Vec<u8>>,
    /// Scripted ACK results, consumed one per write.
    pub acks: VecDeque<bool>,
    /// ACK result once `acks` is exhausted.
    pub nack_all: bool,
    /// Byte the peer sends back after an acknowledged query command.
    pub query_reply: Option<u8>,
    /// Frames the peer sends just ahead of its query reply.
    pub before_reply: Vec<Vec<u8>>,
    pub retransmissions: u8,
    pub fail_end: bool,
    pub journal: Journal,
}

#[derive(Clone, Default)]
pub struct MockRadio(pub Rc<RefCell<RadioState>>);

impl MockRadio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&self, bytes: &[u8]) {
        self.0.borrow_mut().inbox.push_back(bytes.to_vec());
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.0
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                RadioCall::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn calls(&self) -> Vec<RadioCall> {
        self.0.borrow().calls.clone()
    }

    pub fn is_listening(&self) -> bool {
        self.0.borrow().listening
    }
}

impl Transceiver for MockRadio {
    fn write(&mut self, frame: &[u8]) -> bool {
        let mut s = self.0.borrow_mut();
        assert!(!s.listening, "write while listening");
        s.calls.push(RadioCall::Write(frame.to_vec()));
        let ack = s.acks.pop_front().unwrap_or(!s.nack_all);
        if ack && frame.len() == 1 && Command::decode(frame[0]).query {
            if let Some(reply) = s.query_reply {
                let ahead: Vec<Vec<u8>> = s.before_reply.drain(..).collect();
                s.inbox.extend(ahead);
                s.inbox.push_back(vec![reply]);
            }
        }
        ack
    }

    fn start_listening(&mut self) {
        let mut s = self.0.borrow_mut();
        assert!(!s.listening, "start_listening twice");
        s.listening = true;
        s.calls.push(RadioCall::StartListening);
    }

    fn stop_listening(&mut self) {
        let mut s = self.0.borrow_mut();
        assert!(s.listening, "stop_listening while not listening");
        s.listening = false;
        s.calls.push(RadioCall::StopListening);
    }

    fn available(&mut self) -> bool {
        let s = self.0.borrow();
        assert!(s.listening, "available while transmitting");
        !s.inbox.is_empty()
    }

    fn read(&mut self) -> Frame {
        let mut s = self.0.borrow_mut();
        assert!(s.listening, "read while transmitting");
        let bytes = s.inbox.pop_front().unwrap_or_default();
        s.calls.push(RadioCall::Read(bytes.clone()));
        Frame::from_slice(&bytes).unwrap()
    }

    fn retransmissions(&self) -> u8 {
        self.0.borrow().retransmissions
    }

    fn last_error(&self) -> Option<String> {
        Some("mock: max retransmissions".into())
    }

    fn end(&mut self) -> Result<(), LinkError> {
        let mut s = self.0.borrow_mut();
        s.calls.push(RadioCall::End);
        s.journal.borrow_mut().push("radio");
        if s.fail_end {
            return Err(LinkError::Hardware("spi bus gone".into()));
        }
        Ok(())
    }
}

// ── Relays ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MockRelays(pub Rc<RefCell<Vec<bool>>>);

impl MockRelays {
    pub fn new(count: usize) -> Self {
        Self(Rc::new(RefCell::new(vec![false; count])))
    }

    pub fn states(&self) -> Vec<bool> {
        self.0.borrow().clone()
    }
}

impl RelayBank for MockRelays {
    fn len(&self) -> usize {
        self.0.borrow().len()
    }

    fn set(&mut self, index: usize, on: bool) -> Result<(), RelayError> {
        let mut states = self.0.borrow_mut();
        let count = states.len();
        let slot = states
            .get_mut(index)
            .ok_or(RelayError::OutOfRange { index, count })?;
        *slot = on;
        Ok(())
    }

    fn get(&self, index: usize) -> Result<bool, RelayError> {
        let states = self.0.borrow();
        states.get(index).copied().ok_or(RelayError::OutOfRange {
            index,
            count: states.len(),
        })
    }
}

// ── Temperature sensor ────────────────────────────────────────

#[derive(Default)]
pub struct SensorState {
    /// Readings in °C, consumed one per sample; the last one repeats.
    pub readings: VecDeque<Result<f64, SensorError>>,
    pub samples: usize,
    pub closed: bool,
    pub fail_close: bool,
    pub journal: Journal,
}

#[derive(Clone, Default)]
pub struct MockSensor(pub Rc<RefCell<SensorState>>);

impl MockSensor {
    pub fn reading(celsius: f64) -> Self {
        let s = Self::default();
        s.0.borrow_mut().readings.push_back(Ok(celsius));
        s
    }

    pub fn script(readings: impl IntoIterator<Item = Result<f64, SensorError>>) -> Self {
        let s = Self::default();
        s.0.borrow_mut().readings.extend(readings);
        s
    }

    pub fn set(&self, celsius: f64) {
        let mut s = self.0.borrow_mut();
        s.readings.clear();
        s.readings.push_back(Ok(celsius));
    }
}

impl TemperatureSensor for MockSensor {
    fn sample_raw(&mut self) -> Result<[u8; 2], SensorError> {
        let mut s = self.0.borrow_mut();
        if s.closed {
            return Err(SensorError::Closed);
        }
        s.samples += 1;
        let next = if s.readings.len() > 1 {
            s.readings.pop_front()
        } else {
            s.readings.front().copied()
        };
        next.unwrap_or(Ok(20.0)).map(from_celsius)
    }

    fn close(&mut self) -> Result<(), SensorError> {
        let mut s = self.0.borrow_mut();
        s.closed = true;
        s.journal.borrow_mut().push("sensor");
        if s.fail_close {
            return Err(SensorError::SpiTransferFailed);
        }
        Ok(())
    }
}

// ── Telemetry sink ────────────────────────────────────────────

#[derive(Default)]
pub struct SinkState {
    pub points: Vec<TelemetryPoint>,
    pub closed: bool,
    pub fail_close: bool,
    pub journal: Journal,
}

#[derive(Clone, Default)]
pub struct MemorySink(pub Rc<RefCell<SinkState>>);

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self, sensor: SensorId, stream: Stream) -> Vec<TelemetryPoint> {
        self.0
            .borrow()
            .points
            .iter()
            .copied()
            .filter(|p| p.sensor == sensor && p.stream == stream)
            .collect()
    }
}

impl TelemetrySink for MemorySink {
    fn append(&mut self, point: &TelemetryPoint) -> Result<(), StorageError> {
        self.0.borrow_mut().points.push(*point);
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        let mut s = self.0.borrow_mut();
        s.closed = true;
        s.journal.borrow_mut().push("sink");
        if s.fail_close {
            return Err(StorageError::Io(io::Error::other("database is locked")));
        }
        Ok(())
    }
}

// ── Clock ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ManualClock(pub Rc<Cell<f64>>);

impl ManualClock {
    pub fn at(now: f64) -> Self {
        Self(Rc::new(Cell::new(now)))
    }

    pub fn advance(&self, secs: f64) {
        self.0.set(self.0.get() + secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.0.get()
    }
}

// ── Control socket ────────────────────────────────────────────

/// Connection fed from a fixed request; the reply lands in `output`.
pub struct MockConn {
    input: io::Cursor<Vec<u8>>,
    pub output: Rc<RefCell<Vec<u8>>>,
    pub closed: Rc<Cell<bool>>,
}

impl Read for MockConn {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for MockConn {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Connection for MockConn {
    fn set_read_timeout(&mut self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed.set(true);
        Ok(())
    }
}

/// What a client sees of one scripted connection.
pub struct ClientView {
    output: Rc<RefCell<Vec<u8>>>,
    closed: Rc<Cell<bool>>,
}

impl ClientView {
    pub fn reply(&self) -> String {
        String::from_utf8(self.output.borrow().clone()).unwrap()
    }

    pub fn closed(&self) -> bool {
        self.closed.get()
    }
}

#[derive(Default)]
pub struct ServerState {
    pub pending: VecDeque<MockConn>,
    pub accept_error: Option<io::ErrorKind>,
    pub closed: bool,
    pub journal: Journal,
}

#[derive(Clone, Default)]
pub struct MockServer(pub Rc<RefCell<ServerState>>);

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a client that will send `request`.
    pub fn connect(&self, request: &str) -> ClientView {
        let output = Rc::new(RefCell::new(Vec::new()));
        let closed = Rc::new(Cell::new(false));
        self.0.borrow_mut().pending.push_back(MockConn {
            input: io::Cursor::new(request.as_bytes().to_vec()),
            output: Rc::clone(&output),
            closed: Rc::clone(&closed),
        });
        ClientView { output, closed }
    }

    pub fn fail_accept(&self, kind: io::ErrorKind) {
        self.0.borrow_mut().accept_error = Some(kind);
    }
}

impl ControlServer for MockServer {
    type Conn = MockConn;

    fn accept(&mut self) -> io::Result<Option<MockConn>> {
        let mut s = self.0.borrow_mut();
        if let Some(kind) = s.accept_error {
            return Err(io::Error::new(kind, "accept failed"));
        }
        Ok(s.pending.pop_front())
    }

    fn close(&mut self) -> io::Result<()> {
        let mut s = self.0.borrow_mut();
        s.closed = true;
        s.journal.borrow_mut().push("server");
        Ok(())
    }
}
