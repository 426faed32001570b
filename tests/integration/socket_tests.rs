//! End-to-end tests over a real Unix-domain control socket: a client
//! thread speaks the line protocol while the Controller loop runs on the
//! test thread against mock radio and relays.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::thread::JoinHandle;
use std::time::Duration;

use autoboiler::app::controller::{Controller, ControllerParts, ControllerSettings};
use autoboiler::rpc::client::send_request;
use autoboiler::rpc::request::Reply;
use autoboiler::rpc::transport::UnixControlServer;

use super::mock_hw::{ManualClock, MemorySink, MockRadio, MockRelays, MockSensor};

type SocketController =
    Controller<MockRadio, MockRelays, MockSensor, MemorySink, ManualClock, UnixControlServer>;

fn socket_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("autoboiler-e2e-{}-{}.sock", name, std::process::id()))
}

fn controller(path: &PathBuf, radio: MockRadio, relays: MockRelays) -> SocketController {
    let server = UnixControlServer::bind(path, 0o600).unwrap();
    Controller::new(
        ControllerParts {
            radio,
            relays,
            sensor: MockSensor::reading(20.0),
            sink: MemorySink::new(),
            clock: ManualClock::at(1000.0),
            server,
        },
        ControllerSettings {
            listen_timeout: Duration::from_millis(20),
            query_timeout: Duration::from_millis(50),
            client_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(1),
            min_sample_interval: Duration::ZERO,
        },
    )
}

fn spawn_client(path: &PathBuf, line: &'static str) -> JoinHandle<Reply> {
    let path = path.clone();
    std::thread::spawn(move || send_request(&path, line, Duration::from_secs(5)).unwrap())
}

/// Cycle the controller until the client thread has its reply.
fn serve_until_done(c: &mut SocketController, client: JoinHandle<Reply>) -> Reply {
    let shutdown = AtomicBool::new(false);
    for _ in 0..500 {
        if client.is_finished() {
            break;
        }
        c.run_cycle(&shutdown).unwrap();
    }
    client.join().unwrap()
}

#[test]
fn on_three_round_trip_ok_and_timed_out() {
    let path = socket_path("on3");
    let radio = MockRadio::new();
    let mut c = controller(&path, radio.clone(), MockRelays::new(2));

    let reply = serve_until_done(&mut c, spawn_client(&path, "on 3\n"));
    assert_eq!(reply, Reply::Ok(String::new()));
    assert_eq!(radio.writes(), vec![vec![0x0D]]);

    radio.0.borrow_mut().nack_all = true;
    let reply = serve_until_done(&mut c, spawn_client(&path, "on 3"));
    assert_eq!(reply, Reply::TimedOut);

    c.teardown();
    assert!(!path.exists(), "socket file removed on teardown");
}

#[test]
fn boost_then_queryactions_over_socket() {
    let path = socket_path("boost");
    let relays = MockRelays::new(2);
    let mut c = controller(&path, MockRadio::new(), relays.clone());

    let reply = serve_until_done(&mut c, spawn_client(&path, "boost -2 time 30\n"));
    assert!(reply.is_ok());
    assert_eq!(relays.states(), vec![false, true]);

    let reply = serve_until_done(&mut c, spawn_client(&path, "queryactions\n"));
    assert_eq!(reply, Reply::Ok("[(time, 1030, -2, off)]".into()));

    let reply = serve_until_done(&mut c, spawn_client(&path, "boost -2 nonsense 1\n"));
    assert!(matches!(reply, Reply::Invalid(_)));
    c.teardown();
}
