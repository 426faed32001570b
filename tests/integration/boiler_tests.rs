//! Integration tests for the Boiler loop: radio commands, button presses
//! and the temperature report, driven through mock adapters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use autoboiler::app::boiler::{Boiler, BoilerParts, BoilerSettings};
use autoboiler::drivers::button::ButtonInputs;
use autoboiler::error::{Error, SensorError};
use autoboiler::events::ButtonQueue;
use autoboiler::radio::command::Command;
use autoboiler::sensors::temperature::from_celsius;

use super::mock_hw::{MockRadio, MockRelays, MockSensor, RadioCall};

struct Rig {
    radio: MockRadio,
    relays: MockRelays,
    sensor: MockSensor,
    buttons: Arc<ButtonQueue>,
    boiler: Boiler<MockRadio, MockRelays, MockSensor>,
}

fn rig_with(sensor: MockSensor) -> Rig {
    let radio = MockRadio::new();
    let relays = MockRelays::new(2);
    let buttons = Arc::new(ButtonQueue::new());
    let boiler = Boiler::new(
        BoilerParts {
            radio: radio.clone(),
            relays: relays.clone(),
            sensor: sensor.clone(),
            buttons: Arc::clone(&buttons),
        },
        BoilerSettings {
            listen_timeout: Duration::from_millis(10),
            poll_interval: Duration::from_millis(1),
        },
    );
    Rig {
        radio,
        relays,
        sensor,
        buttons,
        boiler,
    }
}

fn rig() -> Rig {
    rig_with(MockSensor::reading(60.0))
}

fn cycle(r: &mut Rig) -> autoboiler::app::boiler::CycleReport {
    let report = r.boiler.run_cycle(&AtomicBool::new(false)).unwrap();
    assert!(!r.radio.is_listening());
    report
}

#[test]
fn radio_command_switches_relay_and_reports_temperature() {
    let mut r = rig();
    r.radio.push_frame(&[Command::set(1, true).encode()]);
    let report = cycle(&mut r);

    assert_eq!(report.commands, vec![0x05]);
    assert!(report.telemetry_acked);
    assert_eq!(r.relays.states(), vec![false, true]);
    assert_eq!(r.radio.writes(), vec![from_celsius(60.0).to_vec()]);
}

#[test]
fn query_is_answered_before_temperature() {
    let mut r = rig();
    r.relays.0.borrow_mut()[1] = true;
    r.radio.push_frame(&[Command::query(1).encode(), Command::query(0).encode()]);
    cycle(&mut r);

    assert_eq!(
        r.radio.writes(),
        vec![vec![1], vec![0], from_celsius(60.0).to_vec()]
    );
}

#[test]
fn empty_receive_still_reports_temperature() {
    let mut r = rig();
    let report = cycle(&mut r);
    assert!(report.commands.is_empty());
    assert_eq!(
        r.radio.calls(),
        vec![
            RadioCall::StartListening,
            RadioCall::StopListening,
            RadioCall::Write(from_celsius(60.0).to_vec()),
        ]
    );
}

#[test]
fn button_presses_drive_channel_zero() {
    let mut r = rig();
    r.buttons.push(1);
    cycle(&mut r);
    assert_eq!(r.relays.states(), vec![true, false]);

    r.buttons.push(0);
    let report = cycle(&mut r);
    assert_eq!(report.commands, vec![Command::set(0, false).encode()]);
    assert_eq!(r.relays.states(), vec![false, false]);
}

#[test]
fn buttons_follow_radio_bytes_in_one_buffer() {
    let mut r = rig();
    r.radio.push_frame(&[Command::set(0, false).encode()]);
    r.buttons.push(1);
    let report = cycle(&mut r);
    assert_eq!(report.commands, vec![0x00, 0x01]);
    assert_eq!(r.relays.states(), vec![true, false]);
}

#[test]
fn debounced_edges_reach_the_relays() {
    let mut r = rig();
    let inputs = ButtonInputs::new(
        vec![23, 24],
        Duration::from_millis(500),
        Arc::clone(&r.buttons),
    );
    assert!(inputs.on_falling_edge_at(24, 0));
    assert!(!inputs.on_falling_edge_at(24, 100));
    cycle(&mut r);
    assert_eq!(r.relays.states(), vec![true, false]);

    assert!(inputs.on_falling_edge_at(23, 200));
    cycle(&mut r);
    assert_eq!(r.relays.states(), vec![false, false]);
}

#[test]
fn out_of_range_pin_does_not_stop_the_buffer() {
    let mut r = rig();
    r.radio.push_frame(&[
        Command::set(9, true).encode(),
        Command::query(9).encode(),
        Command::set(1, true).encode(),
    ]);
    cycle(&mut r);
    assert_eq!(r.relays.states(), vec![false, true]);
    assert_eq!(r.radio.writes().len(), 1, "only the temperature frame");
}

#[test]
fn missing_ack_is_not_an_error() {
    let mut r = rig();
    r.radio.0.borrow_mut().nack_all = true;
    let report = cycle(&mut r);
    assert!(!report.telemetry_acked);
}

#[test]
fn sensor_failure_fails_only_that_cycle() {
    let mut r = rig_with(MockSensor::script([
        Err(SensorError::SpiTransferFailed),
        Ok(61.0),
    ]));
    r.radio.push_frame(&[Command::set(0, true).encode()]);
    let err = r.boiler.run_cycle(&AtomicBool::new(false)).unwrap_err();
    assert!(matches!(err, Error::Sensor(SensorError::SpiTransferFailed)));
    assert_eq!(r.relays.states(), vec![true, false], "commands ran first");

    let report = cycle(&mut r);
    assert!(report.telemetry_acked);
    assert_eq!(r.radio.writes(), vec![from_celsius(61.0).to_vec()]);
}

#[test]
fn run_survives_failing_cycles_until_shutdown() {
    let sensor = MockSensor::script([Err(SensorError::SpiTransferFailed)]);
    let mut r = rig_with(sensor);
    let shutdown = Arc::new(AtomicBool::new(false));
    let stopper = {
        let shutdown = Arc::clone(&shutdown);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(60));
            shutdown.store(true, Ordering::Relaxed);
        })
    };
    r.boiler.run(&shutdown);
    stopper.join().unwrap();
    assert!(r.sensor.0.borrow().samples >= 2);
}

#[test]
fn teardown_closes_radio_and_sensor() {
    let mut r = rig();
    r.radio.0.borrow_mut().fail_end = true;
    let failures = r.boiler.teardown();
    assert_eq!(failures.len(), 1);
    assert_eq!(r.radio.calls(), vec![RadioCall::End]);
    assert!(r.sensor.0.borrow().closed);
}
