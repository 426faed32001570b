//! autoboiler library.
//!
//! Protocol and control-loop engine for a radio-linked boiler controller:
//! the Controller node serves a line protocol on a local socket, schedules
//! boost actions and logs smoothed temperatures; the Boiler node switches
//! relays on command and reports its temperature.  Hardware is reached
//! only through the port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod radio;
pub mod rpc;
pub mod scheduler;
pub mod sensors;
