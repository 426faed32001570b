//! Application core: the two control loops and their ports.
//!
//! Both loops own their hardware exclusively and reach it only through
//! the **port traits** in [`ports`], so every loop is testable against
//! mock adapters with no radio, GPIO or SPI present.

pub mod boiler;
pub mod controller;
pub mod ports;
