//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one node loop or the
//! control socket against mock adapters.  All tests run on the host with
//! no radio, GPIO or SPI hardware required.

mod boiler_tests;
mod mock_hw;
mod socket_tests;
