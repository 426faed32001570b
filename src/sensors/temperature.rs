//! Microchip TC77 SPI thermometer.
//!
//! The TC77 clocks out a 16-bit word: a 13-bit two's-complement reading in
//! bits 15..3, a conversion-complete flag in bit 2, and two undefined bits.
//! One LSB is 0.0625 °C.
//!
//! ## Dual-target design
//!
//! The driver is generic over [`embedded_hal::spi::SpiDevice`], so the same
//! code runs against a Linux spidev binding on the node or the simulated
//! bus in [`adapters::sim`](crate::adapters::sim) on the host.

use embedded_hal::spi::SpiDevice;
use log::debug;

use crate::app::ports::TemperatureSensor;
use crate::error::SensorError;

/// °C per LSB of the 13-bit reading.
const LSB_CELSIUS: f64 = 0.0625;

/// Conversion-complete flag (bit 2).
const CONVERSION_DONE: u16 = 0b100;

/// Convert a raw TC77 word (big-endian, as clocked out) to °C.
pub fn to_celsius(raw: [u8; 2]) -> f64 {
    let word = i16::from_be_bytes(raw);
    f64::from(word >> 3) * LSB_CELSIUS
}

/// Inverse of [`to_celsius`], rounded down to the sensor resolution.
/// Used by the simulated bus and by tests.
pub fn from_celsius(celsius: f64) -> [u8; 2] {
    let counts = (celsius / LSB_CELSIUS).floor() as i16;
    let word = ((counts << 3) as u16) | CONVERSION_DONE;
    word.to_be_bytes()
}

/// TC77 on an SPI device.
pub struct Tc77<SPI> {
    spi: Option<SPI>,
}

impl<SPI: SpiDevice> Tc77<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi: Some(spi) }
    }
}

impl<SPI: SpiDevice> TemperatureSensor for Tc77<SPI> {
    fn sample_raw(&mut self) -> Result<[u8; 2], SensorError> {
        let spi = self.spi.as_mut().ok_or(SensorError::Closed)?;
        let mut buf = [0u8; 2];
        spi.transfer_in_place(&mut buf)
            .map_err(|_| SensorError::SpiTransferFailed)?;
        debug!("TC77 raw {:02x}{:02x}", buf[0], buf[1]);
        Ok(buf)
    }

    fn close(&mut self) -> Result<(), SensorError> {
        // Dropping the device releases the chip-select and bus handle.
        self.spi.take().map(drop).ok_or(SensorError::Closed)
    }
}
