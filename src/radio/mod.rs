//! Radio link: command byte framing, channel addressing and the
//! half-duplex listen/transmit discipline.

pub mod command;
pub mod link;

use core::fmt;

use crate::error::RequestError;

/// nRF24L01 dynamic payload limit.
pub const MAX_PAYLOAD: usize = 32;

/// One radio frame.
pub type Frame = heapless::Vec<u8, MAX_PAYLOAD>;

/// A relay channel as the control protocol addresses it.
///
/// On the wire a non-negative pin is a Boiler channel reached over the
/// radio, and `-(index + 1)` is channel `index` on the Controller's own
/// bank (so `-1` is local relay 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Local(usize),
    Remote(u8),
}

impl Channel {
    pub fn from_wire(pin: i64) -> Result<Self, RequestError> {
        if pin < 0 {
            // -(pin + 1) cannot overflow for any negative i64.
            usize::try_from(-(pin + 1))
                .map(Self::Local)
                .map_err(|_| RequestError::PinOutOfRange(pin))
        } else if pin <= i64::from(command::MAX_PIN) {
            Ok(Self::Remote(pin as u8))
        } else {
            Err(RequestError::PinOutOfRange(pin))
        }
    }

    pub fn to_wire(self) -> i64 {
        match self {
            Self::Local(index) => -(index as i64) - 1,
            Self::Remote(pin) => i64::from(pin),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_wire())
    }
}
