//! Single-byte radio command encoding.
//!
//! ```text
//!   bit  7 6 5 4 3 2   1       0
//!       ┌───────────┬───────┬───────┐
//!       │ pin (0-63)│ query │ state │
//!       └───────────┴───────┴───────┘
//! ```
//!
//! A query asks the Boiler to reply with one byte holding the relay state
//! for `pin`; otherwise the Boiler switches relay `pin` to `state`.

/// Highest channel index a command byte can address.
pub const MAX_PIN: u8 = 63;

/// Boiler→Controller telemetry frame length (raw TC77 reading).
pub const TELEMETRY_FRAME_LEN: usize = 2;

/// Boiler→Controller query reply length.
pub const QUERY_REPLY_LEN: usize = 1;

/// Decoded form of a command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    pub pin: u8,
    pub query: bool,
    pub state: bool,
}

impl Command {
    /// Switch `pin` on or off. `pin` is masked to 6 bits.
    pub const fn set(pin: u8, on: bool) -> Self {
        Self {
            pin: pin & MAX_PIN,
            query: false,
            state: on,
        }
    }

    /// Ask for the current state of `pin`.
    pub const fn query(pin: u8) -> Self {
        Self {
            pin: pin & MAX_PIN,
            query: true,
            state: false,
        }
    }

    /// `pin << 2 | query << 1 | state`
    pub const fn encode(self) -> u8 {
        ((self.pin & MAX_PIN) << 2) | ((self.query as u8) << 1) | (self.state as u8)
    }

    pub const fn decode(byte: u8) -> Self {
        Self {
            pin: byte >> 2,
            query: (byte >> 1) & 1 == 1,
            state: byte & 1 == 1,
        }
    }
}

impl From<u8> for Command {
    fn from(byte: u8) -> Self {
        Self::decode(byte)
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> Self {
        cmd.encode()
    }
}
