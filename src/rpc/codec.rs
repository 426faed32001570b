//! Newline-terminated line codec.
//!
//! Wire format:
//! ```text
//! ┌──────────────────────────────┬────┐
//! │ UTF-8 request text (≤1023 B) │ \n │
//! └──────────────────────────────┴────┘
//! ```
//!
//! The decoder accumulates incoming bytes and yields the first complete
//! line.  A single `read` may return part of a line, or a line followed
//! by bytes that belong to nobody (one request per connection, so they
//! are discarded).  A peer that closes without a newline still gets its
//! partial line treated as the request.

use std::io::{ErrorKind, Read};

use heapless::Vec;

use crate::error::RequestError;

/// Longest accepted line, newline excluded.
pub const MAX_LINE: usize = 1023;

/// Streaming line decoder.
#[derive(Default)]
pub struct LineDecoder {
    buf: Vec<u8, MAX_LINE>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the decoder.
    ///
    /// Returns `Ok(Some(line))` once a newline arrives.  The trailing
    /// `\n` (and a `\r` before it) are stripped.
    pub fn feed(&mut self, data: &[u8]) -> Result<Option<String>, RequestError> {
        for &byte in data {
            if byte == b'\n' {
                return self.take().map(Some);
            }
            self.buf
                .push(byte)
                .map_err(|_| RequestError::LineTooLong(MAX_LINE))?;
        }
        Ok(None)
    }

    /// End of input: whatever was buffered is the line.
    pub fn finish(&mut self) -> Result<String, RequestError> {
        if self.buf.is_empty() {
            return Err(RequestError::Incomplete);
        }
        self.take()
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    fn take(&mut self) -> Result<String, RequestError> {
        let mut bytes = core::mem::take(&mut self.buf);
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        String::from_utf8(bytes.to_vec()).map_err(|_| RequestError::NotUtf8)
    }
}

/// Read one line from a blocking reader.
///
/// End of input after some bytes arrived yields the partial line.  A read
/// timeout is always [`RequestError::Incomplete`]: a stalled client's
/// unterminated text is never run as a request.
pub fn read_line<R: Read>(reader: &mut R) -> Result<String, RequestError> {
    let mut decoder = LineDecoder::new();
    let mut chunk = [0u8; 256];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => return decoder.finish(),
            Ok(n) => {
                if let Some(line) = decoder.feed(&chunk[..n])? {
                    return Ok(line);
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(_) => return Err(RequestError::Incomplete),
        }
    }
}
