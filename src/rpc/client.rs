//! One-shot control-socket client.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use super::request::Reply;

/// Send `line` to the Controller at `path` and wait for its reply.
///
/// A missing trailing newline is added.  The read ends when the server
/// closes the connection or `timeout` passes.
pub fn send_request(path: impl AsRef<Path>, line: &str, timeout: Duration) -> io::Result<Reply> {
    let mut stream = UnixStream::connect(path)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    stream.write_all(line.as_bytes())?;
    if !line.ends_with('\n') {
        stream.write_all(b"\n")?;
    }
    stream.flush()?;

    let mut response = String::new();
    stream.read_to_string(&mut response)?;
    if response.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "controller closed the connection without replying",
        ));
    }
    Ok(Reply::from_line(&response))
}
