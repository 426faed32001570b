//! Control-socket transport.
//!
//! The Controller polls its server once per cycle with a non-blocking
//! accept.  "No pending connection" is `Ok(None)`; any other error is
//! fatal to the node.
//!
//! The node serves a Unix domain stream socket ([`UnixControlServer`]);
//! tests substitute in-memory servers behind the same traits.

use std::fs;
use std::io::{self, ErrorKind, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};

/// One accepted client connection.
pub trait Connection: Read + Write {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Shut both directions down.  Dropping the connection also closes it.
    fn close(&mut self) -> io::Result<()>;
}

impl Connection for UnixStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        UnixStream::set_read_timeout(self, timeout)
    }

    fn close(&mut self) -> io::Result<()> {
        match self.shutdown(std::net::Shutdown::Both) {
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

/// Listening side of the control socket.
pub trait ControlServer {
    type Conn: Connection;

    /// Non-blocking accept.
    fn accept(&mut self) -> io::Result<Option<Self::Conn>>;

    /// Stop listening and release the endpoint.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Unix-domain stream socket at a filesystem path.
pub struct UnixControlServer {
    listener: Option<UnixListener>,
    path: PathBuf,
}

impl UnixControlServer {
    /// Bind at `path`, replacing a stale socket file left by a previous
    /// run, and apply `mode` to the socket file.
    pub fn bind(path: impl AsRef<Path>, mode: u32) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        match fs::remove_file(&path) {
            Ok(()) => debug!("removed stale socket {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        let listener = UnixListener::bind(&path)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(mode))?;
        listener.set_nonblocking(true)?;
        info!("control socket listening on {}", path.display());
        Ok(Self {
            listener: Some(listener),
            path,
        })
    }
}

impl ControlServer for UnixControlServer {
    type Conn = UnixStream;

    fn accept(&mut self) -> io::Result<Option<UnixStream>> {
        let Some(listener) = self.listener.as_ref() else {
            return Ok(None);
        };
        match listener.accept() {
            Ok((stream, _)) => {
                // Accepted sockets inherit non-blocking mode on some platforms.
                stream.set_nonblocking(false)?;
                Ok(Some(stream))
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        if self.listener.take().is_none() {
            return Ok(());
        }
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

impl Drop for UnixControlServer {
    fn drop(&mut self) {
        let _ = ControlServer::close(self);
    }
}
