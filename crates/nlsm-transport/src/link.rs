use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// A connected serial link — implements Read + Write.
///
/// This is the fundamental I/O type returned by transport operations.
/// It wraps either a raw-mode TTY device or one end of an in-process
/// loopback pair (used by tests and demos).
pub struct SerialLink {
    inner: LinkInner,
    read_timeout: Option<Duration>,
}

enum LinkInner {
    #[cfg(unix)]
    Tty(std::fs::File),
    #[cfg(unix)]
    Loopback(std::os::unix::net::UnixStream),
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkInner::Tty(file) => {
                if !wait_readable(file, self.read_timeout)? {
                    return Err(std::io::Error::from(std::io::ErrorKind::TimedOut));
                }
                file.read(buf)
            }
            #[cfg(unix)]
            LinkInner::Loopback(stream) => stream.read(buf),
        }
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkInner::Tty(file) => file.write(buf),
            #[cfg(unix)]
            LinkInner::Loopback(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkInner::Tty(file) => file.flush(),
            #[cfg(unix)]
            LinkInner::Loopback(stream) => stream.flush(),
        }
    }
}

impl SerialLink {
    /// Create a SerialLink from an already-configured TTY device file.
    #[cfg(unix)]
    pub(crate) fn from_tty(file: std::fs::File, read_timeout: Option<Duration>) -> Self {
        Self {
            inner: LinkInner::Tty(file),
            read_timeout,
        }
    }

    /// Create a connected loopback pair.
    ///
    /// Bytes written to one end are read from the other. Each end is
    /// full-duplex, like a serial line with TX and RX crossed over.
    #[cfg(unix)]
    pub fn pair() -> Result<(Self, Self)> {
        let (a, b) = std::os::unix::net::UnixStream::pair()?;
        Ok((Self::from_loopback(a), Self::from_loopback(b)))
    }

    #[cfg(unix)]
    fn from_loopback(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: LinkInner::Loopback(stream),
            read_timeout: None,
        }
    }

    /// Set the read timeout. `None` blocks indefinitely.
    ///
    /// A read that times out fails with [`std::io::ErrorKind::TimedOut`]
    /// (or `WouldBlock` on some platforms); the framing layer treats both
    /// as end-of-stream.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            LinkInner::Tty(_) => {
                self.read_timeout = timeout;
                Ok(())
            }
            #[cfg(unix)]
            LinkInner::Loopback(stream) => {
                stream.set_read_timeout(timeout)?;
                self.read_timeout = timeout;
                Ok(())
            }
        }
    }

    /// The currently configured read timeout.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Try to clone this link (creates a new file descriptor).
    ///
    /// Useful for concurrent encode and decode on a full-duplex line: one
    /// handle reads while the other writes. The clone shares the device but
    /// carries its own read timeout.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(unix)]
            LinkInner::Tty(file) => {
                let cloned = file.try_clone()?;
                Ok(Self::from_tty(cloned, self.read_timeout))
            }
            #[cfg(unix)]
            LinkInner::Loopback(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self {
                    inner: LinkInner::Loopback(cloned),
                    read_timeout: self.read_timeout,
                })
            }
        }
    }
}

/// Block until the descriptor is readable or the timeout elapses.
///
/// Returns `Ok(false)` on timeout. A `None` timeout waits indefinitely.
#[cfg(unix)]
fn wait_readable(file: &std::fs::File, timeout: Option<Duration>) -> std::io::Result<bool> {
    use std::os::fd::AsRawFd;

    let millis = match timeout {
        None => -1,
        Some(d) => i32::try_from(d.as_millis()).unwrap_or(i32::MAX),
    };

    let mut pollfd = libc::pollfd {
        fd: file.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };

    // SAFETY: `pollfd` is a valid writable pointer to exactly one entry and
    // the descriptor is owned by `file` for the duration of the call.
    let rc = unsafe { libc::poll(&mut pollfd, 1, millis) };
    if rc < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(rc > 0)
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.inner {
            #[cfg(unix)]
            LinkInner::Tty(_) => "tty",
            #[cfg(unix)]
            LinkInner::Loopback(_) => "loopback",
        };
        f.debug_struct("SerialLink")
            .field("type", &kind)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_pair_carries_bytes_both_ways() {
        let (mut a, mut b) = SerialLink::pair().unwrap();

        a.write_all(b"ping").unwrap();
        let mut buf = [0u8; 4];
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");

        b.write_all(b"pong").unwrap();
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"pong");
    }

    #[test]
    fn loopback_read_timeout_surfaces_as_io_error() {
        let (mut a, _b) = SerialLink::pair().unwrap();
        a.set_read_timeout(Some(Duration::from_millis(20))).unwrap();

        let mut buf = [0u8; 1];
        let err = a.read(&mut buf).unwrap_err();
        assert!(matches!(
            err.kind(),
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
        ));
    }

    #[test]
    fn try_clone_gives_independent_handles() {
        let (a, mut b) = SerialLink::pair().unwrap();
        let mut writer = a.try_clone().unwrap();
        let mut reader = a;

        writer.write_all(b"x").unwrap();
        let mut buf = [0u8; 1];
        b.read_exact(&mut buf).unwrap();
        assert_eq!(buf[0], b'x');

        b.write_all(b"y").unwrap();
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf[0], b'y');
    }

    #[test]
    fn debug_names_link_type() {
        let (a, _b) = SerialLink::pair().unwrap();
        let rendered = format!("{a:?}");
        assert!(rendered.contains("loopback"));
    }
}
