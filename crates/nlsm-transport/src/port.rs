use std::fs::OpenOptions;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::link::SerialLink;

/// Default baud rate when none is configured.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial port configuration.
///
/// The device path is explicit and required — there is no implicit
/// "first available port" fallback. Use [`available_ports`] to discover
/// candidate devices and pick one.
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub path: PathBuf,
    /// Line speed in baud. Default: 115200.
    pub baud_rate: u32,
    /// Read timeout applied to the opened link. `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,
}

impl PortConfig {
    /// Configuration for `path` with default baud rate and no timeout.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: None,
        }
    }
}

/// Open a serial device and configure it for raw binary I/O.
///
/// Applies `cfmakeraw` (no line discipline, no echo, 8-bit characters),
/// sets the configured baud rate in both directions, and arranges for
/// reads to deliver single bytes as they arrive (VMIN=1, VTIME=0).
pub fn open_port(config: &PortConfig) -> Result<SerialLink> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&config.path)
        .map_err(|e| TransportError::Open {
            path: config.path.clone(),
            source: e,
        })?;

    configure_raw(&file, config)?;

    info!(path = ?config.path, baud = config.baud_rate, "opened serial port");
    Ok(SerialLink::from_tty(file, config.read_timeout))
}

fn configure_raw(file: &std::fs::File, config: &PortConfig) -> Result<()> {
    let fd = file.as_raw_fd();
    let speed = baud_constant(config.baud_rate)?;

    // SAFETY: `termios` is a plain-old-data struct and `fd` is an open
    // descriptor owned by `file`; tcgetattr fills the struct on success.
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let rc = unsafe { libc::tcgetattr(fd, &mut termios) };
    if rc != 0 {
        return Err(open_error(&config.path));
    }

    // SAFETY: `termios` is valid and initialized by tcgetattr above.
    unsafe {
        libc::cfmakeraw(&mut termios);
        libc::cfsetispeed(&mut termios, speed);
        libc::cfsetospeed(&mut termios, speed);
    }

    // Deliver each byte as soon as it arrives; timeouts are handled by
    // poll(2) in the link layer, not by VTIME.
    termios.c_cc[libc::VMIN] = 1;
    termios.c_cc[libc::VTIME] = 0;

    // SAFETY: same descriptor and struct as above.
    let rc = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if rc != 0 {
        return Err(open_error(&config.path));
    }

    debug!(path = ?config.path, "configured raw tty mode");
    Ok(())
}

fn open_error(path: &Path) -> TransportError {
    TransportError::Open {
        path: path.to_path_buf(),
        source: std::io::Error::last_os_error(),
    }
}

fn baud_constant(baud: u32) -> Result<libc::speed_t> {
    let speed = match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115_200 => libc::B115200,
        230_400 => libc::B230400,
        other => return Err(TransportError::UnsupportedBaudRate(other)),
    };
    Ok(speed)
}

/// Device name prefixes that look like serial ports.
///
/// Covers built-in UARTs (ttyS, ttyAMA), USB adapters (ttyUSB, ttyACM)
/// and macOS callout devices (cu.).
const PORT_PREFIXES: &[&str] = &["ttyS", "ttyUSB", "ttyACM", "ttyAMA", "cu."];

/// Enumerate serial-style devices under `/dev`.
///
/// Returns the matching device paths sorted by name. Enumeration is a
/// query only — opening a port is always an explicit, separate step.
pub fn available_ports() -> Result<Vec<PathBuf>> {
    available_ports_in(Path::new("/dev"))
}

fn available_ports_in(dev: &Path) -> Result<Vec<PathBuf>> {
    let mut ports = Vec::new();
    let entries = std::fs::read_dir(dev).map_err(TransportError::Enumerate)?;

    for entry in entries {
        let entry = entry.map_err(TransportError::Enumerate)?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if PORT_PREFIXES.iter().any(|p| name.starts_with(p)) {
            ports.push(entry.path());
        }
    }

    ports.sort();
    debug!(count = ports.len(), "enumerated serial ports");
    Ok(ports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_default_baud() {
        let cfg = PortConfig::new("/dev/ttyUSB0");
        assert_eq!(cfg.baud_rate, DEFAULT_BAUD_RATE);
        assert!(cfg.read_timeout.is_none());
    }

    #[test]
    fn unsupported_baud_is_rejected() {
        let cfg = PortConfig {
            baud_rate: 31_337,
            ..PortConfig::new("/dev/null")
        };
        let err = open_port(&cfg).unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedBaudRate(31_337)));
    }

    #[test]
    fn open_missing_device_reports_path() {
        let cfg = PortConfig::new("/dev/nlsm-does-not-exist");
        let err = open_port(&cfg).unwrap_err();
        match err {
            TransportError::Open { path, .. } => {
                assert_eq!(path, PathBuf::from("/dev/nlsm-does-not-exist"));
            }
            other => panic!("expected Open error, got {other}"),
        }
    }

    #[test]
    fn open_non_tty_fails_to_configure() {
        // /dev/null opens fine but is not a terminal, so tcgetattr fails.
        let cfg = PortConfig::new("/dev/null");
        let err = open_port(&cfg).unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
    }

    #[test]
    fn enumeration_filters_on_name_prefix() {
        let dir = std::env::temp_dir().join(format!("nlsm-ports-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ttyUSB0"), b"").unwrap();
        std::fs::write(dir.join("ttyACM3"), b"").unwrap();
        std::fs::write(dir.join("sda1"), b"").unwrap();

        let ports = available_ports_in(&dir).unwrap();
        let names: Vec<_> = ports
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["ttyACM3", "ttyUSB0"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn enumeration_of_missing_dir_is_an_error() {
        let err = available_ports_in(Path::new("/nlsm-no-such-dir")).unwrap_err();
        assert!(matches!(err, TransportError::Enumerate(_)));
    }
}
