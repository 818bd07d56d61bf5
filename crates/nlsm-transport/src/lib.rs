//! Serial-link byte transport.
//!
//! Provides the byte-oriented stream the NLSM framing layer reads from and
//! writes to:
//! - TTY devices configured for raw binary I/O (Unix)
//! - In-process loopback links for tests and demos
//!
//! This is the lowest layer of nlsm. Everything else builds on top of the
//! [`SerialLink`] type provided here.

pub mod error;
pub mod link;

#[cfg(unix)]
pub mod port;

pub use error::{Result, TransportError};
pub use link::SerialLink;

#[cfg(unix)]
pub use port::{available_ports, open_port, PortConfig, DEFAULT_BAUD_RATE};
