//! NewLine Serialization Method (NLSM).
//!
//! nlsm frames an unstructured serial byte stream into discrete packets
//! using a SLIP-like byte-stuffing scheme: reserved delimiter bytes in the
//! payload are replaced by two-byte escape sequences, and each frame ends
//! with a single unescaped END (0x0A) byte.
//!
//! # Crate Structure
//!
//! - [`transport`] — Serial-link byte transport (TTY config, timeouts,
//!   port enumeration, loopback pairs)
//! - [`frame`] — The NLSM codec: encoder, incremental decoder, and
//!   `FrameReader`/`FrameWriter` stream adapters

/// Re-export transport types.
pub mod transport {
    pub use nlsm_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use nlsm_frame::*;
}
