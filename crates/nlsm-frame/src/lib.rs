//! NLSM byte-stuffed packet framing for serial byte streams.
//!
//! This is the core value-add layer of nlsm. An arbitrary byte packet is
//! escaped so that the frame delimiter never appears in the payload
//! position, then terminated with a single unescaped END byte:
//! - END (0x0A) in the payload becomes ESC ESC_END
//! - ESC (0x0B) in the payload becomes ESC ESC_ESC
//! - one unescaped END closes the frame
//!
//! No length prefixes, no checksums, no channels — NLSM only solves
//! byte-stream-to-packet framing.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    encode_packet, DecodedPacket, FrameConfig, FrameEnd, NlsmDecoder, Packet, END, ESC, ESC_END,
    ESC_ESC,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
