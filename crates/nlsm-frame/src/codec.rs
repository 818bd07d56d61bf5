use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame terminator.
pub const END: u8 = 0x0A;

/// Escape introducer.
pub const ESC: u8 = 0x0B;

/// Escaped form of END.
pub const ESC_END: u8 = 0x1A;

/// Escaped form of ESC.
pub const ESC_ESC: u8 = 0x1B;

/// An application-level packet: arbitrary bytes, any value 0-255.
///
/// The type boundary enforces "bytes, not text" — a `&str` payload must be
/// converted explicitly (`as_bytes`). Fallible ingestion paths such as
/// [`Packet::from_hex`] surface [`FrameError::InvalidInput`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// The unescaped payload.
    pub payload: Bytes,
}

impl Packet {
    /// Create a packet from raw bytes.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Parse a packet from a hex string (whitespace between pairs allowed).
    pub fn from_hex(input: &str) -> Result<Self> {
        let digits: Vec<u8> = input
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        if digits.len() % 2 != 0 {
            return Err(FrameError::InvalidInput(format!(
                "hex payload has odd number of digits ({})",
                digits.len()
            )));
        }

        let mut payload = BytesMut::with_capacity(digits.len() / 2);
        for pair in digits.chunks_exact(2) {
            let hi = hex_value(pair[0])?;
            let lo = hex_value(pair[1])?;
            payload.put_u8(hi << 4 | lo);
        }
        Ok(Self::new(payload.freeze()))
    }

    /// The total wire size of this packet once escaped and terminated.
    pub fn wire_size(&self) -> usize {
        let escapes = self
            .payload
            .iter()
            .filter(|&&b| b == END || b == ESC)
            .count();
        self.payload.len() + escapes + 1
    }
}

fn hex_value(digit: u8) -> Result<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        other => Err(FrameError::InvalidInput(format!(
            "not a hex digit: {:?}",
            other as char
        ))),
    }
}

/// Encode a packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────────────────────────────────────┬───────────┐
/// │ Payload, byte-stuffed:                     │ END (1B)  │
/// │   0x0A → 0x0B 0x1A                         │ 0x0A      │
/// │   0x0B → 0x0B 0x1B                         │           │
/// │   else → verbatim                          │           │
/// └────────────────────────────────────────────┴───────────┘
/// ```
///
/// Never fails: every byte value is representable on the wire.
pub fn encode_packet(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(payload.len() + 1);
    for &byte in payload {
        match byte {
            END => {
                dst.put_u8(ESC);
                dst.put_u8(ESC_END);
            }
            ESC => {
                dst.put_u8(ESC);
                dst.put_u8(ESC_ESC);
            }
            other => dst.put_u8(other),
        }
    }
    dst.put_u8(END);
}

/// How a decoded packet ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEnd {
    /// An unescaped END terminator was read. The frame is protocol-complete.
    Clean,
    /// The stream ended (EOF or read timeout) before a terminator. The
    /// payload holds whatever had accumulated.
    Truncated,
}

/// The result of decoding one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket {
    /// The unescaped payload.
    pub payload: Bytes,
    /// Whether the frame terminated cleanly or was cut short.
    pub end: FrameEnd,
}

impl DecodedPacket {
    /// True if the frame was closed by a proper END terminator.
    pub fn is_complete(&self) -> bool {
        self.end == FrameEnd::Clean
    }
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Read timeout applied to the underlying link. `None` blocks forever.
    pub read_timeout: Option<std::time::Duration>,
    /// Reject unrecognized escape sequences instead of absorbing them.
    /// Default: off, for wire compatibility with permissive peers.
    pub strict_escapes: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            read_timeout: None,
            strict_escapes: false,
        }
    }
}

/// Outcome of mapping the byte that follows an ESC.
enum Unescape {
    /// One of the two defined escape codes.
    Recognized(u8),
    /// Anything else. Permissive decoding passes it through verbatim.
    Literal(u8),
}

fn unescape(byte: u8) -> Unescape {
    match byte {
        ESC_END => Unescape::Recognized(END),
        ESC_ESC => Unescape::Recognized(ESC),
        other => Unescape::Literal(other),
    }
}

/// Incremental NLSM decoder: a two-state machine fed one byte at a time.
///
/// State is just the "currently in escape" flag plus the accumulated
/// output. [`push`](Self::push) returns the finished payload when an
/// unescaped END arrives; [`take_partial`](Self::take_partial) drains
/// whatever has accumulated when the stream ends early.
#[derive(Debug, Default)]
pub struct NlsmDecoder {
    buf: BytesMut,
    escaped: bool,
    strict: bool,
}

impl NlsmDecoder {
    /// Create a permissive decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder that errors on unrecognized escape sequences.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Feed one byte. Returns the decoded payload when a frame completes.
    ///
    /// In the escaped state any byte other than ESC_END/ESC_ESC is taken
    /// literally — even ESC or END. An ESC directly following an ESC does
    /// not re-arm the escape state, so a malformed sequence never consumes
    /// more than the one byte after the introducer.
    pub fn push(&mut self, byte: u8) -> Result<Option<Bytes>> {
        if self.escaped {
            self.escaped = false;
            match unescape(byte) {
                Unescape::Recognized(mapped) => self.buf.put_u8(mapped),
                Unescape::Literal(_) if self.strict => {
                    return Err(FrameError::InvalidEscape { byte });
                }
                Unescape::Literal(literal) => self.buf.put_u8(literal),
            }
            return Ok(None);
        }

        match byte {
            END => Ok(Some(self.buf.split().freeze())),
            ESC => {
                self.escaped = true;
                Ok(None)
            }
            other => {
                self.buf.put_u8(other);
                Ok(None)
            }
        }
    }

    /// Drain the accumulated bytes of an unterminated frame.
    ///
    /// Resets the escape flag; a dangling ESC at the point of truncation
    /// is dropped, matching its on-wire meaning of "incomplete".
    pub fn take_partial(&mut self) -> Bytes {
        self.escaped = false;
        self.buf.split().freeze()
    }

    /// Number of payload bytes accumulated for the frame in progress.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
