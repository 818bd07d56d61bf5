use std::io::{ErrorKind, Read};

use nlsm_transport::SerialLink;
use tracing::trace;

use crate::codec::{DecodedPacket, FrameConfig, FrameEnd, NlsmDecoder};
use crate::error::{FrameError, Result};

/// Reads complete NLSM frames from any `Read` stream.
///
/// Bytes are pulled one at a time, matching the arrival granularity of a
/// serial line. Callers get whole packets; a stream that ends before the
/// terminator yields a [`FrameEnd::Truncated`] packet rather than an error.
pub struct FrameReader<T> {
    inner: T,
    decoder: NlsmDecoder,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    ///
    /// `config.read_timeout` is not applied here: a generic `Read` source
    /// has no timeout knob. Use [`FrameReader::with_config_link`] to have
    /// the timeout set on a [`SerialLink`]; timeouts the source raises
    /// itself (`TimedOut`/`WouldBlock`) are honored either way.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        let decoder = if config.strict_escapes {
            NlsmDecoder::strict()
        } else {
            NlsmDecoder::new()
        };
        Self {
            inner,
            decoder,
            config,
        }
    }

    /// Read the next frame (blocking).
    ///
    /// Returns a packet tagged [`FrameEnd::Clean`] when an unescaped END
    /// was read, or [`FrameEnd::Truncated`] with the bytes accumulated so
    /// far when the stream hits EOF or a read timeout first. Consecutive
    /// calls decode consecutive frames from the same stream.
    pub fn read_packet(&mut self) -> Result<DecodedPacket> {
        loop {
            let mut byte = [0u8; 1];
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(self.truncated()),
                Ok(_) => {
                    if let Some(payload) = self.decoder.push(byte[0])? {
                        trace!(len = payload.len(), "decoded frame");
                        return Ok(DecodedPacket {
                            payload,
                            end: FrameEnd::Clean,
                        });
                    }
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::TimedOut
                        || err.kind() == ErrorKind::WouldBlock =>
                {
                    return Ok(self.truncated());
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    fn truncated(&mut self) -> DecodedPacket {
        let payload = self.decoder.take_partial();
        trace!(len = payload.len(), "stream ended before terminator");
        DecodedPacket {
            payload,
            end: FrameEnd::Truncated,
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<SerialLink> {
    /// Create a frame reader for a [`SerialLink`] and apply the read
    /// timeout from config.
    pub fn with_config_link(mut inner: SerialLink, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

fn transport_to_frame_error(err: nlsm_transport::TransportError) -> FrameError {
    match err {
        nlsm_transport::TransportError::Io(io) => FrameError::Io(io),
        nlsm_transport::TransportError::Open { source, .. }
        | nlsm_transport::TransportError::Enumerate(source) => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::encode_packet;

    #[test]
    fn read_single_frame() {
        let mut wire = BytesMut::new();
        encode_packet(b"hello", &mut wire);

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let packet = reader.read_packet().unwrap();

        assert!(packet.is_complete());
        assert_eq!(packet.payload.as_ref(), b"hello");
    }

    #[test]
    fn read_consecutive_frames_from_one_stream() {
        let mut wire = BytesMut::new();
        encode_packet(b"one", &mut wire);
        encode_packet(b"two\x0a", &mut wire);

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));

        let p1 = reader.read_packet().unwrap();
        let p2 = reader.read_packet().unwrap();

        assert_eq!(p1.payload.as_ref(), b"one");
        assert_eq!(p2.payload.as_ref(), b"two\x0a");
        assert!(p1.is_complete() && p2.is_complete());
    }

    #[test]
    fn truncated_stream_yields_partial_packet() {
        let mut reader = FrameReader::new(Cursor::new(vec![0x41, 0x42]));
        let packet = reader.read_packet().unwrap();

        assert_eq!(packet.end, FrameEnd::Truncated);
        assert_eq!(packet.payload.as_ref(), &[0x41, 0x42]);
    }

    #[test]
    fn empty_stream_yields_empty_truncated_packet() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let packet = reader.read_packet().unwrap();

        assert_eq!(packet.end, FrameEnd::Truncated);
        assert!(packet.payload.is_empty());
    }

    #[test]
    fn decode_escaped_frame_from_stream() {
        let mut reader = FrameReader::new(Cursor::new(vec![0x41, 0x0B, 0x1A, 0x42, 0x0A]));
        let packet = reader.read_packet().unwrap();
        assert_eq!(packet.payload.as_ref(), &[0x41, 0x0A, 0x42]);
    }

    #[test]
    fn roundtrip_all_byte_values_over_stream() {
        let payload: Vec<u8> = (0..=255).collect();
        let mut wire = BytesMut::new();
        encode_packet(&payload, &mut wire);

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let packet = reader.read_packet().unwrap();
        assert!(packet.is_complete());
        assert_eq!(packet.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            state: 0,
            bytes: vec![0x41, 0x0A],
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let packet = framed.read_packet().unwrap();

        assert!(packet.is_complete());
        assert_eq!(packet.payload.as_ref(), &[0x41]);
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn timed_out_read_yields_truncated_packet() {
        let reader = DataThenTimeout {
            bytes: vec![0x41, 0x42],
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let packet = framed.read_packet().unwrap();

        assert_eq!(packet.end, FrameEnd::Truncated);
        assert_eq!(packet.payload.as_ref(), &[0x41, 0x42]);
    }

    struct DataThenTimeout {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for DataThenTimeout {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() {
                return Err(std::io::Error::from(ErrorKind::TimedOut));
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn other_io_errors_propagate() {
        let mut framed = FrameReader::new(BrokenReader);
        let err = framed.read_packet().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn strict_config_rejects_malformed_escape() {
        let cfg = FrameConfig {
            strict_escapes: true,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(vec![0x0B, 0x42, 0x0A]), cfg);
        let err = reader.read_packet().unwrap_err();
        assert!(matches!(err, FrameError::InvalidEscape { byte: 0x42 }));
    }

    #[test]
    fn roundtrip_over_loopback_link() {
        let (left, right) = SerialLink::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer.send(b"ping\x0a\x0b").unwrap();
        let packet = reader.read_packet().unwrap();

        assert!(packet.is_complete());
        assert_eq!(packet.payload.as_ref(), b"ping\x0a\x0b");
    }

    #[test]
    fn loopback_timeout_yields_truncated_partial() {
        let (left, right) = SerialLink::pair().unwrap();
        let cfg = FrameConfig {
            read_timeout: Some(Duration::from_millis(30)),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config_link(right, cfg).unwrap();

        // Unterminated frame: two payload bytes, no END.
        use std::io::Write;
        let mut tx = left;
        tx.write_all(&[0x41, 0x42]).unwrap();
        tx.flush().unwrap();

        let packet = reader.read_packet().unwrap();
        assert_eq!(packet.end, FrameEnd::Truncated);
        assert_eq!(packet.payload.as_ref(), &[0x41, 0x42]);
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        assert!(!reader.config().strict_escapes);
        let _inner = reader.into_inner();
    }
}
