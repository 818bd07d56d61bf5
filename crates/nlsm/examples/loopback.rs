//! Round-trip NLSM frames over an in-process loopback link.
//!
//! Run with: cargo run --example loopback

use nlsm_frame::{FrameReader, FrameWriter};
use nlsm_transport::SerialLink;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = SerialLink::pair()?;
    let mut writer = FrameWriter::new(tx);
    let mut reader = FrameReader::new(rx);

    let packets: [&[u8]; 3] = [b"hello", b"with\x0adelimiter", &[0x0B, 0x1A, 0xFF]];

    for payload in packets {
        writer.send(payload)?;
        let decoded = reader.read_packet()?;
        println!(
            "sent {} bytes, got {} bytes back (complete: {})",
            payload.len(),
            decoded.payload.len(),
            decoded.is_complete()
        );
        assert_eq!(decoded.payload.as_ref(), payload);
    }

    Ok(())
}
