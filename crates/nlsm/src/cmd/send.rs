use std::fs;

use nlsm_frame::{FrameWriter, Packet};
use nlsm_transport::{open_port, PortConfig};
use tracing::info;

use crate::cmd::SendArgs;
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub fn run(args: SendArgs, _format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;

    let config = PortConfig {
        baud_rate: args.baud,
        ..PortConfig::new(&args.port)
    };
    let link = open_port(&config).map_err(|err| transport_error("open failed", err))?;

    let mut writer = FrameWriter::new(link);
    writer
        .send(&payload)
        .map_err(|err| frame_error("send failed", err))?;

    info!(
        port = %args.port.display(),
        bytes = payload.len(),
        "packet transmitted"
    );
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(hex) = &args.hex {
        let packet =
            Packet::from_hex(hex).map_err(|err| frame_error("invalid --hex payload", err))?;
        return Ok(packet.payload.to_vec());
    }
    if let Some(data) = &args.data {
        // Text is converted to bytes explicitly here; the framing core
        // only ever sees byte slices.
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path).map_err(|err| {
            crate::exit::io_error(&format!("failed reading {}", path.display()), err)
        });
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::exit::DATA_INVALID;

    fn args_with(data: Option<&str>, hex: Option<&str>) -> SendArgs {
        SendArgs {
            port: PathBuf::from("/dev/ttyUSB0"),
            baud: 115_200,
            data: data.map(String::from),
            hex: hex.map(String::from),
            file: None,
        }
    }

    #[test]
    fn payload_defaults_to_empty() {
        let payload = resolve_payload(&args_with(None, None)).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn data_payload_is_utf8_bytes() {
        let payload = resolve_payload(&args_with(Some("hi"), None)).unwrap();
        assert_eq!(payload, b"hi");
    }

    #[test]
    fn hex_payload_is_decoded() {
        let payload = resolve_payload(&args_with(None, Some("0a0b41"))).unwrap();
        assert_eq!(payload, vec![0x0A, 0x0B, 0x41]);
    }

    #[test]
    fn malformed_hex_is_data_invalid() {
        let err = resolve_payload(&args_with(None, Some("xyz"))).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let args = SendArgs {
            file: Some(PathBuf::from("/nlsm-no-such-file")),
            ..args_with(None, None)
        };
        let err = resolve_payload(&args).unwrap_err();
        assert!(err.message.contains("/nlsm-no-such-file"));
    }
}
