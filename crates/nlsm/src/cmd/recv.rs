use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nlsm_frame::{FrameConfig, FrameReader};
use nlsm_transport::{open_port, PortConfig};
use tracing::debug;

use crate::cmd::{parse_duration, RecvArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: RecvArgs, format: OutputFormat) -> CliResult<i32> {
    let read_timeout = args.timeout.as_deref().map(parse_duration).transpose()?;

    let port_config = PortConfig {
        baud_rate: args.baud,
        read_timeout,
        ..PortConfig::new(&args.port)
    };
    let link = open_port(&port_config).map_err(|err| transport_error("open failed", err))?;

    let frame_config = FrameConfig {
        read_timeout,
        strict_escapes: args.strict,
    };
    let mut reader = FrameReader::with_config_link(link, frame_config)
        .map_err(|err| frame_error("configure failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let port_name = args.port.display().to_string();
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let packet = reader
            .read_packet()
            .map_err(|err| frame_error("receive failed", err))?;

        // An empty truncated read means the stream went idle (timeout) or
        // closed with nothing pending; stop rather than spin.
        if !packet.is_complete() && packet.payload.is_empty() {
            debug!("stream idle or closed, stopping");
            break;
        }

        print_packet(&packet, &port_name, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
