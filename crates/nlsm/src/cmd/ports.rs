use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use nlsm_transport::available_ports;
use serde::Serialize;

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct PortsOutput {
    ports: Vec<String>,
}

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = available_ports().map_err(|err| transport_error("enumeration failed", err))?;
    let names: Vec<String> = ports.iter().map(|p| p.display().to_string()).collect();

    match format {
        OutputFormat::Json => {
            let out = PortsOutput { ports: names };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT"]);
            for name in &names {
                table.add_row(vec![name.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for name in &names {
                println!("{name}");
            }
        }
    }

    Ok(SUCCESS)
}
