use serde_json::{json, Value};
use sparkcon_transport::{list_all_ports, list_recognized_ports, PortInfo};

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_records, OutputFormat};

pub fn run(args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = if args.all {
        list_all_ports()
    } else {
        list_recognized_ports()
    }
    .map_err(|err| transport_error("port enumeration failed", err))?;

    let records = ports.iter().map(port_record).collect::<Vec<_>>();
    print_records(
        &records,
        &["device", "description", "hwid", "recognized"],
        format,
    );
    Ok(SUCCESS)
}

fn port_record(port: &PortInfo) -> Value {
    json!({
        "device": port.device,
        "description": port.description,
        "hwid": port.hwid(),
        "serial_number": port.serial_number,
        "recognized": port.is_recognized(),
    })
}
