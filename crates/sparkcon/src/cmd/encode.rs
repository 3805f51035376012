use serde_json::json;
use sparkcon_command::Command;

use crate::cmd::{parse_fields, EncodeArgs};
use crate::exit::{command_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_object, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let fields = parse_fields(args.fields.as_deref())?;
    let mut command =
        Command::from_decoded(&args.name, fields).map_err(|err| command_error("encode failed", err))?;

    let request = command
        .encoded_request_hex()
        .ok_or_else(|| CliError::new(INTERNAL, "encode failed: no request to encode"))?;

    print_object(
        &json!({
            "command": command.opcode().name(),
            "request": request,
        }),
        format,
    );
    Ok(SUCCESS)
}
