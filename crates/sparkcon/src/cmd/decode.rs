use serde_json::{json, Value};
use sparkcon_command::{Command, CommandError, DecodedResponse};

use crate::cmd::DecodeArgs;
use crate::exit::{command_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_object, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let request = parse_hex(&args.request)?;
    let response = args.response.as_deref().map(parse_hex).transpose()?;

    let mut command = Command::from_encoded(&request, response.as_deref())
        .map_err(|err| command_error("decode failed", err))?;

    let decoded_request = command
        .decoded_request()
        .map_err(|err| command_error("request decode failed", err))?
        .map(to_json)
        .transpose()?;
    let decoded_response = command
        .decoded_response()
        .map_err(|err| command_error("response decode failed", err))?
        .map(response_json)
        .transpose()?;

    print_object(
        &json!({
            "command": command.opcode().name(),
            "opcode": command.opcode().code(),
            "request": decoded_request,
            "response": decoded_response,
        }),
        format,
    );
    Ok(SUCCESS)
}

pub fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    hex::decode(text.trim()).map_err(|err| {
        command_error("invalid hex", CommandError::InvalidHex(err.to_string()))
    })
}

/// JSON form of a decoded response: its fields, or the failure status.
pub fn response_json(response: &DecodedResponse) -> CliResult<Value> {
    match response {
        Ok(fields) => to_json(fields),
        Err(failure) => Ok(json!({
            "error": failure.error,
            "code": failure.code,
        })),
    }
}

fn to_json<T: serde::Serialize>(value: T) -> CliResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| CliError::new(INTERNAL, format!("serialization failed: {err}")))
}
