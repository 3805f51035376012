use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use serde_json::json;
use sparkcon_command::Command;
use sparkcon_conduit::{Conduit, ConduitError};
use tracing::{debug, info};

use crate::cmd::decode::response_json;
use crate::cmd::{parse_duration, parse_fields, SendArgs};
use crate::exit::{
    command_error, conduit_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS, TIMEOUT,
};
use crate::output::{print_object, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let fields = parse_fields(args.fields.as_deref())?;
    let mut command =
        Command::from_decoded(&args.name, fields).map_err(|err| command_error("encode failed", err))?;
    let request = command
        .encoded_request_hex()
        .ok_or_else(|| CliError::new(INTERNAL, "encode failed: no request to send"))?;

    let device = args.device.resolve_device()?;
    let mut conduit: Conduit = Conduit::with_config(args.device.conduit_config()?);

    let (lines_tx, lines_rx) = mpsc::channel();
    conduit.set_on_data(move |line| {
        lines_tx.send(line.to_string())?;
        Ok(())
    });
    conduit.set_on_event(|event| {
        info!(event, "controller event");
        Ok(())
    });

    conduit
        .bind(&device)
        .map_err(|err| conduit_error("bind failed", err))?;
    debug!(device = %device, request = %request, "sending command");
    conduit
        .write(&request)
        .map_err(|err| conduit_error("send failed", err))?;

    let line = wait_for_line(&mut conduit, &lines_rx, wait_timeout);
    conduit.close();
    let line = line?;

    command
        .set_encoded_response_hex(&line)
        .map_err(|err| command_error("invalid response", err))?;
    let decoded = command
        .decoded_response()
        .map_err(|err| command_error("response decode failed", err))?
        .cloned()
        .ok_or_else(|| CliError::new(INTERNAL, "response decode failed: no response"))?;

    print_object(
        &json!({
            "command": command.opcode().name(),
            "request": request,
            "response_hex": line,
            "response": response_json(&decoded)?,
        }),
        format,
    );

    match decoded {
        Ok(_) => Ok(SUCCESS),
        Err(failure) => Err(CliError::new(FAILURE, failure.to_string())),
    }
}

/// Something that can be asked to take in more controller output.
trait LineSource {
    fn poll(&mut self) -> Result<usize, ConduitError>;
}

impl LineSource for Conduit {
    fn poll(&mut self) -> Result<usize, ConduitError> {
        self.receive()
    }
}

/// Poll until the data consumer delivers a line or `timeout` passes.
fn wait_for_line<S: LineSource>(
    source: &mut S,
    lines: &Receiver<String>,
    timeout: Duration,
) -> CliResult<String> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(line) = lines.try_recv() {
            return Ok(line);
        }
        if Instant::now() >= deadline {
            return Err(CliError::new(
                TIMEOUT,
                format!("no response within {timeout:?}"),
            ));
        }
        source
            .poll()
            .map_err(|err| conduit_error("receive failed", err))?;
    }
}
