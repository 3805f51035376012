use std::time::Duration;

use clap::{Args, Subcommand};
use sparkcon_conduit::ConduitConfig;
use sparkcon_transport::{detect_device, SerialConfig, DEFAULT_BAUD_RATE};

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod commands;
pub mod decode;
pub mod detect;
pub mod encode;
pub mod monitor;
pub mod ports;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List serial ports with a recognized controller attached.
    Ports(PortsArgs),
    /// Print the device path a conduit would bind to.
    Detect(DeviceArgs),
    /// List the command definition table.
    Commands(CommandsArgs),
    /// Encode a command request as hex.
    Encode(EncodeArgs),
    /// Decode a hex request and optional response.
    Decode(DecodeArgs),
    /// Bind to a controller and print events and data lines.
    Monitor(MonitorArgs),
    /// Send one command and decode the next data line as its response.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Ports(args) => ports::run(args, format),
        Command::Detect(args) => detect::run(args, format),
        Command::Commands(args) => commands::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Device selection and serial line settings shared by commands that bind.
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Serial device path. Skips discovery when set.
    #[arg(long, env = "SPARKCON_DEVICE")]
    pub device: Option<String>,
    /// Only consider recognized devices with this USB serial number.
    #[arg(long, env = "SPARKCON_SERIAL_NUMBER")]
    pub serial_number: Option<String>,
    /// Serial line speed.
    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud_rate: u32,
    /// Read timeout of the serial port (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub read_timeout: String,
}

impl DeviceArgs {
    /// Resolve the device path, explicit or discovered.
    pub fn resolve_device(&self) -> CliResult<String> {
        detect_device(self.device.as_deref(), self.serial_number.as_deref())
            .map_err(|err| transport_error("device detection failed", err))
    }

    pub fn conduit_config(&self) -> CliResult<ConduitConfig> {
        Ok(ConduitConfig {
            serial: SerialConfig {
                baud_rate: self.baud_rate,
                timeout: parse_duration(&self.read_timeout)?,
            },
            ..ConduitConfig::default()
        })
    }
}

#[derive(Args, Debug)]
pub struct PortsArgs {
    /// List every serial port, not only recognized controllers.
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug, Default)]
pub struct CommandsArgs {}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Command name, e.g. READ_VALUE (case-insensitive).
    pub name: String,
    /// Request fields as a JSON object, e.g. '{"id":[3,7],"type":6,"size":2}'.
    pub fields: Option<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Encoded request as hex.
    pub request: String,
    /// Encoded response as hex, status byte first.
    pub response: Option<String>,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Only print events.
    #[arg(long, conflicts_with = "data_only")]
    pub events_only: bool,
    /// Only print data lines.
    #[arg(long)]
    pub data_only: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Command name, e.g. LIST_PROFILES (case-insensitive).
    pub name: String,
    /// Request fields as a JSON object.
    pub fields: Option<String>,
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Maximum time to wait for the response line (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a field mapping argument. Absent means no fields.
pub fn parse_fields(fields: Option<&str>) -> CliResult<serde_json::Value> {
    match fields {
        None => Ok(serde_json::Value::Null),
        Some(text) => serde_json::from_str(text)
            .map_err(|err| CliError::new(USAGE, format!("fields are not valid JSON: {err}"))),
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}
