use serde_json::json;

use crate::cmd::DeviceArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_object, OutputFormat};

pub fn run(args: DeviceArgs, format: OutputFormat) -> CliResult<i32> {
    let device = args.resolve_device()?;
    print_object(&json!({ "device": device }), format);
    Ok(SUCCESS)
}
