use serde_json::{json, Value};
use sparkcon_command::{definitions, CommandDefinition};

use crate::cmd::CommandsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_records, OutputFormat};

pub fn run(_args: CommandsArgs, format: OutputFormat) -> CliResult<i32> {
    let records = definitions().iter().map(definition_record).collect::<Vec<_>>();
    print_records(&records, &["name", "opcode", "request", "response"], format);
    Ok(SUCCESS)
}

fn definition_record(definition: &CommandDefinition) -> Value {
    let request = definition
        .request
        .iter()
        .map(|field| field.name())
        .collect::<Vec<_>>();
    json!({
        "name": definition.name(),
        "opcode": definition.opcode.code(),
        "request": request,
        "response": definition.response,
    })
}
