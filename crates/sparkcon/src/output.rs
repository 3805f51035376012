use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;
use sparkcon_frame::Message;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    kind: &'a str,
    text: &'a str,
    timestamp: String,
}

/// Print one received event or data line.
pub fn print_message(message: &Message, format: OutputFormat) {
    let kind = message_kind(message);
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                kind,
                text: message.text(),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["KIND", "TEXT"]);
            table.add_row(vec![kind.to_string(), message.text().to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{kind:>5} {}", message.text()),
    }
}

/// Print a list of uniform records.
///
/// `columns` picks and orders the keys shown in table and pretty output;
/// JSON output prints the records unchanged.
pub fn print_records(records: &[Value], columns: &[&str], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(records).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let header = columns.iter().map(|c| c.to_uppercase()).collect::<Vec<_>>();
            let mut table = new_table(header);
            for record in records {
                table.add_row(
                    columns
                        .iter()
                        .map(|c| cell(record.get(*c)))
                        .collect::<Vec<_>>(),
                );
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for record in records {
                let line = columns
                    .iter()
                    .map(|c| format!("{c}={}", cell(record.get(*c))))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{line}");
            }
        }
    }
}

/// Print a single object as key/value pairs.
pub fn print_object(object: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{object}"),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            if let Some(map) = object.as_object() {
                for (key, value) in map {
                    table.add_row(vec![key.clone(), cell(Some(value))]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if let Some(map) = object.as_object() {
                for (key, value) in map {
                    println!("{key}: {}", cell(Some(value)));
                }
            }
        }
    }
}

fn new_table<T: ToString>(header: Vec<T>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(ToString::to_string).collect::<Vec<_>>());
    table
}

/// Human form of a JSON value: strings unquoted, missing and null empty.
fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn message_kind(message: &Message) -> &'static str {
    match message {
        Message::Event(_) => "event",
        Message::Data(_) => "data",
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
