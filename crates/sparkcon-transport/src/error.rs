/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open {device}: {source}")]
    Open {
        device: String,
        source: serialport::Error,
    },

    /// Failed to enumerate serial ports.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(serialport::Error),

    /// A control line or port setting could not be applied.
    #[error("serial port control error: {0}")]
    Control(serialport::Error),

    /// No recognized device matched the discovery filter.
    #[error("no recognized device found{}", serial_suffix(.serial_number))]
    NoDeviceFound { serial_number: Option<String> },
}

fn serial_suffix(serial_number: &Option<String>) -> String {
    match serial_number {
        Some(serial) => format!(" with serial number {serial}"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
