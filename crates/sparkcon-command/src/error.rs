use crate::opcode::{ErrorCode, Opcode};

/// Errors raised while building, encoding or decoding commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The first request byte is not a known opcode.
    #[error("no command definition known for opcode {0}")]
    UnknownOpcode(u8),

    /// No command is registered under this name.
    #[error("no command definition known for [{0}]")]
    UnknownCommand(String),

    /// Object ids must be non-empty and hold 7-bit values only.
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    /// The input ended inside a field.
    #[error("input ended while reading field `{field}`")]
    Truncated { field: &'static str },

    /// Bytes left over after a complete message.
    #[error("{count} unexpected trailing byte(s) after {opcode} message")]
    TrailingBytes { opcode: Opcode, count: usize },

    /// A list-valued response lacks its 0x00 terminator.
    #[error("list is missing its 0x00 terminator")]
    MissingTerminator,

    /// A flags byte carries bits outside the known set.
    #[error("unknown bits {bits:#04x} in `{field}`")]
    InvalidFlags { field: &'static str, bits: u8 },

    /// A field mapping does not fit the command layout.
    #[error("invalid fields for {opcode}: {message}")]
    InvalidFields { opcode: Opcode, message: String },

    /// Hexadecimal text could not be parsed.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// The device answered with a negative status code.
///
/// Carries the raw code as well as its table entry; codes outside the table
/// map to [`ErrorCode::UnknownError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{opcode} failed with code {code} ({error})")]
pub struct CommandFailure {
    pub opcode: Opcode,
    pub code: i8,
    pub error: ErrorCode,
}

pub type Result<T> = std::result::Result<T, CommandError>;
