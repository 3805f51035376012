use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CommandError;

/// One-byte command selector sent as the first byte of every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Opcode {
    /// Read a value.
    ReadValue = 1,
    /// Write a value.
    WriteValue = 2,
    /// Add an object to a container.
    CreateObject = 3,
    /// Delete the object at the specified location.
    DeleteObject = 4,
    /// List objects in a container.
    ListObjects = 5,
    /// Retrieve the next free slot in a container.
    FreeSlot = 6,
    /// Create a new profile.
    CreateProfile = 7,
    /// Delete a profile.
    DeleteProfile = 8,
    /// Activate a profile.
    ActivateProfile = 9,
    /// Log values from the selected container.
    LogValues = 10,
    /// Reset the device.
    Reset = 11,
    /// Find the next free slot in the root container.
    FreeSlotRoot = 12,
    /// Reserved.
    Unused = 13,
    /// List the defined profile ids and the active profile.
    ListProfiles = 14,
    /// Read the value of a system object.
    ReadSystemValue = 15,
    /// Write the value of a system object.
    WriteSystemValue = 16,
}

impl Opcode {
    /// Every opcode, in wire order.
    pub const ALL: [Opcode; 16] = [
        Opcode::ReadValue,
        Opcode::WriteValue,
        Opcode::CreateObject,
        Opcode::DeleteObject,
        Opcode::ListObjects,
        Opcode::FreeSlot,
        Opcode::CreateProfile,
        Opcode::DeleteProfile,
        Opcode::ActivateProfile,
        Opcode::LogValues,
        Opcode::Reset,
        Opcode::FreeSlotRoot,
        Opcode::Unused,
        Opcode::ListProfiles,
        Opcode::ReadSystemValue,
        Opcode::WriteSystemValue,
    ];

    /// Wire value.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Canonical upper-case name, e.g. `READ_VALUE`.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::ReadValue => "READ_VALUE",
            Opcode::WriteValue => "WRITE_VALUE",
            Opcode::CreateObject => "CREATE_OBJECT",
            Opcode::DeleteObject => "DELETE_OBJECT",
            Opcode::ListObjects => "LIST_OBJECTS",
            Opcode::FreeSlot => "FREE_SLOT",
            Opcode::CreateProfile => "CREATE_PROFILE",
            Opcode::DeleteProfile => "DELETE_PROFILE",
            Opcode::ActivateProfile => "ACTIVATE_PROFILE",
            Opcode::LogValues => "LOG_VALUES",
            Opcode::Reset => "RESET",
            Opcode::FreeSlotRoot => "FREE_SLOT_ROOT",
            Opcode::Unused => "UNUSED",
            Opcode::ListProfiles => "LIST_PROFILES",
            Opcode::ReadSystemValue => "READ_SYSTEM_VALUE",
            Opcode::WriteSystemValue => "WRITE_SYSTEM_VALUE",
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = CommandError;

    fn try_from(code: u8) -> Result<Self, CommandError> {
        match code {
            1..=16 => Ok(Opcode::ALL[usize::from(code) - 1]),
            _ => Err(CommandError::UnknownOpcode(code)),
        }
    }
}

impl FromStr for Opcode {
    type Err = CommandError;

    /// Names match case-insensitively (`read_value` == `READ_VALUE`).
    fn from_str(name: &str) -> Result<Self, CommandError> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|opcode| opcode.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signed status byte that prefixes every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i8)]
pub enum ErrorCode {
    Ok = 0,
    UnknownError = -1,
    StreamError = -2,
    ProfileNotActive = -3,
    InsufficientPersistentStorage = -16,
    InsufficientHeap = -17,

    ObjectNotWritable = -32,
    ObjectNotReadable = -33,
    ObjectNotCreatable = -34,
    ObjectNotDeletable = -35,
    ObjectNotContainer = -37,
    ContainerFull = -38,

    InvalidParameter = -64,
    InvalidObjectId = -65,
    InvalidType = -66,
    InvalidSize = -67,
    InvalidProfile = -68,
    InvalidId = -69,
}

impl ErrorCode {
    /// Exact table lookup.
    pub fn from_code(code: i8) -> Option<Self> {
        let known = match code {
            0 => ErrorCode::Ok,
            -1 => ErrorCode::UnknownError,
            -2 => ErrorCode::StreamError,
            -3 => ErrorCode::ProfileNotActive,
            -16 => ErrorCode::InsufficientPersistentStorage,
            -17 => ErrorCode::InsufficientHeap,
            -32 => ErrorCode::ObjectNotWritable,
            -33 => ErrorCode::ObjectNotReadable,
            -34 => ErrorCode::ObjectNotCreatable,
            -35 => ErrorCode::ObjectNotDeletable,
            -37 => ErrorCode::ObjectNotContainer,
            -38 => ErrorCode::ContainerFull,
            -64 => ErrorCode::InvalidParameter,
            -65 => ErrorCode::InvalidObjectId,
            -66 => ErrorCode::InvalidType,
            -67 => ErrorCode::InvalidSize,
            -68 => ErrorCode::InvalidProfile,
            -69 => ErrorCode::InvalidId,
            _ => return None,
        };
        Some(known)
    }

    /// Interpret a status byte: non-negative is success, unlisted negative
    /// values collapse to [`ErrorCode::UnknownError`].
    pub fn for_status(code: i8) -> Self {
        match Self::from_code(code) {
            Some(known) => known,
            None if code >= 0 => ErrorCode::Ok,
            None => ErrorCode::UnknownError,
        }
    }

    /// Wire value.
    pub fn code(self) -> i8 {
        self as i8
    }

    pub fn is_success(self) -> bool {
        self == ErrorCode::Ok
    }

    /// Canonical upper-case name, e.g. `INVALID_OBJECT_ID`.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::Ok => "OK",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
            ErrorCode::StreamError => "STREAM_ERROR",
            ErrorCode::ProfileNotActive => "PROFILE_NOT_ACTIVE",
            ErrorCode::InsufficientPersistentStorage => "INSUFFICIENT_PERSISTENT_STORAGE",
            ErrorCode::InsufficientHeap => "INSUFFICIENT_HEAP",
            ErrorCode::ObjectNotWritable => "OBJECT_NOT_WRITABLE",
            ErrorCode::ObjectNotReadable => "OBJECT_NOT_READABLE",
            ErrorCode::ObjectNotCreatable => "OBJECT_NOT_CREATABLE",
            ErrorCode::ObjectNotDeletable => "OBJECT_NOT_DELETABLE",
            ErrorCode::ObjectNotContainer => "OBJECT_NOT_CONTAINER",
            ErrorCode::ContainerFull => "CONTAINER_FULL",
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::InvalidObjectId => "INVALID_OBJECT_ID",
            ErrorCode::InvalidType => "INVALID_TYPE",
            ErrorCode::InvalidSize => "INVALID_SIZE",
            ErrorCode::InvalidProfile => "INVALID_PROFILE",
            ErrorCode::InvalidId => "INVALID_ID",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
