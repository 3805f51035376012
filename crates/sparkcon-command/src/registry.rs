use serde::Serialize;

use crate::error::{CommandError, Result};
use crate::opcode::Opcode;

/// One field of a request layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Variable-length object id.
    Id,
    /// Object id that may be left out entirely.
    OptionalId,
    /// Object type, one unsigned byte.
    Type,
    /// Object size, one unsigned byte.
    Size,
    /// Raw object data.
    Data,
    /// Profile id, one signed byte.
    ProfileId,
    /// LOG_VALUES flag byte.
    LogFlags,
    /// RESET flag byte.
    ResetFlags,
}

impl Field {
    /// Key used for this field in decoded field mappings.
    pub fn name(self) -> &'static str {
        match self {
            Field::Id | Field::OptionalId => "id",
            Field::Type => "type",
            Field::Size => "size",
            Field::Data => "data",
            Field::ProfileId => "profile_id",
            Field::LogFlags | Field::ResetFlags => "flags",
        }
    }
}

/// Shape of the fields that follow the status byte of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseLayout {
    /// Status byte only.
    Empty,
    /// type, size, data.
    Value,
    /// (id, type, size, data) records, 0x00 terminated.
    ObjectList,
    /// A single profile id.
    Profile,
    /// Active profile id, then 0x00 terminated profile ids.
    ProfileList,
}

/// Static description of one command kind.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct CommandDefinition {
    pub opcode: Opcode,
    pub request: &'static [Field],
    pub response: ResponseLayout,
}

impl CommandDefinition {
    pub fn name(&self) -> &'static str {
        self.opcode.name()
    }

    /// Whether `key` names a request field of this kind.
    pub fn accepts_field(&self, key: &str) -> bool {
        self.request.iter().any(|field| field.name() == key)
    }
}

const ID_TYPE_SIZE: &[Field] = &[Field::Id, Field::Type, Field::Size];
const ID_TYPE_SIZE_DATA: &[Field] = &[Field::Id, Field::Type, Field::Size, Field::Data];
const TYPE_SIZE_DATA: &[Field] = &[Field::Type, Field::Size, Field::Data];
const ID: &[Field] = &[Field::Id];
const PROFILE: &[Field] = &[Field::ProfileId];
const NOTHING: &[Field] = &[];

static DEFINITIONS: [CommandDefinition; 16] = [
    CommandDefinition {
        opcode: Opcode::ReadValue,
        request: ID_TYPE_SIZE,
        response: ResponseLayout::Value,
    },
    CommandDefinition {
        opcode: Opcode::WriteValue,
        request: ID_TYPE_SIZE_DATA,
        response: ResponseLayout::Value,
    },
    CommandDefinition {
        opcode: Opcode::CreateObject,
        request: TYPE_SIZE_DATA,
        response: ResponseLayout::Empty,
    },
    CommandDefinition {
        opcode: Opcode::DeleteObject,
        request: ID,
        response: ResponseLayout::Empty,
    },
    CommandDefinition {
        opcode: Opcode::ListObjects,
        request: PROFILE,
        response: ResponseLayout::ObjectList,
    },
    CommandDefinition {
        opcode: Opcode::FreeSlot,
        request: ID,
        response: ResponseLayout::Empty,
    },
    CommandDefinition {
        opcode: Opcode::CreateProfile,
        request: NOTHING,
        response: ResponseLayout::Profile,
    },
    CommandDefinition {
        opcode: Opcode::DeleteProfile,
        request: PROFILE,
        response: ResponseLayout::Empty,
    },
    CommandDefinition {
        opcode: Opcode::ActivateProfile,
        request: PROFILE,
        response: ResponseLayout::Empty,
    },
    CommandDefinition {
        opcode: Opcode::LogValues,
        request: &[Field::LogFlags, Field::OptionalId],
        response: ResponseLayout::ObjectList,
    },
    CommandDefinition {
        opcode: Opcode::Reset,
        request: &[Field::ResetFlags],
        response: ResponseLayout::Empty,
    },
    CommandDefinition {
        opcode: Opcode::FreeSlotRoot,
        request: ID,
        response: ResponseLayout::Empty,
    },
    CommandDefinition {
        opcode: Opcode::Unused,
        request: NOTHING,
        response: ResponseLayout::Empty,
    },
    CommandDefinition {
        opcode: Opcode::ListProfiles,
        request: NOTHING,
        response: ResponseLayout::ProfileList,
    },
    CommandDefinition {
        opcode: Opcode::ReadSystemValue,
        request: ID_TYPE_SIZE,
        response: ResponseLayout::Value,
    },
    CommandDefinition {
        opcode: Opcode::WriteSystemValue,
        request: ID_TYPE_SIZE_DATA,
        response: ResponseLayout::Value,
    },
];

/// Every command definition, in opcode order.
pub fn definitions() -> &'static [CommandDefinition] {
    &DEFINITIONS
}

/// Definition for a known opcode.
pub fn definition(opcode: Opcode) -> &'static CommandDefinition {
    &DEFINITIONS[usize::from(opcode.code()) - 1]
}

/// Look up a definition by its wire opcode.
pub fn definition_for_opcode(code: u8) -> Result<&'static CommandDefinition> {
    Opcode::try_from(code).map(definition)
}

/// Look up a definition by name, ignoring case.
pub fn definition_for_name(name: &str) -> Result<&'static CommandDefinition> {
    name.parse::<Opcode>()
        .map(definition)
        .map_err(|_| CommandError::UnknownCommand(name.to_string()))
}
