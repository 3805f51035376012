use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::error::{CommandError, Result};
use crate::id::ObjectId;
use crate::opcode::Opcode;
use crate::registry::{self, ResponseLayout};
use crate::wire;

/// type, size, data of a single object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectValue {
    #[serde(rename = "type")]
    pub object_type: u8,
    pub size: u8,
    pub data: Bytes,
}

/// One entry of a LIST_OBJECTS or LOG_VALUES response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectRecord {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub object_type: u8,
    pub size: u8,
    /// Exactly `size` bytes.
    pub data: Bytes,
}

/// Fields of a successful response. The status byte is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Empty,
    Value(ObjectValue),
    Objects {
        objects: Vec<ObjectRecord>,
    },
    Profile {
        profile_id: i8,
    },
    Profiles {
        profile_id: i8,
        defined_profiles: Vec<u8>,
    },
}

impl Response {
    pub fn layout(&self) -> ResponseLayout {
        match self {
            Response::Empty => ResponseLayout::Empty,
            Response::Value(_) => ResponseLayout::Value,
            Response::Objects { .. } => ResponseLayout::ObjectList,
            Response::Profile { .. } => ResponseLayout::Profile,
            Response::Profiles { .. } => ResponseLayout::ProfileList,
        }
    }

    /// Append the fields to `dst`. List records must hold exactly `size`
    /// data bytes, or the list could not be parsed back.
    pub fn encode(&self, opcode: Opcode, dst: &mut BytesMut) -> Result<()> {
        match self {
            Response::Empty => {}
            Response::Value(value) => {
                dst.put_u8(value.object_type);
                dst.put_u8(value.size);
                dst.put_slice(&value.data);
            }
            Response::Objects { objects } => {
                for record in objects {
                    if record.data.len() != usize::from(record.size) {
                        return Err(CommandError::InvalidFields {
                            opcode,
                            message: format!(
                                "object {} declares size {} but carries {} data bytes",
                                record.id,
                                record.size,
                                record.data.len()
                            ),
                        });
                    }
                    record.id.encode(dst);
                    dst.put_u8(record.object_type);
                    dst.put_u8(record.size);
                    dst.put_slice(&record.data);
                }
                dst.put_u8(0x00);
            }
            Response::Profile { profile_id } => dst.put_i8(*profile_id),
            Response::Profiles {
                profile_id,
                defined_profiles,
            } => {
                dst.put_i8(*profile_id);
                dst.put_slice(defined_profiles);
                dst.put_u8(0x00);
            }
        }
        Ok(())
    }

    /// Parse the fields that follow a non-negative status byte.
    pub fn decode(opcode: Opcode, fields: &[u8]) -> Result<Self> {
        let mut src = fields;

        let response = match registry::definition(opcode).response {
            ResponseLayout::Empty => Response::Empty,
            ResponseLayout::Value => Response::Value(ObjectValue {
                object_type: wire::get_u8(&mut src, "type")?,
                size: wire::get_u8(&mut src, "size")?,
                data: wire::rest(&mut src),
            }),
            ResponseLayout::ObjectList => {
                let mut objects = Vec::new();
                while !wire::at_terminator(src)? {
                    let id = ObjectId::decode(&mut src)?;
                    let object_type = wire::get_u8(&mut src, "type")?;
                    let size = wire::get_u8(&mut src, "size")?;
                    let data = wire::get_data(&mut src, usize::from(size))?;
                    objects.push(ObjectRecord {
                        id,
                        object_type,
                        size,
                        data,
                    });
                }
                src = &src[1..];
                Response::Objects { objects }
            }
            ResponseLayout::Profile => Response::Profile {
                profile_id: wire::get_i8(&mut src, "profile_id")?,
            },
            ResponseLayout::ProfileList => {
                let profile_id = wire::get_i8(&mut src, "profile_id")?;
                let mut defined_profiles = Vec::new();
                while !wire::at_terminator(src)? {
                    defined_profiles.push(wire::get_u8(&mut src, "defined_profiles")?);
                }
                src = &src[1..];
                Response::Profiles {
                    profile_id,
                    defined_profiles,
                }
            }
        };

        wire::finish(src, opcode)?;
        Ok(response)
    }
}
