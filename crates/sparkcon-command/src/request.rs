use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{CommandError, Result};
use crate::id::ObjectId;
use crate::opcode::Opcode;
use crate::wire;

/// Flag byte of a LOG_VALUES request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogFlags {
    /// Prefix every logged value with its full id chain.
    pub id_chain: bool,
    /// Log from the system container instead of the active profile.
    pub system_container: bool,
}

impl LogFlags {
    const ID_CHAIN: u8 = 1;
    const SYSTEM_CONTAINER: u8 = 2;

    pub fn bits(self) -> u8 {
        let mut bits = 0;
        if self.id_chain {
            bits |= Self::ID_CHAIN;
        }
        if self.system_container {
            bits |= Self::SYSTEM_CONTAINER;
        }
        bits
    }

    pub fn from_bits(bits: u8) -> Result<Self> {
        let unknown = bits & !(Self::ID_CHAIN | Self::SYSTEM_CONTAINER);
        if unknown != 0 {
            return Err(CommandError::InvalidFlags {
                field: "flags",
                bits: unknown,
            });
        }
        Ok(Self {
            id_chain: bits & Self::ID_CHAIN != 0,
            system_container: bits & Self::SYSTEM_CONTAINER != 0,
        })
    }
}

/// Flag byte of a RESET request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResetFlags {
    pub erase_eeprom: bool,
    pub hard_reset: bool,
}

impl ResetFlags {
    const ERASE_EEPROM: u8 = 1;
    const HARD_RESET: u8 = 2;

    pub fn bits(self) -> u8 {
        let mut bits = 0;
        if self.erase_eeprom {
            bits |= Self::ERASE_EEPROM;
        }
        if self.hard_reset {
            bits |= Self::HARD_RESET;
        }
        bits
    }

    pub fn from_bits(bits: u8) -> Result<Self> {
        let unknown = bits & !(Self::ERASE_EEPROM | Self::HARD_RESET);
        if unknown != 0 {
            return Err(CommandError::InvalidFlags {
                field: "flags",
                bits: unknown,
            });
        }
        Ok(Self {
            erase_eeprom: bits & Self::ERASE_EEPROM != 0,
            hard_reset: bits & Self::HARD_RESET != 0,
        })
    }
}

/// A decoded request: one variant per command kind.
///
/// The JSON form carries the kind under `"command"` next to the fields, e.g.
/// `{"command": "READ_VALUE", "id": [3, 7], "type": 6, "size": 2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    ReadValue {
        id: ObjectId,
        #[serde(rename = "type")]
        object_type: u8,
        size: u8,
    },
    WriteValue {
        id: ObjectId,
        #[serde(rename = "type")]
        object_type: u8,
        size: u8,
        #[serde(default)]
        data: Bytes,
    },
    CreateObject {
        #[serde(rename = "type")]
        object_type: u8,
        size: u8,
        #[serde(default)]
        data: Bytes,
    },
    DeleteObject {
        id: ObjectId,
    },
    ListObjects {
        profile_id: i8,
    },
    FreeSlot {
        id: ObjectId,
    },
    CreateProfile {},
    DeleteProfile {
        profile_id: i8,
    },
    ActivateProfile {
        profile_id: i8,
    },
    LogValues {
        #[serde(default)]
        flags: LogFlags,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<ObjectId>,
    },
    Reset {
        #[serde(default)]
        flags: ResetFlags,
    },
    FreeSlotRoot {
        id: ObjectId,
    },
    Unused {},
    ListProfiles {},
    ReadSystemValue {
        id: ObjectId,
        #[serde(rename = "type")]
        object_type: u8,
        size: u8,
    },
    WriteSystemValue {
        id: ObjectId,
        #[serde(rename = "type")]
        object_type: u8,
        size: u8,
        #[serde(default)]
        data: Bytes,
    },
}

impl Request {
    pub fn opcode(&self) -> Opcode {
        match self {
            Request::ReadValue { .. } => Opcode::ReadValue,
            Request::WriteValue { .. } => Opcode::WriteValue,
            Request::CreateObject { .. } => Opcode::CreateObject,
            Request::DeleteObject { .. } => Opcode::DeleteObject,
            Request::ListObjects { .. } => Opcode::ListObjects,
            Request::FreeSlot { .. } => Opcode::FreeSlot,
            Request::CreateProfile {} => Opcode::CreateProfile,
            Request::DeleteProfile { .. } => Opcode::DeleteProfile,
            Request::ActivateProfile { .. } => Opcode::ActivateProfile,
            Request::LogValues { .. } => Opcode::LogValues,
            Request::Reset { .. } => Opcode::Reset,
            Request::FreeSlotRoot { .. } => Opcode::FreeSlotRoot,
            Request::Unused {} => Opcode::Unused,
            Request::ListProfiles {} => Opcode::ListProfiles,
            Request::ReadSystemValue { .. } => Opcode::ReadSystemValue,
            Request::WriteSystemValue { .. } => Opcode::WriteSystemValue,
        }
    }

    /// Append the wire form, opcode first, to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.put_u8(self.opcode().code());

        match self {
            Request::ReadValue {
                id,
                object_type,
                size,
            }
            | Request::ReadSystemValue {
                id,
                object_type,
                size,
            } => {
                id.encode(dst);
                dst.put_u8(*object_type);
                dst.put_u8(*size);
            }
            Request::WriteValue {
                id,
                object_type,
                size,
                data,
            }
            | Request::WriteSystemValue {
                id,
                object_type,
                size,
                data,
            } => {
                id.encode(dst);
                dst.put_u8(*object_type);
                dst.put_u8(*size);
                dst.put_slice(data);
            }
            Request::CreateObject {
                object_type,
                size,
                data,
            } => {
                dst.put_u8(*object_type);
                dst.put_u8(*size);
                dst.put_slice(data);
            }
            Request::DeleteObject { id }
            | Request::FreeSlot { id }
            | Request::FreeSlotRoot { id } => id.encode(dst),
            Request::ListObjects { profile_id }
            | Request::DeleteProfile { profile_id }
            | Request::ActivateProfile { profile_id } => dst.put_i8(*profile_id),
            Request::LogValues { flags, id } => {
                dst.put_u8(flags.bits());
                if let Some(id) = id {
                    id.encode(dst);
                }
            }
            Request::Reset { flags } => dst.put_u8(flags.bits()),
            Request::CreateProfile {} | Request::Unused {} | Request::ListProfiles {} => {}
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Parse a complete request. Bytes left after the last field are an error.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut src = bytes;
        let opcode = Opcode::try_from(wire::get_u8(&mut src, "opcode")?)?;

        let request = match opcode {
            Opcode::ReadValue | Opcode::ReadSystemValue => {
                let id = ObjectId::decode(&mut src)?;
                let object_type = wire::get_u8(&mut src, "type")?;
                let size = wire::get_u8(&mut src, "size")?;
                if opcode == Opcode::ReadValue {
                    Request::ReadValue {
                        id,
                        object_type,
                        size,
                    }
                } else {
                    Request::ReadSystemValue {
                        id,
                        object_type,
                        size,
                    }
                }
            }
            Opcode::WriteValue | Opcode::WriteSystemValue => {
                let id = ObjectId::decode(&mut src)?;
                let object_type = wire::get_u8(&mut src, "type")?;
                let size = wire::get_u8(&mut src, "size")?;
                let data = wire::rest(&mut src);
                if opcode == Opcode::WriteValue {
                    Request::WriteValue {
                        id,
                        object_type,
                        size,
                        data,
                    }
                } else {
                    Request::WriteSystemValue {
                        id,
                        object_type,
                        size,
                        data,
                    }
                }
            }
            Opcode::CreateObject => Request::CreateObject {
                object_type: wire::get_u8(&mut src, "type")?,
                size: wire::get_u8(&mut src, "size")?,
                data: wire::rest(&mut src),
            },
            Opcode::DeleteObject => Request::DeleteObject {
                id: ObjectId::decode(&mut src)?,
            },
            Opcode::FreeSlot => Request::FreeSlot {
                id: ObjectId::decode(&mut src)?,
            },
            Opcode::FreeSlotRoot => Request::FreeSlotRoot {
                id: ObjectId::decode(&mut src)?,
            },
            Opcode::ListObjects => Request::ListObjects {
                profile_id: wire::get_i8(&mut src, "profile_id")?,
            },
            Opcode::DeleteProfile => Request::DeleteProfile {
                profile_id: wire::get_i8(&mut src, "profile_id")?,
            },
            Opcode::ActivateProfile => Request::ActivateProfile {
                profile_id: wire::get_i8(&mut src, "profile_id")?,
            },
            Opcode::LogValues => {
                let flags = LogFlags::from_bits(wire::get_u8(&mut src, "flags")?)?;
                let id = if src.is_empty() {
                    None
                } else {
                    Some(ObjectId::decode(&mut src)?)
                };
                Request::LogValues { flags, id }
            }
            Opcode::Reset => Request::Reset {
                flags: ResetFlags::from_bits(wire::get_u8(&mut src, "flags")?)?,
            },
            Opcode::CreateProfile => Request::CreateProfile {},
            Opcode::Unused => Request::Unused {},
            Opcode::ListProfiles => Request::ListProfiles {},
        };

        wire::finish(src, opcode)?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn id(segments: &[u8]) -> ObjectId {
        ObjectId::new(segments.to_vec()).unwrap()
    }

    #[test]
    fn read_value_wire_form() {
        let request = Request::ReadValue {
            id: id(&[3, 7]),
            object_type: 6,
            size: 2,
        };
        assert_eq!(&request.to_bytes()[..], &[0x01, 0x83, 0x07, 0x06, 0x02]);
    }

    #[test]
    fn write_value_data_runs_to_end() {
        let wire = [0x02, 0x01, 0x06, 0x03, 0xAA, 0xBB, 0xCC];
        assert_eq!(
            Request::decode(&wire).unwrap(),
            Request::WriteValue {
                id: id(&[1]),
                object_type: 6,
                size: 3,
                data: Bytes::from_static(&[0xAA, 0xBB, 0xCC]),
            }
        );
    }

    #[test]
    fn log_values_id_is_optional() {
        let without = Request::LogValues {
            flags: LogFlags {
                id_chain: true,
                system_container: false,
            },
            id: None,
        };
        assert_eq!(&without.to_bytes()[..], &[0x0A, 0x01]);
        assert_eq!(Request::decode(&[0x0A, 0x01]).unwrap(), without);

        let with = Request::decode(&[0x0A, 0x03, 0x82, 0x05]).unwrap();
        assert_eq!(
            with,
            Request::LogValues {
                flags: LogFlags {
                    id_chain: true,
                    system_container: true,
                },
                id: Some(id(&[2, 5])),
            }
        );
    }

    #[test]
    fn profile_ids_are_signed() {
        let request = Request::decode(&[0x09, 0xFF]).unwrap();
        assert_eq!(request, Request::ActivateProfile { profile_id: -1 });
    }

    #[test]
    fn fieldless_requests_are_just_the_opcode() {
        for request in [
            Request::CreateProfile {},
            Request::Unused {},
            Request::ListProfiles {},
        ] {
            let wire = request.to_bytes();
            assert_eq!(&wire[..], &[request.opcode().code()]);
            assert_eq!(Request::decode(&wire).unwrap(), request);
        }
    }

    #[test]
    fn rejects_trailing_bytes() {
        assert_eq!(
            Request::decode(&[0x04, 0x01, 0x99]),
            Err(CommandError::TrailingBytes {
                opcode: Opcode::DeleteObject,
                count: 1
            })
        );
        assert_eq!(
            Request::decode(&[0x0E, 0x00]),
            Err(CommandError::TrailingBytes {
                opcode: Opcode::ListProfiles,
                count: 1
            })
        );
    }

    #[test]
    fn rejects_unknown_flag_bits() {
        assert_eq!(
            Request::decode(&[0x0B, 0x05]),
            Err(CommandError::InvalidFlags {
                field: "flags",
                bits: 0x04
            })
        );
    }

    #[test]
    fn rejects_truncated_and_unknown() {
        assert_eq!(
            Request::decode(&[]),
            Err(CommandError::Truncated { field: "opcode" })
        );
        assert_eq!(
            Request::decode(&[0x01, 0x01, 0x06]),
            Err(CommandError::Truncated { field: "size" })
        );
        assert_eq!(Request::decode(&[0x20]), Err(CommandError::UnknownOpcode(0x20)));
    }

    #[test]
    fn json_form_carries_command_tag() {
        let request: Request = serde_json::from_value(serde_json::json!({
            "command": "READ_VALUE",
            "id": [3, 7],
            "type": 6,
            "size": 2
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::ReadValue {
                id: id(&[3, 7]),
                object_type: 6,
                size: 2,
            }
        );

        let reset: Request =
            serde_json::from_value(serde_json::json!({"command": "RESET"})).unwrap();
        assert_eq!(
            reset,
            Request::Reset {
                flags: ResetFlags::default()
            }
        );
    }

    fn arb_id() -> impl Strategy<Value = ObjectId> {
        prop::collection::vec(0u8..=127, 1..6).prop_map(|s| ObjectId::new(s).unwrap())
    }

    fn arb_data() -> impl Strategy<Value = Bytes> {
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Bytes::from)
    }

    fn arb_request() -> impl Strategy<Value = Request> {
        prop_oneof![
            (arb_id(), any::<u8>(), any::<u8>()).prop_map(|(id, object_type, size)| {
                Request::ReadValue {
                    id,
                    object_type,
                    size,
                }
            }),
            (arb_id(), any::<u8>(), any::<u8>(), arb_data()).prop_map(
                |(id, object_type, size, data)| Request::WriteSystemValue {
                    id,
                    object_type,
                    size,
                    data,
                }
            ),
            (any::<u8>(), any::<u8>(), arb_data()).prop_map(|(object_type, size, data)| {
                Request::CreateObject {
                    object_type,
                    size,
                    data,
                }
            }),
            arb_id().prop_map(|id| Request::FreeSlotRoot { id }),
            any::<i8>().prop_map(|profile_id| Request::ListObjects { profile_id }),
            (any::<bool>(), any::<bool>(), prop::option::of(arb_id())).prop_map(
                |(id_chain, system_container, id)| Request::LogValues {
                    flags: LogFlags {
                        id_chain,
                        system_container,
                    },
                    id,
                }
            ),
            (any::<bool>(), any::<bool>()).prop_map(|(erase_eeprom, hard_reset)| {
                Request::Reset {
                    flags: ResetFlags {
                        erase_eeprom,
                        hard_reset,
                    },
                }
            }),
        ]
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(request in arb_request()) {
            let wire = request.to_bytes();
            prop_assert_eq!(wire[0], request.opcode().code());
            prop_assert_eq!(Request::decode(&wire).unwrap(), request);
        }

        #[test]
        fn json_round_trip(request in arb_request()) {
            let json = serde_json::to_value(&request).unwrap();
            prop_assert_eq!(json["command"].as_str(), Some(request.opcode().name()));
            let back: Request = serde_json::from_value(json).unwrap();
            prop_assert_eq!(back, request);
        }
    }
}
