use bytes::{BufMut, Bytes, BytesMut};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{CommandError, CommandFailure, Result};
use crate::opcode::{ErrorCode, Opcode};
use crate::registry::{self, CommandDefinition};
use crate::request::Request;
use crate::response::Response;

/// Outcome carried by a response: fields on success, the failure otherwise.
pub type DecodedResponse = std::result::Result<Response, CommandFailure>;

/// One request/response exchange in both encoded and decoded form.
///
/// Holds up to four slots. Each accessor fills its slot from the
/// counterpart on first use and returns the cached value afterwards.
#[derive(Debug, Clone)]
pub struct Command {
    definition: &'static CommandDefinition,
    encoded_request: Option<Bytes>,
    encoded_response: Option<Bytes>,
    decoded_request: Option<Request>,
    decoded_response: Option<DecodedResponse>,
}

impl Command {
    /// Wrap a typed request.
    pub fn new(request: Request) -> Self {
        Self {
            definition: registry::definition(request.opcode()),
            encoded_request: None,
            encoded_response: None,
            decoded_request: Some(request),
            decoded_response: None,
        }
    }

    /// Build a command from its name and a JSON field mapping.
    ///
    /// `fields` may be `null` for kinds without request fields. Keys must
    /// match the kind's request layout.
    pub fn from_decoded(name: &str, fields: Value) -> Result<Self> {
        let definition = registry::definition_for_name(name)?;
        let opcode = definition.opcode;

        let mut map = match fields {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(CommandError::InvalidFields {
                    opcode,
                    message: format!("expected a field mapping, got {other}"),
                })
            }
        };

        if let Some(key) = map.keys().find(|key| !definition.accepts_field(key)) {
            return Err(CommandError::InvalidFields {
                opcode,
                message: format!("unexpected field `{key}`"),
            });
        }

        map.insert(
            "command".to_string(),
            Value::String(definition.name().to_string()),
        );
        let request: Request =
            serde_json::from_value(Value::Object(map)).map_err(|err| {
                CommandError::InvalidFields {
                    opcode,
                    message: err.to_string(),
                }
            })?;

        Ok(Self::new(request))
    }

    /// Build a command from raw bytes. The first request byte picks the kind.
    pub fn from_encoded(request: &[u8], response: Option<&[u8]>) -> Result<Self> {
        let code = *request
            .first()
            .ok_or(CommandError::Truncated { field: "opcode" })?;
        let definition = registry::definition_for_opcode(code)?;

        Ok(Self {
            definition,
            encoded_request: Some(Bytes::copy_from_slice(request)),
            encoded_response: response.map(Bytes::copy_from_slice),
            decoded_request: None,
            decoded_response: None,
        })
    }

    pub fn definition(&self) -> &'static CommandDefinition {
        self.definition
    }

    pub fn opcode(&self) -> Opcode {
        self.definition.opcode
    }

    /// Attach the raw response matched to this request, status byte first.
    ///
    /// Replaces any response set earlier.
    pub fn set_encoded_response(&mut self, response: impl Into<Bytes>) {
        self.encoded_response = Some(response.into());
        self.decoded_response = None;
    }

    /// Attach a response received as hex text.
    pub fn set_encoded_response_hex(&mut self, text: &str) -> Result<()> {
        let raw = hex::decode(text.trim()).map_err(|err| CommandError::InvalidHex(err.to_string()))?;
        self.set_encoded_response(raw);
        Ok(())
    }

    /// Attach a decoded response. Replaces any response set earlier.
    pub fn set_decoded_response(&mut self, response: DecodedResponse) {
        self.decoded_response = Some(response);
        self.encoded_response = None;
    }

    pub fn encoded_request(&mut self) -> Option<&Bytes> {
        if self.encoded_request.is_none() {
            if let Some(request) = &self.decoded_request {
                self.encoded_request = Some(request.to_bytes());
            }
        }
        self.encoded_request.as_ref()
    }

    /// Upper-case hex text of the encoded request, as sent over serial.
    pub fn encoded_request_hex(&mut self) -> Option<String> {
        self.encoded_request().map(hex::encode_upper)
    }

    pub fn encoded_response(&mut self) -> Result<Option<&Bytes>> {
        if self.encoded_response.is_none() {
            if let Some(decoded) = &self.decoded_response {
                let opcode = self.definition.opcode;
                self.encoded_response = Some(encode_response(opcode, decoded)?);
            }
        }
        Ok(self.encoded_response.as_ref())
    }

    pub fn decoded_request(&mut self) -> Result<Option<&Request>> {
        if self.decoded_request.is_none() {
            if let Some(raw) = &self.encoded_request {
                self.decoded_request = Some(Request::decode(raw)?);
            }
        }
        Ok(self.decoded_request.as_ref())
    }

    /// Decoded response fields, or the failure a negative status announced.
    pub fn decoded_response(&mut self) -> Result<Option<&DecodedResponse>> {
        if self.decoded_response.is_none() {
            if let Some(raw) = &self.encoded_response {
                let opcode = self.definition.opcode;
                self.decoded_response = Some(decode_response(opcode, raw)?);
            }
        }
        Ok(self.decoded_response.as_ref())
    }
}

fn encode_response(opcode: Opcode, decoded: &DecodedResponse) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    match decoded {
        Ok(response) => {
            buf.put_i8(ErrorCode::Ok.code());
            response.encode(opcode, &mut buf)?;
        }
        Err(failure) => buf.put_i8(failure.code),
    }
    Ok(buf.freeze())
}

fn decode_response(opcode: Opcode, raw: &[u8]) -> Result<DecodedResponse> {
    let (&status, fields) = raw
        .split_first()
        .ok_or(CommandError::Truncated { field: "status" })?;
    let code = status as i8;

    if code < 0 {
        let error = ErrorCode::for_status(code);
        trace!(%opcode, code, %error, "command failed");
        return Ok(Err(CommandFailure {
            opcode,
            code,
            error,
        }));
    }

    Response::decode(opcode, fields).map(Ok)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::id::ObjectId;
    use crate::request::{LogFlags, ResetFlags};
    use crate::response::{ObjectRecord, ObjectValue};

    #[test]
    fn decoded_to_encoded_request() {
        let mut command =
            Command::from_decoded("read_value", json!({"id": [3, 7], "type": 6, "size": 2}))
                .unwrap();
        assert_eq!(command.opcode(), Opcode::ReadValue);
        assert_eq!(
            &command.encoded_request().unwrap()[..],
            &[0x01, 0x83, 0x07, 0x06, 0x02]
        );
        assert_eq!(command.encoded_request_hex().unwrap(), "0183070602");
        assert!(command.encoded_response().unwrap().is_none());
        assert!(command.decoded_response().unwrap().is_none());
    }

    #[test]
    fn encoded_to_decoded_exchange() {
        let mut command =
            Command::from_encoded(&[0x0F, 0x02, 0x06, 0x02], Some(&[0x00, 0x06, 0x02, 0xBE, 0xEF]))
                .unwrap();

        assert_eq!(
            command.decoded_request().unwrap(),
            Some(&Request::ReadSystemValue {
                id: ObjectId::new([2]).unwrap(),
                object_type: 6,
                size: 2,
            })
        );
        assert_eq!(
            command.decoded_response().unwrap(),
            Some(&Ok(Response::Value(ObjectValue {
                object_type: 6,
                size: 2,
                data: Bytes::from_static(&[0xBE, 0xEF]),
            })))
        );
    }

    #[test]
    fn negative_status_short_circuits() {
        // Fields after the status would not parse; they must not be read.
        let mut command = Command::from_encoded(&[0x05, 0x00], Some(&[0xBF, 0xFF, 0xFF])).unwrap();
        let decoded = command.decoded_response().unwrap().unwrap().clone();
        assert_eq!(
            decoded,
            Err(CommandFailure {
                opcode: Opcode::ListObjects,
                code: -65,
                error: ErrorCode::InvalidObjectId,
            })
        );
    }

    #[test]
    fn unknown_negative_status_keeps_code() {
        let mut command = Command::from_encoded(&[0x07], Some(&[0x9C])).unwrap();
        let decoded = command.decoded_response().unwrap().unwrap().clone();
        let failure = decoded.unwrap_err();
        assert_eq!(failure.code, -100);
        assert_eq!(failure.error, ErrorCode::UnknownError);
    }

    #[test]
    fn failure_encodes_as_bare_status() {
        let mut command = Command::new(Request::DeleteObject {
            id: ObjectId::new([4]).unwrap(),
        });
        command.set_decoded_response(Err(CommandFailure {
            opcode: Opcode::DeleteObject,
            code: -35,
            error: ErrorCode::ObjectNotDeletable,
        }));
        assert_eq!(&command.encoded_response().unwrap().unwrap()[..], &[0xDD]);
    }

    #[test]
    fn decoded_response_to_encoded() {
        let mut command = Command::new(Request::LogValues {
            flags: LogFlags::default(),
            id: None,
        });
        command.set_decoded_response(Ok(Response::Objects {
            objects: vec![ObjectRecord {
                id: ObjectId::new([1]).unwrap(),
                object_type: 2,
                size: 1,
                data: Bytes::from_static(&[0x33]),
            }],
        }));
        assert_eq!(
            &command.encoded_response().unwrap().unwrap()[..],
            &[0x00, 0x01, 0x02, 0x01, 0x33, 0x00]
        );
    }

    #[test]
    fn hex_response_attaches_and_replaces() {
        let mut command = Command::from_decoded("CREATE_PROFILE", Value::Null).unwrap();
        command.set_encoded_response_hex("0003").unwrap();
        assert_eq!(
            command.decoded_response().unwrap(),
            Some(&Ok(Response::Profile { profile_id: 3 }))
        );

        command.set_encoded_response_hex("FD\n").unwrap();
        assert!(matches!(
            command.decoded_response().unwrap(),
            Some(Err(CommandFailure {
                error: ErrorCode::ProfileNotActive,
                ..
            }))
        ));

        assert!(matches!(
            command.set_encoded_response_hex("XYZ"),
            Err(CommandError::InvalidHex(_))
        ));
    }

    #[test]
    fn slots_are_cached() {
        let mut command = Command::from_encoded(&[0x0B, 0x02], None).unwrap();
        let first = command.decoded_request().unwrap().cloned();
        assert_eq!(
            first,
            Some(Request::Reset {
                flags: ResetFlags {
                    erase_eeprom: false,
                    hard_reset: true,
                },
            })
        );
        let encoded = command.encoded_request().unwrap().clone();
        assert_eq!(&encoded[..], &[0x0B, 0x02]);
        assert_eq!(command.decoded_request().unwrap().cloned(), first);
    }

    #[test]
    fn unknown_name_and_opcode() {
        assert_eq!(
            Command::from_decoded("brew_coffee", json!({})).unwrap_err(),
            CommandError::UnknownCommand("brew_coffee".to_string())
        );
        assert_eq!(
            Command::from_encoded(&[0x42], None).unwrap_err(),
            CommandError::UnknownOpcode(0x42)
        );
        assert_eq!(
            Command::from_encoded(&[], None).unwrap_err(),
            CommandError::Truncated { field: "opcode" }
        );
    }

    #[test]
    fn fields_must_fit_layout() {
        let err = Command::from_decoded("delete_object", json!({"profile_id": 1})).unwrap_err();
        assert!(matches!(err, CommandError::InvalidFields { opcode: Opcode::DeleteObject, .. }));

        let err = Command::from_decoded("delete_object", json!({})).unwrap_err();
        assert!(matches!(err, CommandError::InvalidFields { .. }));

        let err = Command::from_decoded("read_value", json!([1, 2])).unwrap_err();
        assert!(matches!(err, CommandError::InvalidFields { .. }));

        let err = Command::from_decoded("delete_object", json!({"id": [128]})).unwrap_err();
        assert!(matches!(err, CommandError::InvalidFields { .. }));
    }

    #[test]
    fn malformed_encoded_request_surfaces_on_access() {
        let mut command = Command::from_encoded(&[0x04], None).unwrap();
        assert_eq!(
            command.decoded_request().unwrap_err(),
            CommandError::Truncated { field: "id" }
        );
    }

    #[test]
    fn every_kind_round_trips_through_command() {
        let cases = [
            json!({"id": [1], "type": 2, "size": 3}),
            json!({"id": [1], "type": 2, "size": 1, "data": [9]}),
            json!({"type": 2, "size": 1, "data": [9]}),
            json!({"id": [1, 2]}),
            json!({"profile_id": 0}),
            json!({"id": [5]}),
            json!({}),
            json!({"profile_id": 2}),
            json!({"profile_id": -1}),
            json!({"flags": {"id_chain": true}, "id": [7]}),
            json!({"flags": {"erase_eeprom": true, "hard_reset": true}}),
            json!({"id": [0]}),
            json!(null),
            json!({}),
            json!({"id": [1], "type": 2, "size": 3}),
            json!({"id": [1], "type": 2, "size": 0, "data": []}),
        ];

        for (definition, fields) in registry::definitions().iter().zip(cases) {
            let mut built = Command::from_decoded(definition.name(), fields).unwrap();
            let request = built.decoded_request().unwrap().unwrap().clone();
            let wire = built.encoded_request().unwrap().clone();
            assert_eq!(wire[0], definition.opcode.code());

            let mut parsed = Command::from_encoded(&wire, None).unwrap();
            assert_eq!(parsed.decoded_request().unwrap(), Some(&request));
        }
    }
}
