//! Binary command protocol spoken by Spark controllers.
//!
//! A request is one opcode byte followed by kind-specific fields. A response
//! is one signed status byte followed by fields, which are left out when the
//! status is negative. Object ids use a variable-length encoding where every
//! byte but the last carries a container flag.
//!
//! ```
//! use sparkcon_command::Command;
//! use serde_json::json;
//!
//! let mut command = Command::from_decoded("READ_VALUE", json!({"id": [3, 7], "type": 6, "size": 2}))?;
//! assert_eq!(command.encoded_request_hex().as_deref(), Some("0183070602"));
//!
//! command.set_encoded_response_hex("000602BEEF")?;
//! assert!(matches!(command.decoded_response()?, Some(Ok(_))));
//! # Ok::<(), sparkcon_command::CommandError>(())
//! ```

pub mod command;
pub mod error;
pub mod id;
pub mod opcode;
pub mod registry;
pub mod request;
pub mod response;
mod wire;

pub use command::{Command, DecodedResponse};
pub use error::{CommandError, CommandFailure, Result};
pub use id::ObjectId;
pub use opcode::{ErrorCode, Opcode};
pub use registry::{
    definition, definition_for_name, definition_for_opcode, definitions, CommandDefinition, Field,
    ResponseLayout,
};
pub use request::{LogFlags, Request, ResetFlags};
pub use response::{ObjectRecord, ObjectValue, Response};
