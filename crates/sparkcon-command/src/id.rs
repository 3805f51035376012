//! Variable-length object ids.
//!
//! Each id segment is 7 bits wide. On the wire every segment except the last
//! carries the high bit as a "container, more to follow" flag:
//!
//! ```text
//! [1000 0011] [0000 0111]   container 3 holds object 7
//! ```

use std::fmt;

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{CommandError, Result};

const NESTING_FLAG: u8 = 0x80;
const SEGMENT_MASK: u8 = 0x7F;

/// Path through nested containers to an object, outermost container first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct ObjectId(Vec<u8>);

impl ObjectId {
    /// Validate and wrap id segments.
    pub fn new(segments: impl Into<Vec<u8>>) -> Result<Self> {
        let segments = segments.into();
        if segments.is_empty() {
            return Err(CommandError::InvalidObjectId(
                "object id must have at least one segment".to_string(),
            ));
        }
        if let Some(&bad) = segments.iter().find(|&&s| s > SEGMENT_MASK) {
            return Err(CommandError::InvalidObjectId(format!(
                "segment {bad} exceeds 127"
            )));
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes [`encode`](Self::encode) writes.
    pub fn encoded_len(&self) -> usize {
        self.0.len()
    }

    /// Append the wire form to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) {
        let last = self.0.len() - 1;
        for (index, &segment) in self.0.iter().enumerate() {
            if index < last {
                dst.put_u8(segment | NESTING_FLAG);
            } else {
                dst.put_u8(segment);
            }
        }
    }

    /// Read one id from the front of `src`, advancing past it.
    pub fn decode(src: &mut &[u8]) -> Result<Self> {
        let mut segments = Vec::new();
        loop {
            if !src.has_remaining() {
                return Err(CommandError::Truncated { field: "id" });
            }
            let byte = src.get_u8();
            segments.push(byte & SEGMENT_MASK);
            if byte & NESTING_FLAG == 0 {
                return Ok(Self(segments));
            }
        }
    }
}

impl TryFrom<Vec<u8>> for ObjectId {
    type Error = CommandError;

    fn try_from(segments: Vec<u8>) -> Result<Self> {
        Self::new(segments)
    }
}

impl From<ObjectId> for Vec<u8> {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
