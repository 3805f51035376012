//! Cursor helpers shared by the request and response codecs.

use bytes::{Buf, Bytes};

use crate::error::{CommandError, Result};
use crate::opcode::Opcode;

pub(crate) fn get_u8(src: &mut &[u8], field: &'static str) -> Result<u8> {
    if !src.has_remaining() {
        return Err(CommandError::Truncated { field });
    }
    Ok(src.get_u8())
}

pub(crate) fn get_i8(src: &mut &[u8], field: &'static str) -> Result<i8> {
    if !src.has_remaining() {
        return Err(CommandError::Truncated { field });
    }
    Ok(src.get_i8())
}

/// Exactly `len` bytes of object data.
pub(crate) fn get_data(src: &mut &[u8], len: usize) -> Result<Bytes> {
    if src.remaining() < len {
        return Err(CommandError::Truncated { field: "data" });
    }
    Ok(src.copy_to_bytes(len))
}

/// Everything left, as trailing object data.
pub(crate) fn rest(src: &mut &[u8]) -> Bytes {
    src.copy_to_bytes(src.remaining())
}

pub(crate) fn finish(src: &[u8], opcode: Opcode) -> Result<()> {
    if src.is_empty() {
        Ok(())
    } else {
        Err(CommandError::TrailingBytes {
            opcode,
            count: src.len(),
        })
    }
}

/// True once the cursor sits on the final 0x00 list terminator.
pub(crate) fn at_terminator(src: &[u8]) -> Result<bool> {
    match src {
        [] => Err(CommandError::MissingTerminator),
        [0x00] => Ok(true),
        _ => Ok(false),
    }
}
