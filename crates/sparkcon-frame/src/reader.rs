use std::io::{ErrorKind, Read};

use crate::error::{FrameError, Result};

/// Bytes requested from the stream per read.
pub const READ_CHUNK_SIZE: usize = 1024;

/// One blocking read that treats a timeout as "nothing yet".
///
/// Returns `Ok(None)` on timeout, `Ok(Some(n))` when `n > 0` bytes arrived
/// and `Err(FrameError::ConnectionClosed)` at end of stream.
pub fn read_some<R: Read + ?Sized>(inner: &mut R, buf: &mut [u8]) -> Result<Option<usize>> {
    loop {
        match inner.read(buf) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => return Ok(Some(n)),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::TimedOut => return Ok(None),
            Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(None),
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}
