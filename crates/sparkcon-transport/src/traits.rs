use std::io::{Read, Write};

use crate::error::Result;

/// A connected byte pipe to a controller.
///
/// The serial implementation is [`crate::SerialStream`]. Conduits are generic
/// over this trait so that tests and alternative links (for example a TCP
/// bridge to a remote serial port) can stand in for real hardware.
pub trait Transport: Read + Write + Send {
    /// Drive the hardware request-to-send line.
    ///
    /// Transports without control lines accept and ignore the call.
    fn set_request_to_send(&mut self, level: bool) -> Result<()>;

    /// Try to clone this transport (a second handle on the same link).
    fn try_clone_transport(&self) -> Result<Self>
    where
        Self: Sized;

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &str;
}
