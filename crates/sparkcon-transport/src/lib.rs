//! Serial transport abstraction for Spark controllers.
//!
//! Provides the byte pipe everything else is built on:
//! - [`Transport`], the trait a conduit reads from and writes to
//! - [`SerialStream`], the serial port implementation
//! - [`discovery`], enumeration and matching of attached devices
//!
//! This is the lowest layer of sparkcon.

pub mod discovery;
pub mod error;
pub mod serial;
pub mod traits;

pub use discovery::{
    detect_device, list_all_ports, list_recognized_ports, select_device, PortInfo, KNOWN_HWIDS,
};
pub use error::{Result, TransportError};
pub use serial::{SerialConfig, SerialStream, DEFAULT_BAUD_RATE};
pub use traits::Transport;
