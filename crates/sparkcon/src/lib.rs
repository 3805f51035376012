//! Serial communication core for Spark brewing controllers.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial transport trait, serial port stream, device discovery
//! - [`frame`]: event and data line framing of the controller's text stream
//! - [`command`]: binary command protocol (opcodes, object ids, codecs)
//! - [`conduit`]: bound link with event and data consumers

/// Re-export transport types.
pub mod transport {
    pub use sparkcon_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use sparkcon_frame::*;
}

/// Re-export command protocol types.
pub mod command {
    pub use sparkcon_command::*;
}

/// Re-export conduit types.
pub mod conduit {
    pub use sparkcon_conduit::*;
}
