//! Serial conduit for Spark controllers.
//!
//! A [`Conduit`] owns the link to one controller. Bytes it receives are
//! framed into events and data lines and handed to two replaceable
//! consumers. Outgoing text is written as newline-terminated lines.
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//!
//! use sparkcon_conduit::Conduit;
//!
//! let mut conduit: Conduit = Conduit::new();
//! conduit.set_on_event(|event| {
//!     println!("event: {event}");
//!     Ok(())
//! });
//! conduit.set_on_data(|line| {
//!     println!("data: {line}");
//!     Ok(())
//! });
//!
//! let device = sparkcon_transport::detect_device(None, None)?;
//! conduit.bind(&device)?;
//! conduit.write("0E")?;
//! conduit.run(&AtomicBool::new(false))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod conduit;
pub mod config;
pub mod error;

pub use conduit::{Conduit, Consumer, ConsumerResult};
pub use config::ConduitConfig;
pub use error::{ConduitError, Result};
