//! Framing for the human-readable byte stream emitted by Spark controllers.
//!
//! The controller interleaves two kinds of output on one serial line:
//! - events: `<!` + text + `>`, anywhere in the stream, even mid-line
//! - data lines: text terminated by `\n`, decorated with `<tag>` annotations
//!
//! [`StreamFramer`] turns raw chunks into [`Message`]s. [`read_some`] and
//! [`LineWriter`] handle the blocking `Read`/`Write` side of the pipe.

#[cfg(feature = "async")]
pub mod codec;
pub mod error;
pub mod framer;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use codec::SparkCodec;
pub use error::{FrameError, Result};
pub use framer::{FramerConfig, Message, StreamFramer};
pub use reader::{read_some, READ_CHUNK_SIZE};
pub use writer::LineWriter;
