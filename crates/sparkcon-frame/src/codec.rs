//! `tokio_util::codec` adapter for the stream framer.

use std::collections::VecDeque;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::FrameError;
use crate::framer::{FramerConfig, Message, StreamFramer};
use crate::writer::LINE_TERMINATOR;

/// Decodes controller output into [`Message`]s and encodes outgoing lines.
///
/// Use with `FramedRead`/`Framed` over an async serial stream.
#[derive(Debug, Default)]
pub struct SparkCodec {
    framer: StreamFramer,
    pending: VecDeque<Message>,
}

impl SparkCodec {
    /// Create a codec with default framer configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with explicit framer configuration.
    pub fn with_config(config: FramerConfig) -> Self {
        Self {
            framer: StreamFramer::with_config(config),
            pending: VecDeque::new(),
        }
    }
}

impl Decoder for SparkCodec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, FrameError> {
        if !src.is_empty() {
            let chunk = src.split();
            self.pending.extend(self.framer.push(&chunk));
        }
        Ok(self.pending.pop_front())
    }
}

impl Encoder<&str> for SparkCodec {
    type Error = FrameError;

    fn encode(&mut self, line: &str, dst: &mut BytesMut) -> Result<(), FrameError> {
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(LINE_TERMINATOR);
        Ok(())
    }
}
