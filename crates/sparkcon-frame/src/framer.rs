use bytes::{Buf, BufMut, BytesMut};
use tracing::{trace, warn};

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// One decoded unit of controller output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Out-of-band notification (`<!...>`), delivered as soon as it is complete.
    Event(String),
    /// A newline-terminated line with its decorative tags stripped.
    Data(String),
}

impl Message {
    /// The message text, regardless of kind.
    pub fn text(&self) -> &str {
        match self {
            Message::Event(text) | Message::Data(text) => text,
        }
    }
}

/// Configuration for the stream framer.
#[derive(Debug, Clone, Default)]
pub struct FramerConfig {
    /// Upper bound for the unterminated remainder of the buffer.
    ///
    /// `None` (the default) buffers without limit. When set, a remainder that
    /// grows beyond it is discarded.
    pub max_buffer_size: Option<usize>,
}

/// Reconstructs events and data lines from arbitrarily chunked input.
///
/// Every [`push`](Self::push) appends the chunk and runs two passes:
///
/// 1. Event pass: every complete `<!...>` is cut out of the buffer and
///    emitted. Cutting can join the text around it into a new complete event
///    (`<!A<!B>C>` yields `B`, then `AC`).
/// 2. Line pass: every complete line has its `<...>` tags removed and, if
///    anything is left, is emitted as data.
///
/// Anything without a terminator stays buffered for the next call.
///
/// The event pass keeps the positions of every `<` still in the buffer. A
/// `>` can only close an event opened by the last of them, so each byte is
/// handled once no matter how deeply partial tags are nested.
#[derive(Debug)]
pub struct StreamFramer {
    buf: BytesMut,
    opens: Vec<usize>,
    config: FramerConfig,
}

impl StreamFramer {
    /// Create a framer with default configuration.
    pub fn new() -> Self {
        Self::with_config(FramerConfig::default())
    }

    /// Create a framer with explicit configuration.
    pub fn with_config(config: FramerConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            opens: Vec::new(),
            config,
        }
    }

    /// Append raw bytes and return every message they completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Message> {
        let mut messages = Vec::new();
        self.extract_events(chunk, &mut messages);
        self.extract_lines(&mut messages);
        self.enforce_limit();
        messages
    }

    /// Number of bytes waiting for a terminator.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Discard all buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.opens.clear();
    }

    /// Current framer configuration.
    pub fn config(&self) -> &FramerConfig {
        &self.config
    }

    fn extract_events(&mut self, chunk: &[u8], out: &mut Vec<Message>) {
        self.buf.reserve(chunk.len());

        for &byte in chunk {
            match byte {
                b'<' => self.opens.push(self.buf.len()),
                b'>' => {
                    if let Some(&open) = self.opens.last() {
                        if self.buf.get(open + 1) == Some(&b'!') {
                            let text = String::from_utf8_lossy(&self.buf[open + 2..]).into_owned();
                            trace!(event = %text, "extracted event");
                            out.push(Message::Event(text));
                            self.buf.truncate(open);
                            self.opens.pop();
                            continue;
                        }
                    }
                }
                _ => {}
            }
            self.buf.put_u8(byte);
        }
    }

    fn extract_lines(&mut self, out: &mut Vec<Message>) {
        let mut consumed = 0usize;

        while let Some(newline) = self.buf.iter().position(|&b| b == b'\n') {
            let stripped = strip_tags(&self.buf[..newline]);
            self.buf.advance(newline + 1);
            consumed += newline + 1;

            if !stripped.is_empty() {
                out.push(Message::Data(String::from_utf8_lossy(&stripped).into_owned()));
            }
        }

        if consumed > 0 {
            let gone = self.opens.partition_point(|&pos| pos < consumed);
            self.opens.drain(..gone);
            for pos in &mut self.opens {
                *pos -= consumed;
            }
        }
    }

    fn enforce_limit(&mut self) {
        if let Some(max) = self.config.max_buffer_size {
            if self.buf.len() > max {
                warn!(
                    buffered = self.buf.len(),
                    max, "discarding unterminated input over buffer limit"
                );
                self.clear();
            }
        }
    }
}

impl Default for StreamFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove every `<...>` tag from a line in a single left-to-right pass.
fn strip_tags(line: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len());
    let mut i = 0usize;

    while i < line.len() {
        if line[i] == b'<' {
            let rest = &line[i + 1..];
            if let Some(end) = rest.iter().position(|&b| b == b'<' || b == b'>') {
                if rest[end] == b'>' {
                    i += end + 2;
                    continue;
                }
            }
        }
        out.push(line[i]);
        i += 1;
    }

    out
}
