use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use sparkcon_frame::{read_some, LineWriter, Message, StreamFramer, READ_CHUNK_SIZE};
use sparkcon_transport::{SerialStream, Transport};
use tracing::{debug, trace, warn};

use crate::config::ConduitConfig;
use crate::error::{ConduitError, Result};

/// Outcome of handing one message to a consumer.
pub type ConsumerResult = std::result::Result<(), Box<dyn Error + Send + Sync>>;

/// Receiver for event or data text.
pub type Consumer = Box<dyn FnMut(&str) -> ConsumerResult + Send>;

struct Link<T> {
    reader: T,
    writer: LineWriter<T>,
    name: String,
}

/// The link to one controller plus its event and data consumers.
///
/// A conduit is either unbound or bound to one transport. Received bytes go
/// through a [`StreamFramer`]; every completed event is passed to the event
/// consumer and every data line to the data consumer. A missing consumer
/// drops its messages. A consumer that fails is logged and skipped, and
/// delivery carries on with the next message.
pub struct Conduit<T: Transport = SerialStream> {
    config: ConduitConfig,
    link: Option<Link<T>>,
    framer: StreamFramer,
    on_event: Option<Consumer>,
    on_data: Option<Consumer>,
}

impl Conduit<SerialStream> {
    /// Open `device` with the configured serial settings and bind to it.
    pub fn bind(&mut self, device: &str) -> Result<()> {
        let stream = SerialStream::open_with_config(device, &self.config.serial)?;
        self.attach(stream)
    }
}

impl<T: Transport> Conduit<T> {
    /// Create an unbound conduit with default configuration.
    pub fn new() -> Self {
        Self::with_config(ConduitConfig::default())
    }

    /// Create an unbound conduit with explicit configuration.
    pub fn with_config(config: ConduitConfig) -> Self {
        let framer = StreamFramer::with_config(config.framer.clone());
        Self {
            config,
            link: None,
            framer,
            on_event: None,
            on_data: None,
        }
    }

    /// Bind to an already open transport, replacing any current one.
    ///
    /// The request-to-send line is driven low before use.
    pub fn attach(&mut self, mut transport: T) -> Result<()> {
        if self.link.is_some() {
            self.close();
        }

        transport.set_request_to_send(false)?;
        let reader = transport.try_clone_transport()?;
        let name = transport.transport_name().to_string();

        debug!(transport = %name, "conduit bound");
        self.link = Some(Link {
            reader,
            writer: LineWriter::new(transport),
            name,
        });
        Ok(())
    }

    /// Release the transport and drop any partially received bytes.
    ///
    /// Does nothing when unbound.
    pub fn close(&mut self) {
        if let Some(link) = self.link.take() {
            debug!(
                transport = %link.name,
                discarded = self.framer.buffered(),
                "conduit closed"
            );
            self.framer.clear();
        }
    }

    pub fn is_bound(&self) -> bool {
        self.link.is_some()
    }

    /// Send `text` followed by a newline.
    ///
    /// # Panics
    ///
    /// Panics if the conduit is not bound.
    pub fn write(&mut self, text: &str) -> Result<()> {
        let Some(link) = self.link.as_mut() else {
            panic!("write called on an unbound conduit");
        };
        trace!(transport = %link.name, text, "writing line");
        link.writer.write_line(text)?;
        Ok(())
    }

    /// Feed received bytes and dispatch every message they complete.
    ///
    /// Returns the number of messages completed.
    pub fn data_received(&mut self, bytes: &[u8]) -> usize {
        let messages = self.framer.push(bytes);
        let count = messages.len();

        for message in messages {
            match message {
                Message::Event(text) => dispatch(&mut self.on_event, "event", &text),
                Message::Data(text) => dispatch(&mut self.on_data, "data", &text),
            }
        }

        count
    }

    /// One blocking read from the bound transport, dispatched as it arrives.
    ///
    /// A read timeout completes nothing and returns `Ok(0)`.
    pub fn receive(&mut self) -> Result<usize> {
        let link = self.link.as_mut().ok_or(ConduitError::NotBound)?;

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        match read_some(&mut link.reader, &mut chunk)? {
            Some(read) => Ok(self.data_received(&chunk[..read])),
            None => Ok(0),
        }
    }

    /// Receive until `stop` is raised or the transport reaches end of stream.
    ///
    /// `stop` is checked between reads, so shutdown waits at most one read
    /// timeout.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<()> {
        while !stop.load(Ordering::SeqCst) {
            match self.receive() {
                Ok(_) => {}
                Err(err) if err.is_connection_closed() => {
                    debug!("transport reached end of stream");
                    self.close();
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Replace the event consumer.
    ///
    /// Consumers report failure by returning `Err`. The error is logged and
    /// the remaining messages of the same read are still delivered. A
    /// consumer must not panic: a panic unwinds out of `data_received` and
    /// drops whatever that read had not yet dispatched.
    pub fn set_on_event<F>(&mut self, consumer: F)
    where
        F: FnMut(&str) -> ConsumerResult + Send + 'static,
    {
        self.on_event = Some(Box::new(consumer));
    }

    /// Remove the event consumer. Events are dropped until a new one is set.
    pub fn clear_on_event(&mut self) {
        self.on_event = None;
    }

    /// Replace the data consumer. Failure handling is the same as for
    /// [`Conduit::set_on_event`].
    pub fn set_on_data<F>(&mut self, consumer: F)
    where
        F: FnMut(&str) -> ConsumerResult + Send + 'static,
    {
        self.on_data = Some(Box::new(consumer));
    }

    /// Remove the data consumer. Data lines are dropped until a new one is set.
    pub fn clear_on_data(&mut self) {
        self.on_data = None;
    }

    pub fn config(&self) -> &ConduitConfig {
        &self.config
    }

    /// Bytes received but not yet part of a complete message.
    pub fn buffered(&self) -> usize {
        self.framer.buffered()
    }

    /// Borrow the bound transport's write handle.
    pub fn transport(&self) -> Option<&T> {
        self.link.as_ref().map(|link| link.writer.get_ref())
    }
}

impl<T: Transport> Default for Conduit<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> fmt::Debug for Conduit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conduit")
            .field("config", &self.config)
            .field("transport", &self.link.as_ref().map(|link| &link.name))
            .field("buffered", &self.framer.buffered())
            .field("on_event", &self.on_event.is_some())
            .field("on_data", &self.on_data.is_some())
            .finish()
    }
}

fn dispatch(consumer: &mut Option<Consumer>, kind: &'static str, text: &str) {
    let Some(consumer) = consumer.as_mut() else {
        trace!(kind, text, "no consumer, message dropped");
        return;
    };
    if let Err(err) = consumer(text) {
        warn!(kind, text, error = %err, "consumer failed");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{ErrorKind, Read, Write};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Default)]
    struct MockState {
        incoming: VecDeque<Vec<u8>>,
        eof: bool,
        written: Vec<u8>,
        rts: Vec<bool>,
    }

    #[derive(Clone, Default)]
    struct MockTransport {
        state: Arc<Mutex<MockState>>,
    }

    impl MockTransport {
        fn feed(&self, chunk: &[u8]) {
            self.state
                .lock()
                .expect("mock lock")
                .incoming
                .push_back(chunk.to_vec());
        }

        fn hang_up(&self) {
            self.state.lock().expect("mock lock").eof = true;
        }

        fn written(&self) -> Vec<u8> {
            self.state.lock().expect("mock lock").written.clone()
        }

        fn rts(&self) -> Vec<bool> {
            self.state.lock().expect("mock lock").rts.clone()
        }
    }

    impl Read for MockTransport {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let mut state = self.state.lock().expect("mock lock");
            match state.incoming.pop_front() {
                Some(chunk) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        state.incoming.push_front(chunk[n..].to_vec());
                    }
                    Ok(n)
                }
                None if state.eof => Ok(0),
                None => Err(std::io::Error::from(ErrorKind::TimedOut)),
            }
        }
    }

    impl Write for MockTransport {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.state
                .lock()
                .expect("mock lock")
                .written
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Transport for MockTransport {
        fn set_request_to_send(&mut self, level: bool) -> sparkcon_transport::Result<()> {
            self.state.lock().expect("mock lock").rts.push(level);
            Ok(())
        }

        fn try_clone_transport(&self) -> sparkcon_transport::Result<Self> {
            Ok(self.clone())
        }

        fn transport_name(&self) -> &str {
            "mock"
        }
    }

    type Seen = Arc<Mutex<Vec<String>>>;

    fn recorder(seen: &Seen) -> impl FnMut(&str) -> ConsumerResult + Send + 'static {
        let seen = Arc::clone(seen);
        move |text: &str| {
            seen.lock().expect("seen lock").push(text.to_string());
            Ok(())
        }
    }

    fn snapshot(seen: &Seen) -> Vec<String> {
        seen.lock().expect("seen lock").clone()
    }

    fn serial_data() -> Vec<&'static [u8]> {
        vec![
            &b"<add>0A<id>00<OneWir"[..],
            &b"<!connected:sen"[..],
            &b"sor>eTem<!s"[..],
            &b"paced message>pSensor>01<address>28C80E"[..],
            &b"9A0300009C\n"[..],
            &b"34234<!connected:mess<!interrupt>"[..],
            &b"age>\n"[..],
            &b"<!interrupted! "[..],
            &b"message>"[..],
            &b"<invalid! event!>"[..],
        ]
    }

    fn recording_conduit() -> (Conduit<MockTransport>, Seen, Seen) {
        let events = Seen::default();
        let data = Seen::default();
        let mut conduit = Conduit::new();
        conduit.set_on_event(recorder(&events));
        conduit.set_on_data(recorder(&data));
        (conduit, events, data)
    }

    #[test]
    fn dispatches_fixture_stream() {
        let (mut conduit, events, data) = recording_conduit();
        for chunk in serial_data() {
            conduit.data_received(chunk);
        }

        assert_eq!(
            snapshot(&events),
            vec![
                "connected:sensor",
                "spaced message",
                "interrupt",
                "connected:message",
                "interrupted! message",
            ]
        );
        assert_eq!(snapshot(&data), vec!["0A000128C80E9A0300009C", "34234"]);
    }

    #[test]
    fn write_appends_newline() {
        let transport = MockTransport::default();
        let mut conduit = Conduit::new();
        conduit.attach(transport.clone()).expect("attach");

        conduit.write("stuff").expect("write");
        assert_eq!(transport.written(), b"stuff\n");
    }

    #[test]
    #[should_panic(expected = "unbound conduit")]
    fn write_while_unbound_panics() {
        let mut conduit: Conduit<MockTransport> = Conduit::new();
        let _ = conduit.write("stuff");
    }

    #[test]
    fn close_is_idempotent_and_discards_partial_input() {
        let (mut conduit, events, data) = recording_conduit();
        conduit.attach(MockTransport::default()).expect("attach");
        assert!(conduit.is_bound());

        conduit.data_received(b"<!half");
        assert_eq!(conduit.buffered(), 6);

        conduit.close();
        assert!(!conduit.is_bound());
        assert_eq!(conduit.buffered(), 0);
        conduit.close();
        assert!(!conduit.is_bound());

        conduit.data_received(b">\n");
        assert!(snapshot(&events).is_empty());
        assert_eq!(snapshot(&data), vec![">"]);
    }

    #[test]
    fn attach_drives_rts_low() {
        let transport = MockTransport::default();
        let mut conduit = Conduit::new();
        conduit.attach(transport.clone()).expect("attach");
        assert_eq!(transport.rts(), vec![false]);
        assert_eq!(conduit.transport().map(|t| t.transport_name()), Some("mock"));
    }

    #[test]
    fn consumers_can_be_swapped() {
        let (mut conduit, first, _) = recording_conduit();
        conduit.data_received(b"<!one>");

        let second = Seen::default();
        conduit.set_on_event(recorder(&second));
        conduit.data_received(b"<!two>");

        assert_eq!(snapshot(&first), vec!["one"]);
        assert_eq!(snapshot(&second), vec!["two"]);
    }

    #[test]
    fn missing_consumer_drops_messages() {
        let (mut conduit, events, data) = recording_conduit();
        conduit.clear_on_event();
        assert_eq!(conduit.data_received(b"<!lost>AB\n"), 2);
        assert!(snapshot(&events).is_empty());
        assert_eq!(snapshot(&data), vec!["AB"]);

        conduit.clear_on_data();
        assert_eq!(conduit.data_received(b"CD\n"), 1);
        assert_eq!(snapshot(&data), vec!["AB"]);
    }

    #[test]
    fn failing_consumer_does_not_stop_delivery() {
        let (mut conduit, _, data) = recording_conduit();
        let calls = Seen::default();
        let log = Arc::clone(&calls);
        conduit.set_on_event(move |text| {
            log.lock().expect("seen lock").push(text.to_string());
            Err(format!("cannot handle {text}").into())
        });

        conduit.data_received(b"<!a><!b>01\n<!c>");

        assert_eq!(snapshot(&calls), vec!["a", "b", "c"]);
        assert_eq!(snapshot(&data), vec!["01"]);
    }

    #[test]
    fn data_consumer_error_leaves_rest_of_read_intact() {
        let (mut conduit, events, _) = recording_conduit();
        let data = Seen::default();
        let log = Arc::clone(&data);
        conduit.set_on_data(move |text| {
            log.lock().expect("seen lock").push(text.to_string());
            if text == "BAD" {
                return Err("unparsable line".into());
            }
            Ok(())
        });

        assert_eq!(conduit.data_received(b"BAD\n<!after>01\n02"), 3);
        assert_eq!(conduit.buffered(), 2);
        assert_eq!(conduit.data_received(b"\n"), 1);

        assert_eq!(snapshot(&data), vec!["BAD", "01", "02"]);
        assert_eq!(snapshot(&events), vec!["after"]);
    }

    #[test]
    fn receive_reads_and_dispatches() {
        let transport = MockTransport::default();
        let (mut conduit, events, data) = recording_conduit();
        conduit.attach(transport.clone()).expect("attach");

        assert_eq!(conduit.receive().expect("timeout is not an error"), 0);

        transport.feed(b"<!boot>00\n");
        assert_eq!(conduit.receive().expect("receive"), 2);
        assert_eq!(snapshot(&events), vec!["boot"]);
        assert_eq!(snapshot(&data), vec!["00"]);
    }

    #[test]
    fn receive_requires_binding() {
        let mut conduit: Conduit<MockTransport> = Conduit::new();
        assert!(matches!(conduit.receive(), Err(ConduitError::NotBound)));
    }

    #[test]
    fn run_stops_at_end_of_stream() {
        let transport = MockTransport::default();
        let (mut conduit, _, data) = recording_conduit();
        conduit.attach(transport.clone()).expect("attach");

        transport.feed(b"01\n");
        transport.feed(b"02\n");
        transport.hang_up();

        conduit.run(&AtomicBool::new(false)).expect("run");
        assert_eq!(snapshot(&data), vec!["01", "02"]);
        assert!(!conduit.is_bound());
    }

    #[test]
    fn run_honours_stop_flag() {
        let transport = MockTransport::default();
        let (mut conduit, _, data) = recording_conduit();
        conduit.attach(transport.clone()).expect("attach");
        transport.feed(b"01\n");

        conduit.run(&AtomicBool::new(true)).expect("run");
        assert!(snapshot(&data).is_empty());
        assert!(conduit.is_bound());
    }

    #[test]
    fn reattach_replaces_link() {
        let first = MockTransport::default();
        let second = MockTransport::default();
        let mut conduit = Conduit::new();

        conduit.attach(first.clone()).expect("attach first");
        conduit.data_received(b"partial");
        conduit.attach(second.clone()).expect("attach second");
        assert_eq!(conduit.buffered(), 0);

        conduit.write("x").expect("write");
        assert!(first.written().is_empty());
        assert_eq!(second.written(), b"x\n");
    }
}
