use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use sparkcon_conduit::{Conduit, ConsumerResult};
use sparkcon_frame::Message;
use tracing::info;

use crate::cmd::MonitorArgs;
use crate::exit::{conduit_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    if args.count == Some(0) {
        return Ok(SUCCESS);
    }

    let device = args.device.resolve_device()?;
    let mut conduit: Conduit = Conduit::with_config(args.device.conduit_config()?);

    let stop = Arc::new(AtomicBool::new(false));
    install_ctrlc_handler(Arc::clone(&stop))?;

    let printer = Printer {
        format,
        limit: args.count,
        printed: Arc::new(AtomicUsize::new(0)),
        stop: Arc::clone(&stop),
    };
    if !args.data_only {
        conduit.set_on_event(printer.consumer(Message::Event));
    }
    if !args.events_only {
        conduit.set_on_data(printer.consumer(Message::Data));
    }

    conduit
        .bind(&device)
        .map_err(|err| conduit_error("bind failed", err))?;
    info!(device = %device, "monitoring controller output");

    conduit
        .run(&stop)
        .map_err(|err| conduit_error("receive failed", err))?;
    conduit.close();

    Ok(SUCCESS)
}

/// Shared print state of the event and data consumers.
#[derive(Clone)]
struct Printer {
    format: OutputFormat,
    limit: Option<usize>,
    printed: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
}

impl Printer {
    fn consumer(
        &self,
        wrap: fn(String) -> Message,
    ) -> impl FnMut(&str) -> ConsumerResult + Send + 'static {
        let printer = self.clone();
        move |text: &str| {
            printer.print(&wrap(text.to_string()));
            Ok(())
        }
    }

    /// Print unless the limit was already reached; raise `stop` on reaching it.
    fn print(&self, message: &Message) -> bool {
        if self.stop.load(Ordering::SeqCst) {
            return false;
        }
        print_message(message, self.format);
        let printed = self.printed.fetch_add(1, Ordering::SeqCst) + 1;
        if self.limit.is_some_and(|limit| printed >= limit) {
            self.stop.store(true, Ordering::SeqCst);
        }
        true
    }
}

fn install_ctrlc_handler(stop: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printer(limit: Option<usize>) -> Printer {
        Printer {
            format: OutputFormat::Pretty,
            limit,
            printed: Arc::new(AtomicUsize::new(0)),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    #[test]
    fn limit_raises_stop_and_suppresses_rest() {
        let printer = printer(Some(2));
        assert!(printer.print(&Message::Event("a".to_string())));
        assert!(!printer.stop.load(Ordering::SeqCst));
        assert!(printer.print(&Message::Data("b".to_string())));
        assert!(printer.stop.load(Ordering::SeqCst));
        assert!(!printer.print(&Message::Data("c".to_string())));
        assert_eq!(printer.printed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn consumers_share_the_count() {
        let printer = printer(Some(2));
        let mut events = printer.consumer(Message::Event);
        let mut data = printer.consumer(Message::Data);
        events("x").unwrap();
        data("y").unwrap();
        assert!(printer.stop.load(Ordering::SeqCst));
    }

    #[test]
    fn unlimited_never_stops() {
        let printer = printer(None);
        for _ in 0..10 {
            printer.print(&Message::Data("z".to_string()));
        }
        assert!(!printer.stop.load(Ordering::SeqCst));
    }
}
