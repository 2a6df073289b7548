// src/events.rs
// =============================================================================
// Observability for the crawl engine.
//
// The engine never prints. Instead it reports what it is doing to an
// EventSink that is handed in by the caller. The sink is fire-and-forget:
// nothing in the crawl ever looks at what it does.
//
// TracingEvents is the sink the CLI uses; it forwards everything to `tracing`
// so RUST_LOG controls what you see.
// =============================================================================

use std::error::Error;
use std::fmt;

/// Receives events as they happen during a crawl
///
/// `context` says who is talking (the run, a worker), `event` names the
/// operation, and `message` carries the details.
pub trait EventSink: Send + Sync {
    fn event(&self, context: &str, event: &str, message: fmt::Arguments<'_>);

    fn error_event(
        &self,
        context: &str,
        event: &str,
        err: &(dyn Error + 'static),
        message: fmt::Arguments<'_>,
    );
}

/// Forwards events to the `tracing` macros
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl EventSink for TracingEvents {
    fn event(&self, context: &str, event: &str, message: fmt::Arguments<'_>) {
        tracing::info!(context, event, "{}", message);
    }

    fn error_event(
        &self,
        context: &str,
        event: &str,
        err: &(dyn Error + 'static),
        message: fmt::Arguments<'_>,
    ) {
        tracing::error!(context, event, error = %err, "{}", message);
    }
}

/// Drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl EventSink for NoopEvents {
    fn event(&self, _context: &str, _event: &str, _message: fmt::Arguments<'_>) {}

    fn error_event(
        &self,
        _context: &str,
        _event: &str,
        _err: &(dyn Error + 'static),
        _message: fmt::Arguments<'_>,
    ) {
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every event as "event: message" so tests can assert on them
    #[derive(Debug, Default)]
    pub struct RecordingEvents {
        pub events: Mutex<Vec<String>>,
        pub errors: Mutex<Vec<String>>,
    }

    impl RecordingEvents {
        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        pub fn errors(&self) -> Vec<String> {
            self.errors.lock().unwrap().clone()
        }
    }

    impl EventSink for RecordingEvents {
        fn event(&self, _context: &str, event: &str, message: fmt::Arguments<'_>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{}: {}", event, message));
        }

        fn error_event(
            &self,
            _context: &str,
            event: &str,
            err: &(dyn Error + 'static),
            message: fmt::Arguments<'_>,
        ) {
            self.errors
                .lock()
                .unwrap()
                .push(format!("{}: {}: {}", event, message, err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingEvents;
    use super::*;

    #[test]
    fn test_recording_sink_formats_messages() {
        let sink = RecordingEvents::default();
        sink.event("run", "Run", format_args!("Started : URL[{}]", "http://a"));

        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        sink.error_event("run", "Run", &err, format_args!("Completed"));

        assert_eq!(sink.events(), vec!["Run: Started : URL[http://a]"]);
        assert_eq!(sink.errors(), vec!["Run: Completed: boom"]);
    }

    #[test]
    fn test_tracing_sink_does_not_panic_without_subscriber() {
        let sink = TracingEvents;
        sink.event("run", "Run", format_args!("no subscriber installed"));
    }
}
