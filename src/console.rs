//! User-facing output.
//!
//! Every line a user is meant to read goes through [`Console`]: published
//! readings, delivery errors, fatal errors and the usage text. Diagnostics go
//! through the logging macros instead and end up on stderr.
//!
//! A `Console` is cheap to clone and safe to use from the error callback's
//! task.

use std::error::Error as StdError;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::Local;

use crate::{AttributeValue, ErrorEvent};

/// Timestamp format of reading and delivery-error lines.
///
/// `%Z` on local time renders the UTC offset, e.g.
/// `Mon Oct 19 04:28:00 +00:00 2026`.
pub const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S %Z %Y";

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Line-oriented writer for user-facing output.
#[derive(Clone)]
pub struct Console {
    sink: Sink,
}

/// Text written to a capturing [`Console`].
#[derive(Clone, Default)]
pub struct Captured {
    buffer: Arc<Mutex<Vec<u8>>>,
}

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&lock(&self.buffer)).into_owned()
    }

    /// Written lines, without trailing newlines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Console {
    // ---

    /// A console on the process's standard output.
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// A console that records into memory, for tests and embedders.
    pub fn capture() -> (Self, Captured) {
        let captured = Captured::default();
        let console = Self::from_writer(CaptureWriter(Arc::clone(&captured.buffer)));
        (console, captured)
    }

    /// Write one line.
    ///
    /// Output failures are dropped: there is nowhere better to report them.
    pub fn line(&self, text: impl fmt::Display) {
        let mut sink = lock(&self.sink);
        let _ = writeln!(sink, "{text}");
        let _ = sink.flush();
    }

    /// `<timestamp> : <endpoint-id> : Set : "<attribute>"=<value>`
    pub fn reading(&self, endpoint_id: &str, attribute: &str, value: &AttributeValue) {
        self.line(format_args!(
            "{} : {endpoint_id} : Set : \"{attribute}\"={value}",
            timestamp()
        ));
    }

    /// `<timestamp> : onError : <endpoint-id> : "<message>"`
    pub fn delivery_error(&self, event: &ErrorEvent) {
        self.line(format_args!(
            "{} : onError : {} : \"{}\"",
            timestamp(),
            event.endpoint_id,
            event.message
        ));
    }

    /// Fatal error text followed by the usage reminder.
    pub fn fatal(&self, err: &(dyn StdError + 'static), program: &str) {
        self.line(format_args!("\n{}\n", describe(err)));
        self.usage(program);
    }

    /// `Usage: \n<program> <endpoint id> <secret>`
    pub fn usage(&self, program: &str) {
        self.line(format_args!(
            "Usage: \n{program} <endpoint id> <secret>\n"
        ));
    }
}

/// An error's message, plus its direct cause when it has one.
///
/// `<message>` or `<message>.\n\tCaused by: <cause>`
pub fn describe(err: &(dyn StdError + 'static)) -> String {
    match err.source() {
        Some(cause) => format!("{err}.\n\tCaused by: {cause}"),
        None => err.to_string(),
    }
}

/// Current local time in [`TIMESTAMP_FORMAT`].
pub(crate) fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn describe_includes_direct_cause_only() {
        let err = Error::Publish {
            endpoint_id: "id1".to_string(),
            source: Box::new(Error::Unavailable("network unreachable".to_string())),
        };

        assert_eq!(
            describe(&err),
            "failed to set attributes on id1.\n\tCaused by: device endpoint unavailable: network unreachable"
        );
        assert_eq!(describe(&Error::Usage), "Incorrect number of arguments.");
    }

    #[test]
    fn reading_line_shape() {
        let (console, captured) = Console::capture();
        console.reading("id1", "temperature", &AttributeValue::Integer(25));

        let lines = captured.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" : id1 : Set : \"temperature\"=25"));
    }

    #[test]
    fn delivery_error_line_shape() {
        let (console, captured) = Console::capture();
        console.delivery_error(&ErrorEvent {
            endpoint_id: "id1".into(),
            message: "rejected".to_string(),
            update: None,
        });

        assert!(captured.contents().ends_with(" : onError : id1 : \"rejected\"\n"));
    }

    #[test]
    fn timestamp_zone_is_an_offset() {
        let stamp = timestamp();
        let fields: Vec<&str> = stamp.split_whitespace().collect();

        assert_eq!(fields.len(), 5, "unexpected timestamp {stamp:?}");
        assert!(fields[4].parse::<i32>().is_ok());

        let zone = fields[3];
        assert!(zone.starts_with('+') || zone.starts_with('-'), "zone {zone:?}");
        assert_eq!(zone.len(), "+00:00".len());
    }

    #[test]
    fn fatal_prints_usage() {
        let (console, captured) = Console::capture();
        console.fatal(&Error::Usage, "sensor-agent");

        let text = captured.contents();
        assert!(text.contains("Incorrect number of arguments."));
        assert!(text.contains("Usage: \nsensor-agent <endpoint id> <secret>"));
    }
}
