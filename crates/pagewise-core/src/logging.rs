//! Log routing.
//!
//! The library only emits `tracing` events. [`Logging`] decides where they go:
//! to a caller-supplied handler, to stderr, or both, filtered by a
//! [`LogLevel`]. Nothing is installed globally; a [`Logging`] turns into a
//! `tracing::Dispatch` that is either scoped to the current thread with
//! [`Logging::install`] or handed to an [`Engine`](crate::Engine).

use std::fmt::{self, Write as _};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Message severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Critical,
    #[default]
    Warning,
    Message,
    Info,
    Debug,
}

impl LogLevel {
    /// The `tracing` level that carries messages of this severity.
    pub fn to_tracing(self) -> Level {
        match self {
            LogLevel::Error | LogLevel::Critical => Level::ERROR,
            LogLevel::Warning => Level::WARN,
            LogLevel::Message | LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
        }
    }

    /// Severity of a `tracing` event. Trace events count as debug.
    pub fn from_tracing(level: &Level) -> Self {
        match *level {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warning,
            Level::INFO => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    fn filter(self) -> LevelFilter {
        LevelFilter::from_level(self.to_tracing())
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
            LogLevel::Warning => "warning",
            LogLevel::Message => "message",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(name)
    }
}

/// Receives `(domain, level, message)` for every event that passes the
/// verbosity filter. The domain is the event's target module path.
pub type LoggingHandler = Arc<dyn Fn(&str, LogLevel, &str) + Send + Sync>;

/// Collects the `message` field first and the rest as `key=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

struct HandlerLayer {
    handler: LoggingHandler,
}

impl<S: Subscriber> Layer<S> for HandlerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let mut message = visitor.message;
        message.push_str(&visitor.fields);
        (self.handler)(meta.target(), LogLevel::from_tracing(meta.level()), &message);
    }
}

/// Where log events go and how verbose they are.
#[derive(Clone)]
pub struct Logging {
    verbosity: LogLevel,
    handler: Option<LoggingHandler>,
    stderr: bool,
}

impl fmt::Debug for Logging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logging")
            .field("verbosity", &self.verbosity)
            .field("handler", &self.handler.is_some())
            .field("stderr", &self.stderr)
            .finish()
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

impl Logging {
    /// No outputs; events at or above `verbosity` pass the filter.
    pub fn new(verbosity: LogLevel) -> Self {
        Self {
            verbosity,
            handler: None,
            stderr: false,
        }
    }

    /// Route events to `handler`.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, LogLevel, &str) + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Also print events to stderr.
    pub fn with_stderr(mut self, enabled: bool) -> Self {
        self.stderr = enabled;
        self
    }

    pub fn verbosity(&self) -> LogLevel {
        self.verbosity
    }

    /// Build a dispatcher for these settings.
    pub fn dispatch(&self) -> Dispatch {
        let handler = self
            .handler
            .clone()
            .map(|handler| HandlerLayer { handler });
        let stderr = self.stderr.then(|| {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
        });
        let subscriber = tracing_subscriber::registry()
            .with(handler)
            .with(stderr)
            .with(self.verbosity.filter());
        Dispatch::new(subscriber)
    }

    /// Make these settings the current thread's default until the guard
    /// is dropped.
    pub fn install(&self) -> LoggingGuard {
        LoggingGuard {
            _guard: Some(tracing::dispatcher::set_default(&self.dispatch())),
        }
    }
}

/// Restores the previous thread default when dropped.
#[must_use = "logging is uninstalled as soon as the guard is dropped"]
pub struct LoggingGuard {
    _guard: Option<tracing::dispatcher::DefaultGuard>,
}

impl LoggingGuard {
    pub fn uninstall(mut self) {
        self._guard.take();
    }
}
