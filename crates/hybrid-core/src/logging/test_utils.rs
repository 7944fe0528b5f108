//! In-memory capture of tracing output for assertions in tests.
//!
//! [`capture_logs`] installs a thread-local subscriber; events and spans
//! recorded while its guard is alive land in the returned [`CapturedLogs`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::span::{Attributes, Id};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Recorded field values, rendered as text.
pub type Fields = BTreeMap<String, String>;

/// One event.
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    /// Event level.
    pub level: Level,
    /// Emitting module path.
    pub target: String,
    /// The `message` field.
    pub message: String,
    /// Every other field.
    pub fields: Fields,
}

impl CapturedEvent {
    /// Value of field `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// One span, with the fields it was opened with.
#[derive(Clone, Debug)]
pub struct CapturedSpan {
    /// Span name.
    pub name: String,
    /// Fields given at creation.
    pub fields: Fields,
}

impl CapturedSpan {
    /// Value of field `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Default)]
struct Captured {
    events: Vec<CapturedEvent>,
    spans: Vec<CapturedSpan>,
}

/// Handle onto everything captured by one [`capture_logs`] call.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Captured>>);

impl CapturedLogs {
    // Assertions after a panicking test thread still see what was captured.
    fn lock(&self) -> MutexGuard<'_, Captured> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Captured events in emission order.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.lock().events.clone()
    }

    /// First event at any level whose message contains `message`.
    pub fn event(&self, message: &str) -> Option<CapturedEvent> {
        self.lock()
            .events
            .iter()
            .find(|e| e.message.contains(message))
            .cloned()
    }

    /// Whether an event at `level` has a message containing `message`.
    pub fn has_event(&self, level: Level, message: &str) -> bool {
        self.lock()
            .events
            .iter()
            .any(|e| e.level == level && e.message.contains(message))
    }

    /// Number of events at `level`.
    pub fn count(&self, level: Level) -> usize {
        self.lock().events.iter().filter(|e| e.level == level).count()
    }

    /// First span named `name`.
    pub fn span(&self, name: &str) -> Option<CapturedSpan> {
        self.lock().spans.iter().find(|s| s.name == name).cloned()
    }

    /// Whether a span named `name` was opened.
    pub fn has_span(&self, name: &str) -> bool {
        self.span(name).is_some()
    }
}

#[derive(Default)]
struct FieldRecorder {
    message: String,
    fields: Fields,
}

impl FieldRecorder {
    fn put(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            let _ = self.fields.insert(field.name().to_owned(), value);
        }
    }
}

impl Visit for FieldRecorder {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }
}

struct CaptureLayer(CapturedLogs);

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        let mut recorder = FieldRecorder::default();
        attrs.record(&mut recorder);
        self.0.lock().spans.push(CapturedSpan {
            name: attrs.metadata().name().to_owned(),
            fields: recorder.fields,
        });
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut recorder = FieldRecorder::default();
        event.record(&mut recorder);
        let metadata = event.metadata();
        self.0.lock().events.push(CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_owned(),
            message: recorder.message,
            fields: recorder.fields,
        });
    }
}

/// Capture every event and span on this thread until the guard drops.
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let guard = tracing_subscriber::registry()
        .with(CaptureLayer(logs.clone()))
        .with(LevelFilter::TRACE)
        .set_default();
    (logs, guard)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
