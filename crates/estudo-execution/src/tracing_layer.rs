//! Tracing layer that forwards generation lifecycle events to the UI.
//!
//! The controller logs every start, completion, failure and cancellation
//! with `target: "generation"`. This layer picks those events up and sends
//! them over a tokio channel, so a front end can show progress without
//! polling sessions.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

pub const GENERATION_TARGET: &str = "generation";

/// Event data sent to the front end
#[derive(Debug, Clone, serde::Serialize)]
pub struct GenerationEvent {
    pub session_key: Option<String>,
    pub generation_id: Option<String>,
    /// started, completed, failed, cancelled, timed_out, rejected
    pub status: Option<String>,
    /// Log level (INFO, WARN, ERROR)
    pub level: String,
    pub message: String,
    /// Remaining structured fields
    pub fields: HashMap<String, Value>,
    pub timestamp: String,
}

/// A tracing layer that sends generation events to a channel
pub struct GenerationEventLayer {
    sender: mpsc::UnboundedSender<GenerationEvent>,
}

impl GenerationEventLayer {
    pub fn new(sender: mpsc::UnboundedSender<GenerationEvent>) -> Self {
        Self { sender }
    }

    /// Creates a layer together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GenerationEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl<S> Layer<S> for GenerationEventLayer
where
    S: Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() != GENERATION_TARGET {
            return;
        }

        let mut fields = HashMap::new();
        let mut visitor = FieldVisitor(&mut fields);
        event.record(&mut visitor);

        let mut take_str = |name: &str| {
            fields
                .remove(name)
                .and_then(|v| v.as_str().map(str::to_string))
        };
        let message = take_str("message").unwrap_or_default();
        let session_key = take_str("session_key");
        let generation_id = take_str("generation_id");
        let status = take_str("status");

        let generation_event = GenerationEvent {
            session_key,
            generation_id,
            status,
            level: event.metadata().level().to_string(),
            message,
            fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        // Receiver gone means nobody is listening; drop the event.
        let _ = self.sender.send(generation_event);
    }
}

/// Field visitor that extracts tracing event fields into a HashMap
struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        // Display-formatted fields (`%value`) arrive here as well.
        self.0.insert(
            field.name().to_string(),
            serde_json::json!(format!("{:?}", value)),
        );
    }
}
