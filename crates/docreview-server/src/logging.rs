use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use tokio::sync::broadcast;

pub(crate) const LOG_RING_CAPACITY: usize = 500;

pub(crate) type LogRing = Arc<Mutex<VecDeque<String>>>;

/// Mirrors tracing events as JSON lines into a broadcast channel and a
/// bounded history ring, for the `/api/logs` stream.
pub(crate) struct BroadcastLayer {
    pub tx: broadcast::Sender<String>,
    pub ring: LogRing,
}

struct MessageVisitor<'a> {
    message: &'a mut String,
}

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            *self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message.clear();
            use std::fmt::Write;
            let _ = write!(self.message, "{value:?}");
            // Debug on &str adds quotes
            if self.message.len() >= 2 && self.message.starts_with('"') && self.message.ends_with('"') {
                *self.message = self.message[1..self.message.len() - 1].to_string();
            }
        }
    }
}

fn category(target: &str) -> &'static str {
    if target.starts_with("docreview_agent") {
        "oracle"
    } else if target.starts_with("docreview_core") {
        "pipeline"
    } else {
        "system"
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for BroadcastLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let level = match *event.metadata().level() {
            tracing::Level::ERROR => "err",
            tracing::Level::WARN => "warn",
            tracing::Level::INFO => "info",
            tracing::Level::DEBUG => "debug",
            tracing::Level::TRACE => return,
        };

        let mut message = String::new();
        event.record(&mut MessageVisitor {
            message: &mut message,
        });

        let json = serde_json::json!({
            "ts": chrono::Utc::now().to_rfc3339(),
            "level": level,
            "message": message,
            "category": category(event.metadata().target()),
        })
        .to_string();

        let _ = self.tx.send(json.clone());
        if let Ok(mut ring) = self.ring.lock() {
            ring.push_back(json);
            if ring.len() > LOG_RING_CAPACITY {
                ring.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::prelude::*;

    #[test]
    fn events_land_in_ring_with_category() {
        let (tx, mut rx) = broadcast::channel(16);
        let ring: LogRing = Arc::default();
        let subscriber = tracing_subscriber::registry().with(BroadcastLayer {
            tx,
            ring: Arc::clone(&ring),
        });

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "docreview_agent::gemini", "gemini request timed out");
            tracing::trace!("dropped");
        });

        let ring = ring.lock().unwrap();
        assert_eq!(ring.len(), 1);
        let entry: serde_json::Value = serde_json::from_str(&ring[0]).unwrap();
        assert_eq!(entry["level"], "warn");
        assert_eq!(entry["category"], "oracle");
        assert_eq!(entry["message"], "gemini request timed out");
        assert_eq!(rx.try_recv().unwrap(), ring[0]);
    }

    #[test]
    fn categories_follow_target() {
        assert_eq!(category("docreview_core::pipeline"), "pipeline");
        assert_eq!(category("docreview_agent"), "oracle");
        assert_eq!(category("tower_http::trace"), "system");
    }
}
