//! JSON formatting layer shared by console and file output
//!
//! The replay session is carried by the `session` span that
//! [`SessionContextGuard`](crate::SessionContextGuard) enters, so the span
//! list on each record is what ties it to a replay pass.

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::{Format, Json, JsonFields};
use tracing_subscriber::registry::LookupSpan;

use crate::config::JsonShape;

/// Create a JSONL formatting layer writing to `writer`
pub fn json_layer<S, W>(
    writer: W,
    shape: &JsonShape,
) -> tracing_subscriber::fmt::Layer<S, JsonFields, Format<Json>, W>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(shape.include_spans)
        .flatten_event(shape.flatten_events)
        .with_file(shape.include_location)
        .with_line_number(shape.include_location)
        .with_thread_ids(shape.include_thread_info)
        .with_thread_names(shape.include_thread_info)
        .with_writer(writer)
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::{Registry, layer::SubscriberExt};

    use super::*;
    use crate::context::SessionContextGuard;

    /// In-memory sink for formatted records
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_session_appears_in_records() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber =
            Registry::default().with(json_layer(move || writer.clone(), &JsonShape::default()));

        let session_id = tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("before session");

            let _guard = SessionContextGuard::new("main.binlog");
            let session_id = SessionContextGuard::current_session_id().unwrap();
            let _replay = tracing::info_span!("replay").entered();
            tracing::warn!(id = 7, "rewrite target missing");
            session_id
        });

        let lines = captured.lines();
        assert_eq!(lines.len(), 2);
        assert!(!lines[0].contains("main.binlog"));

        let record: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        let spans = record["spans"].as_array().unwrap();
        assert_eq!(spans[0]["name"], "session");
        assert_eq!(spans[0]["label"], "main.binlog");
        assert_eq!(spans[0]["session_id"], session_id.to_string());
        assert_eq!(spans[1]["name"], "replay");
        assert_eq!(record["id"], 7);
    }

    #[test]
    fn test_shape_controls_layout() {
        let captured = Captured::default();
        let writer = captured.clone();
        let shape = JsonShape {
            flatten_events: false,
            include_spans: false,
            include_thread_info: false,
            include_location: false,
        };
        let subscriber = Registry::default().with(json_layer(move || writer.clone(), &shape));

        tracing::subscriber::with_default(subscriber, || {
            let _guard = SessionContextGuard::new("a.binlog");
            tracing::warn!(id = 3, "out of order");
        });

        let lines = captured.lines();
        let record: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(record["fields"]["id"], 3);
        assert!(record.get("spans").is_none());
        assert!(record.get("filename").is_none());
        // The current span is always reported
        assert_eq!(record["span"]["label"], "a.binlog");
    }
}
