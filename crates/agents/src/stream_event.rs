//! Streaming events delivered to callers.
//!
//! `StreamEvent` frames the generated answer as ordered text increments with
//! a single terminal event. The gateway forwards these over SSE verbatim.

use serde::{Deserialize, Serialize};
use waypoint_core::agent::AgentKind;
use waypoint_core::message::SessionId;

/// Events emitted while answering one request.
///
/// - `chunk`    — partial text from the generator, in generation order
/// - `complete` — the stream finished; carries the full concatenated text
/// - `error`    — the stream failed; carries a stable kind and short message
///
/// Exactly one `complete` or `error` terminates a stream; once terminal, no
/// further events are emitted. Concatenating every `chunk` in order yields
/// exactly the `complete` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Partial text from the generator.
    Chunk { content: String },

    /// The stream is complete — final text and request metadata.
    Complete {
        message: String,
        session_id: SessionId,
        agent: AgentKind,
    },

    /// The stream failed. `kind` is a stable snake_case identifier; the
    /// message is short and never carries provider internals to end users.
    Error { kind: String, message: String },
}

impl StreamEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this event terminates the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Chunk { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_chunk() {
        let event = StreamEvent::Chunk {
            content: "Hello".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"chunk""#));
        assert!(json.contains(r#""content":"Hello""#));
    }

    #[test]
    fn event_serialization_complete() {
        let event = StreamEvent::Complete {
            message: "done".into(),
            session_id: SessionId::from("s1"),
            agent: AgentKind::Policy,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"complete""#));
        assert!(json.contains(r#""agent":"policy""#));
        assert!(json.contains(r#""session_id":"s1""#));
    }

    #[test]
    fn event_serialization_error() {
        let event = StreamEvent::Error {
            kind: "retrieval_error".into(),
            message: "context store unreachable".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains(r#""kind":"retrieval_error""#));
    }

    #[test]
    fn event_type_names() {
        assert_eq!(
            StreamEvent::Chunk { content: "x".into() }.event_type(),
            "chunk"
        );
        assert_eq!(
            StreamEvent::Complete {
                message: "x".into(),
                session_id: SessionId::new(),
                agent: AgentKind::TravelSupport,
            }
            .event_type(),
            "complete"
        );
        assert_eq!(
            StreamEvent::Error {
                kind: "cancelled".into(),
                message: "x".into()
            }
            .event_type(),
            "error"
        );
    }

    #[test]
    fn terminality() {
        assert!(!StreamEvent::Chunk { content: "x".into() }.is_terminal());
        assert!(StreamEvent::Error {
            kind: "generation_error".into(),
            message: "x".into()
        }
        .is_terminal());
    }

    #[test]
    fn event_deserialization() {
        let json = r#"{"type":"chunk","content":"hi"}"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        match event {
            StreamEvent::Chunk { content } => assert_eq!(content, "hi"),
            _ => panic!("Wrong variant"),
        }
    }
}
