//! Session resolution.
//!
//! The core mints an identifier when a request carries none and otherwise
//! passes the supplied identifier through unchanged. Whether a supplied id
//! maps to prior state is an external collaborator's concern — durable
//! session content is not owned here.

use tracing::debug;
use waypoint_core::message::SessionId;

/// Resolve the session identifier for a request.
pub fn resolve_session(supplied: Option<&str>) -> SessionId {
    match supplied {
        Some(id) if !id.trim().is_empty() => SessionId::from(id),
        _ => {
            let id = SessionId::new();
            debug!(session = %id, "Minted new session id");
            id
        }
    }
}
