//! Lock Network Protocol
//!
//! Defines the API endpoints used for inter-node lock coordination. The
//! message bodies are the `LockRequest` and `LockReply` types themselves,
//! serialized as JSON.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Endpoint a claim on the critical section is POSTed to.
pub const ENDPOINT_MUTEX_REQUEST: &str = "/internal/mutex/request";
/// Endpoint a reply admitting a peer's claim is POSTed to.
pub const ENDPOINT_MUTEX_REPLY: &str = "/internal/mutex/reply";

// --- Data Transfer Objects ---

/// Transport-level acknowledgement that a lock message was received.
///
/// This only confirms delivery. Admission to the critical section arrives
/// exclusively as a REPLY message on `ENDPOINT_MUTEX_REPLY`, never through
/// this acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageAck {
    pub ack_received: bool,
}
