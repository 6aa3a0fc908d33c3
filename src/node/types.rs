//! Node Service Data Types
//!
//! Outcome types for the producer-facing operations. The service reports
//! decisions with these; the HTTP handlers translate them into status codes
//! and response DTOs.

use crate::store::types::RejectReason;
use std::fmt;

/// Decision on a producer's request to take the cluster-wide lock through
/// this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantDecision {
    /// The node entered the critical section on the producer's behalf.
    Granted,
    /// The lock was not taken; the reason says why.
    Denied(DenyReason),
}

/// Why a producer's lock request was turned down.
///
/// Every denial leaves the node exactly as it was, so the producer can retry
/// with backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Another producer session holds this node, or a claim is already in
    /// flight.
    Busy,
    /// The requesting session itself already holds this node.
    AlreadyHeld,
    /// Not every peer answered before the deadline.
    Timeout,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Busy => write!(f, "critical section is in use"),
            DenyReason::AlreadyHeld => {
                write!(f, "session already holds the critical section")
            }
            DenyReason::Timeout => write!(f, "timed out waiting for the critical section"),
        }
    }
}

/// What became of an upload once the node examined it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadVerdict {
    /// The payload and its manifest entry are durable in the store.
    Stored { digest: String },
    /// The store refused the file; nothing was written.
    Rejected(RejectReason),
    /// The producer tried to upload without holding the critical section.
    NotHolding,
    /// Writing the payload or the manifest failed. Details go to the log,
    /// never across the RPC boundary.
    StorageFailed,
}
