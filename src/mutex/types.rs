use crate::cluster::types::NodeId;
use serde::{Deserialize, Serialize};

/// A claim on the cluster-wide critical section.
///
/// Claims are totally ordered by `(timestamp, requester)`, lower first. Node
/// ids are unique, so two claims never tie; the derived ordering relies on the
/// field order here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct LockRequest {
    /// Logical timestamp the claim was stamped with.
    pub timestamp: u64,
    /// The node making the claim.
    pub requester: NodeId,
}

/// A peer's answer admitting a claim from its side.
///
/// `request_timestamp` echoes the timestamp of the claim being answered, so a
/// reply that straggles in after its claim was abandoned is recognizably stale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockReply {
    /// The answering node.
    pub from: NodeId,
    /// Timestamp of the claim this reply answers.
    pub request_timestamp: u64,
}

/// Where a node stands with respect to the critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPhase {
    /// No claim in flight.
    Idle,
    /// Own claim broadcast, replies still outstanding.
    Requesting,
    /// Inside the critical section.
    Holding,
}

/// Result of an attempt to enter the critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Every peer answered; the caller owns the critical section.
    Granted,
    /// A claim was already in flight or held on this node.
    Busy,
    /// Not every peer answered before the deadline.
    TimedOut,
}
