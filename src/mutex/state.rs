//! Lock Protocol State Machine
//!
//! One `MutexState` value holds everything the protocol knows on a node: the
//! logical clock, the current phase, which peers still owe a reply, and which
//! peers are owed one. Methods apply one protocol event each and report what
//! the caller must send; the machine itself performs no I/O, which keeps every
//! protocol rule unit-testable.

use super::types::{LockPhase, LockRequest};
use crate::cluster::types::NodeId;

use anyhow::Result;
use std::collections::HashSet;

/// What to do with an inbound claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestVerdict {
    /// Answer immediately.
    ReplyNow,
    /// Withhold the answer until this node leaves the critical section.
    Deferred,
}

/// Protocol bookkeeping for one node.
pub struct MutexState {
    local: NodeId,
    cluster_size: usize,
    /// Logical clock; advances to the maximum of itself and every observed
    /// request timestamp, and by one for each own claim. Never decreases.
    clock: u64,
    phase: LockPhase,
    /// Timestamp of the current (or most recent) own claim.
    my_request_ts: u64,
    /// Peers whose reply to the current claim is still outstanding.
    awaiting: HashSet<NodeId>,
    /// Per peer, the timestamp of its latest unanswered claim. Indexed by
    /// node id; 0 means no reply is owed (claim timestamps start at 1).
    deferred: Vec<u64>,
}

impl MutexState {
    pub fn new(local: NodeId, cluster_size: usize) -> Self {
        Self {
            local,
            cluster_size,
            clock: 0,
            phase: LockPhase::Idle,
            my_request_ts: 0,
            awaiting: HashSet::new(),
            deferred: vec![0; cluster_size],
        }
    }

    pub fn phase(&self) -> LockPhase {
        self.phase
    }

    pub fn is_holding(&self) -> bool {
        self.phase == LockPhase::Holding
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Peers that still owe a reply to the current claim.
    pub fn pending_peers(&self) -> Vec<NodeId> {
        self.awaiting.iter().copied().collect()
    }

    /// Stamps a fresh claim and moves to `Requesting`.
    ///
    /// Returns the claim to broadcast to every peer. In a single-node cluster
    /// there is nobody to ask and the phase goes straight to `Holding`.
    /// Fails if a claim is already in flight or the section is already held.
    pub fn begin_request(&mut self) -> Result<LockRequest> {
        if self.phase != LockPhase::Idle {
            anyhow::bail!("a claim is already in flight ({:?})", self.phase);
        }

        self.clock += 1;
        self.my_request_ts = self.clock;
        self.awaiting = self.peers().collect();

        self.phase = if self.awaiting.is_empty() {
            LockPhase::Holding
        } else {
            LockPhase::Requesting
        };

        Ok(LockRequest {
            timestamp: self.my_request_ts,
            requester: self.local,
        })
    }

    /// Applies a peer's claim.
    ///
    /// The clock absorbs the claim's timestamp first. The claim is answered
    /// immediately unless this node holds the section, or is requesting with
    /// a claim that orders before the inbound one; in those cases the reply
    /// is recorded as owed. A newer claim from the same peer overwrites the
    /// recorded one, since only its latest claim is ever unanswered.
    pub fn observe_request(&mut self, req: LockRequest) -> RequestVerdict {
        self.clock = self.clock.max(req.timestamp);

        let withhold = match self.phase {
            LockPhase::Holding => true,
            LockPhase::Requesting => {
                let own = LockRequest {
                    timestamp: self.my_request_ts,
                    requester: self.local,
                };
                own < req
            }
            LockPhase::Idle => false,
        };

        if withhold {
            self.deferred[req.requester.0 as usize] = req.timestamp;
            RequestVerdict::Deferred
        } else {
            RequestVerdict::ReplyNow
        }
    }

    /// Applies a peer's reply to the outstanding claim.
    ///
    /// Returns `true` when this reply was the last one and the node now holds
    /// the critical section. Replies that answer some earlier, abandoned claim
    /// or arrive while no claim is in flight are stale and change nothing.
    pub fn observe_reply(&mut self, from: NodeId, for_timestamp: u64) -> bool {
        if self.phase != LockPhase::Requesting || for_timestamp != self.my_request_ts {
            tracing::debug!(
                "Ignoring stale reply from {} for ts {} (phase {:?}, own ts {})",
                from,
                for_timestamp,
                self.phase,
                self.my_request_ts
            );
            return false;
        }

        self.awaiting.remove(&from);

        if self.awaiting.is_empty() {
            self.phase = LockPhase::Holding;
            true
        } else {
            false
        }
    }

    /// Leaves the critical section.
    ///
    /// Returns every reply withheld while holding, as `(peer, timestamp of
    /// the peer's claim)` pairs for the caller to deliver. Fails when called
    /// outside the critical section.
    pub fn finish_release(&mut self) -> Result<Vec<(NodeId, u64)>> {
        if self.phase != LockPhase::Holding {
            anyhow::bail!("release without holding the critical section");
        }

        self.phase = LockPhase::Idle;
        Ok(self.drain_deferred())
    }

    /// Gives up on a claim whose replies never all arrived.
    ///
    /// The claim's bookkeeping is cleared so a later claim starts clean, and
    /// any replies withheld in the meantime are returned for delivery; with no
    /// claim of our own left there is no reason to keep peers waiting.
    pub fn abandon_request(&mut self) -> Vec<(NodeId, u64)> {
        self.phase = LockPhase::Idle;
        self.awaiting.clear();
        self.drain_deferred()
    }

    fn drain_deferred(&mut self) -> Vec<(NodeId, u64)> {
        let mut flush = Vec::new();
        for (idx, ts) in self.deferred.iter_mut().enumerate() {
            if *ts != 0 {
                flush.push((NodeId(idx as u32), *ts));
                *ts = 0;
            }
        }
        flush
    }

    fn peers(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.cluster_size as u32)
            .map(NodeId)
            .filter(move |id| *id != self.local)
    }
}
