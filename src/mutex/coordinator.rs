//! Lock Coordinator
//!
//! Drives the protocol state machine on behalf of the node service. All state
//! mutation happens under one mutex held for constant-time work; outbound
//! messages are collected while the guard is held and delivered after it is
//! dropped, so no network send ever runs inside the guard. A caller waiting
//! for the grant is suspended on a oneshot channel and woken by the reply
//! handler, never by polling.

use super::messenger::PeerMessenger;
use super::state::{MutexState, RequestVerdict};
use super::types::{AcquireOutcome, LockReply, LockRequest};
use crate::cluster::types::{ClusterConfig, NodeId};

use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;

struct LockInner {
    state: MutexState,
    /// Wakes the suspended `acquire` once the last reply lands.
    granted_tx: Option<oneshot::Sender<()>>,
}

/// The distributed lock as seen by one node.
pub struct DistributedMutex {
    cluster: Arc<ClusterConfig>,
    inner: Mutex<LockInner>,
    messenger: Arc<dyn PeerMessenger>,
}

impl DistributedMutex {
    pub fn new(cluster: Arc<ClusterConfig>, messenger: Arc<dyn PeerMessenger>) -> Arc<Self> {
        let state = MutexState::new(cluster.local_id, cluster.len());
        Arc::new(Self {
            cluster,
            inner: Mutex::new(LockInner {
                state,
                granted_tx: None,
            }),
            messenger,
        })
    }

    /// Attempts to enter the cluster-wide critical section.
    ///
    /// Broadcasts a stamped claim to every peer, then suspends until all of
    /// them have replied or `timeout` passes. A claim already in flight on
    /// this node reports `Busy` without disturbing it. A grant can race the
    /// deadline; whichever the state records wins.
    pub async fn acquire(&self, timeout: Duration) -> AcquireOutcome {
        let (request, targets, granted_rx) = {
            let mut inner = self.lock_inner();
            let request = match inner.state.begin_request() {
                Ok(request) => request,
                Err(_) => return AcquireOutcome::Busy,
            };
            if inner.state.is_holding() {
                // Single-node cluster: nobody to ask.
                return AcquireOutcome::Granted;
            }
            let (tx, rx) = oneshot::channel();
            inner.granted_tx = Some(tx);
            (request, inner.state.pending_peers(), rx)
        };

        tracing::debug!(
            "Node {} claiming the critical section at ts {}",
            self.cluster.local_id,
            request.timestamp
        );

        for peer in &targets {
            if let Err(err) = self.messenger.send_request(*peer, request).await {
                tracing::warn!("Failed to deliver REQUEST to node {}: {}", peer, err);
            }
        }

        match tokio::time::timeout(timeout, granted_rx).await {
            Ok(Ok(())) => AcquireOutcome::Granted,
            Ok(Err(_)) | Err(_) => self.resolve_expired_claim().await,
        }
    }

    /// Leaves the critical section and answers every claim that was deferred
    /// while it was held.
    pub async fn release(&self) -> Result<()> {
        let flush = {
            let mut inner = self.lock_inner();
            inner.state.finish_release()?
        };

        tracing::debug!(
            "Node {} released the critical section ({} deferred replies)",
            self.cluster.local_id,
            flush.len()
        );

        self.flush_deferred(flush).await;
        Ok(())
    }

    /// Applies a peer's claim and sends the reply if it is not withheld.
    pub async fn handle_request(&self, req: LockRequest) {
        if !self.cluster.is_peer(req.requester) {
            tracing::warn!("Ignoring lock request from unknown node {}", req.requester);
            return;
        }

        let verdict = {
            let mut inner = self.lock_inner();
            inner.state.observe_request(req)
        };

        match verdict {
            RequestVerdict::ReplyNow => {
                self.send_reply_to(req.requester, req.timestamp).await;
            }
            RequestVerdict::Deferred => {
                tracing::debug!(
                    "Node {} defers REPLY to node {} (ts {})",
                    self.cluster.local_id,
                    req.requester,
                    req.timestamp
                );
            }
        }
    }

    /// Applies a peer's reply and wakes the waiting `acquire` when it was the
    /// last one outstanding.
    pub fn handle_reply(&self, reply: LockReply) {
        if !self.cluster.is_peer(reply.from) {
            tracing::warn!("Ignoring lock reply from unknown node {}", reply.from);
            return;
        }

        let mut inner = self.lock_inner();
        if inner.state.observe_reply(reply.from, reply.request_timestamp) {
            if let Some(tx) = inner.granted_tx.take() {
                let _ = tx.send(());
            }
        }
    }

    /// Whether this node currently owns the critical section. Upload
    /// admission is gated on this state, not on any RPC response.
    pub fn is_holding(&self) -> bool {
        self.lock_inner().state.is_holding()
    }

    /// The wait expired, but the final reply may have landed in the meantime;
    /// the state decides the outcome. An abandoned claim releases whatever
    /// replies it was withholding.
    async fn resolve_expired_claim(&self) -> AcquireOutcome {
        let flush = {
            let mut inner = self.lock_inner();
            inner.granted_tx = None;
            if inner.state.is_holding() {
                return AcquireOutcome::Granted;
            }
            inner.state.abandon_request()
        };

        tracing::warn!(
            "Node {} timed out waiting for the critical section",
            self.cluster.local_id
        );

        self.flush_deferred(flush).await;
        AcquireOutcome::TimedOut
    }

    async fn flush_deferred(&self, deferred: Vec<(NodeId, u64)>) {
        for (peer, request_timestamp) in deferred {
            self.send_reply_to(peer, request_timestamp).await;
        }
    }

    async fn send_reply_to(&self, to: NodeId, request_timestamp: u64) {
        let reply = LockReply {
            from: self.cluster.local_id,
            request_timestamp,
        };
        if let Err(err) = self.messenger.send_reply(to, reply).await {
            tracing::warn!("Failed to deliver REPLY to node {}: {}", to, err);
        }
    }

    // State updates are small and panic-free, so a poisoned guard still
    // holds a consistent state.
    fn lock_inner(&self) -> MutexGuard<'_, LockInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
