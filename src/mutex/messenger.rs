use super::protocol::{ENDPOINT_MUTEX_REPLY, ENDPOINT_MUTEX_REQUEST};
use super::types::{LockReply, LockRequest};
use crate::cluster::types::{ClusterConfig, NodeId};

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Transport used by the lock coordinator to reach its peers.
///
/// The production implementation speaks HTTP; tests wire coordinators
/// together in process. Delivery must be at-least-once for the protocol to
/// make progress: a peer that stays unreachable stalls every requester
/// (liveness), but can never let two nodes hold the section at once (safety).
#[async_trait]
pub trait PeerMessenger: Send + Sync {
    /// Delivers a claim on the critical section to one peer.
    async fn send_request(&self, to: NodeId, req: LockRequest) -> Result<()>;

    /// Delivers a reply admitting a peer's claim.
    async fn send_reply(&self, to: NodeId, reply: LockReply) -> Result<()>;
}

/// HTTP peer transport. Posts JSON lock messages to the peer's internal
/// endpoints, retrying transient failures with backoff.
pub struct HttpPeerMessenger {
    cluster: Arc<ClusterConfig>,
    http_client: reqwest::Client,
}

impl HttpPeerMessenger {
    pub fn new(cluster: Arc<ClusterConfig>) -> Self {
        Self {
            cluster,
            http_client: reqwest::Client::new(),
        }
    }

    async fn post_lock_message<T: serde::Serialize>(
        &self,
        to: NodeId,
        endpoint: &str,
        payload: &T,
    ) -> Result<()> {
        let base_url = self
            .cluster
            .base_url(to)
            .ok_or_else(|| anyhow::anyhow!("Unknown peer node {}", to))?;

        let response = self
            .post_with_retry(
                format!("{}{}", base_url, endpoint),
                payload,
                std::time::Duration::from_millis(500),
                3,
            )
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Node {} rejected {}: {}",
                to,
                endpoint,
                response.status()
            ));
        }

        Ok(())
    }

    async fn post_with_retry<T: serde::Serialize>(
        &self,
        url: String,
        payload: &T,
        timeout: std::time::Duration,
        attempts: usize,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..attempts {
            let response = self
                .http_client
                .post(url.clone())
                .json(payload)
                .timeout(timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    // Simple jitter to prevent thundering herd
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}

#[async_trait]
impl PeerMessenger for HttpPeerMessenger {
    async fn send_request(&self, to: NodeId, req: LockRequest) -> Result<()> {
        self.post_lock_message(to, ENDPOINT_MUTEX_REQUEST, &req).await
    }

    async fn send_reply(&self, to: NodeId, reply: LockReply) -> Result<()> {
        self.post_lock_message(to, ENDPOINT_MUTEX_REPLY, &reply).await
    }
}
