use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Identity of a node in the cluster.
///
/// Node ids are small integers assigned at deployment time and double as the
/// index into the cluster address list. The derived ordering is what breaks
/// ties between lock requests stamped with equal timestamps.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The static view of the cluster shared by all nodes.
///
/// Every node is started with the same `addrs` list; entry `n` is the address
/// of node `n`. The local node serves on its own entry.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub local_id: NodeId,
    pub addrs: Vec<SocketAddr>,
}

impl ClusterConfig {
    pub fn new(local_id: NodeId, addrs: Vec<SocketAddr>) -> Result<Self> {
        if addrs.is_empty() {
            anyhow::bail!("cluster requires at least one node address");
        }
        if (local_id.0 as usize) >= addrs.len() {
            anyhow::bail!(
                "local node id {} out of range for {} configured addresses",
                local_id,
                addrs.len()
            );
        }
        Ok(Self { local_id, addrs })
    }

    /// The address the local node binds to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addrs[self.local_id.0 as usize]
    }

    /// The address of a given node, if it is part of the cluster.
    pub fn addr_of(&self, id: NodeId) -> Option<SocketAddr> {
        self.addrs.get(id.0 as usize).copied()
    }

    /// Base HTTP URL of a given node, if it is part of the cluster.
    pub fn base_url(&self, id: NodeId) -> Option<String> {
        self.addr_of(id).map(|addr| format!("http://{}", addr))
    }

    /// Every node id except the local one.
    pub fn peer_ids(&self) -> Vec<NodeId> {
        (0..self.addrs.len() as u32)
            .map(NodeId)
            .filter(|id| *id != self.local_id)
            .collect()
    }

    /// Total number of nodes in the cluster, the local one included.
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Whether `id` names a remote member of this cluster.
    pub fn is_peer(&self, id: NodeId) -> bool {
        id != self.local_id && (id.0 as usize) < self.addrs.len()
    }
}
