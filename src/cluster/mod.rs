//! Cluster Topology Module
//!
//! Describes the static membership of the cluster: which nodes exist, how they
//! are identified, and where they listen. Membership is fixed at startup and
//! every node is configured with the same ordered address list, so a node id
//! doubles as an index into that list.

pub mod types;
