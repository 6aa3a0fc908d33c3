//! Distributed File Store Cluster Library
//!
//! This library crate defines the core modules that make up the distributed system.
//! It serves as the foundation for the node binary (`main.rs`) and the
//! content-provider client in `provider/`.
//!
//! ## Architecture Modules
//! The system is composed of four loosely coupled subsystems:
//!
//! - **`cluster`**: The topology layer. Describes the static membership of the
//!   cluster (node identities and their addresses) that every other subsystem
//!   consults for routing.
//! - **`mutex`**: The coordination layer. Implements Ricart-Agrawala distributed
//!   mutual exclusion over logical timestamps, so that at most one node in the
//!   cluster writes to the shared store at a time.
//! - **`store`**: The persistence layer. A content-addressed file store that
//!   deduplicates uploads by name and by SHA-256 digest, backed by a durable
//!   JSON manifest.
//! - **`node`**: The service layer. Composes the lock and the store behind the
//!   HTTP surface that producer processes talk to.

pub mod cluster;
pub mod mutex;
pub mod node;
pub mod store;
