//! Storage Node Service Module
//!
//! The composition layer of a storage node: one `NodeService` ties the
//! distributed lock and the content store together behind the HTTP surface
//! producers and consumers call.
//!
//! ## Upload Workflow
//! 1. **Acquire**: a producer asks the node for the cluster-wide lock; the
//!    node runs the mutex protocol on the producer's behalf and records the
//!    session it granted.
//! 2. **Upload**: admitted only while the node actually holds the critical
//!    section, then committed to the content store.
//! 3. **Release**: the recorded session gives the lock back, which also
//!    flushes the peer replies deferred while the section was held.
//!
//! Downloads take no lock and are served from the node's own store.

pub mod handlers;
pub mod protocol;
pub mod service;
pub mod types;
