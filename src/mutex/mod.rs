//! Distributed Mutual Exclusion Module
//!
//! Implements the Ricart-Agrawala algorithm: a node that wants the cluster-wide
//! critical section broadcasts a logically timestamped REQUEST and may enter
//! once every peer has answered with a REPLY. A peer withholds its REPLY while
//! it holds the section itself, or while its own outstanding request carries a
//! lower `(timestamp, node id)` pair; withheld replies are delivered when the
//! section is released.
//!
//! ## Architecture Overview
//! 1. **State machine**: all protocol bookkeeping (clock, phase, deferred
//!    replies, outstanding answers) lives in one owned `MutexState` value with
//!    no I/O of its own.
//! 2. **Coordinator**: `DistributedMutex` wraps the state in a mutex held only
//!    for constant-time updates. Messages to send are collected under the
//!    guard and delivered after it is dropped, and a waiting `acquire` is
//!    suspended on a channel rather than polling.
//! 3. **Transport**: peers are reached through the `PeerMessenger` trait; the
//!    production implementation posts JSON over HTTP with retry and backoff.
//!
//! ## Submodules
//! - **`types`**: Requests, replies, phases, and acquire outcomes.
//! - **`state`**: The pure protocol state machine.
//! - **`coordinator`**: The async lock façade used by the node service.
//! - **`messenger`**: The peer transport seam and its HTTP implementation.
//! - **`protocol`**: HTTP endpoint contracts for inter-node messages.
//! - **`handlers`**: Axum handlers feeding inbound messages to the coordinator.

pub mod coordinator;
pub mod handlers;
pub mod messenger;
pub mod protocol;
pub mod state;
pub mod types;
