//! Content-Addressed Store Module
//!
//! Persists uploaded files under a storage directory and tracks them in a JSON
//! manifest mapping each filename to the SHA-256 digest of its content.
//!
//! ## Core Rules
//! - **Name dedup**: a filename can be committed once; later commits under the
//!   same name are rejected.
//! - **Content dedup**: identical bytes are stored once, whatever name they
//!   arrive under.
//! - **Durability**: the payload file is flushed before the manifest, and the
//!   manifest is rewritten through a temp file plus atomic rename. A commit
//!   that fails partway leaves the previous manifest intact.
//!
//! The store itself is not thread-safe; the node service serializes access to
//! it, and the cluster-wide lock serializes writers across nodes.

pub mod content;
pub mod types;

#[cfg(test)]
mod tests;
