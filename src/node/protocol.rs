//! Producer Network Protocol
//!
//! Defines the API endpoints and Data Transfer Objects (DTOs) producers and
//! consumers use to talk to a storage node: lock acquire/release, upload, and
//! download.
//!
//! File payloads travel inside JSON bodies as base64 strings; the
//! `payload_base64` helper keeps the DTO fields plain byte vectors in code.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Public endpoint a producer asks for the cluster-wide lock on.
pub const ENDPOINT_MUTEX_ACQUIRE: &str = "/mutex/acquire";
/// Public endpoint a producer gives the lock back on.
pub const ENDPOINT_MUTEX_RELEASE: &str = "/mutex/release";
/// Public endpoint for file uploads.
pub const ENDPOINT_UPLOAD: &str = "/upload";
/// Public endpoint for file downloads; the filename is the path suffix.
pub const ENDPOINT_DOWNLOAD: &str = "/download";

// --- Data Transfer Objects ---

/// Producer request for the cluster-wide lock.
#[derive(Debug, Serialize, Deserialize)]
pub struct AcquireRequest {
    /// Session tag chosen by the producer. The node records it on grant and
    /// only accepts a release carrying the same tag.
    pub requester_id: u64,
}

/// Answer to a lock request.
///
/// `granted` reports the actual mutex decision: when true, the node holds the
/// cluster-wide critical section on the producer's behalf until the matching
/// release.
#[derive(Debug, Serialize, Deserialize)]
pub struct AcquireResponse {
    pub granted: bool,
    /// Why the lock was denied; `None` when `granted` is true.
    pub error: Option<String>,
}

/// Producer request returning the cluster-wide lock.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReleaseRequest {
    /// Session tag the lock was granted under.
    pub requester_id: u64,
}

/// Answer to a release request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReleaseResponse {
    /// False when the caller did not hold the lock; the lock is untouched.
    pub ack: bool,
}

/// Producer request to store a file.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Name the file will be stored and served under.
    pub filename: String,
    /// Raw file bytes, base64-encoded on the wire.
    #[serde(with = "payload_base64")]
    pub payload: Vec<u8>,
}

/// Answer to an upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// True once the payload and its manifest entry are durable on disk.
    pub success: bool,
    /// Human-readable refusal reason; `None` when `success` is true.
    pub error: Option<String>,
}

/// Answer to a download request.
///
/// `found` is the only way to tell an absent file from a stored empty one:
/// absent files come back as `found = false` with an empty payload, not as an
/// error.
#[derive(Debug, Serialize, Deserialize)]
pub struct DownloadResponse {
    pub found: bool,
    /// Stored bytes, base64-encoded on the wire; empty when `found` is false.
    #[serde(with = "payload_base64")]
    pub payload: Vec<u8>,
}

/// Serializes byte payloads as base64 strings inside JSON bodies.
pub(crate) mod payload_base64 {
    use base64::prelude::*;
    use serde::Deserialize;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&BASE64_STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        BASE64_STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}
