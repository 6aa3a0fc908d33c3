//! Storage Node Service
//!
//! Composes the distributed lock and the content store behind the operations
//! producers call. The service remembers which producer session the node is
//! currently held for, admits uploads only while the node actually owns the
//! cluster-wide critical section, and serializes store access in-process.

use super::types::{DenyReason, GrantDecision, UploadVerdict};
use crate::mutex::coordinator::DistributedMutex;
use crate::mutex::types::AcquireOutcome;
use crate::store::content::ContentStore;
use crate::store::types::CommitOutcome;

use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub struct NodeService {
    mutex: Arc<DistributedMutex>,
    store: Mutex<ContentStore>,
    /// The producer session the critical section is currently held for.
    session: Mutex<Option<u64>>,
    acquire_timeout: Duration,
}

impl NodeService {
    pub fn new(
        mutex: Arc<DistributedMutex>,
        store: ContentStore,
        acquire_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            mutex,
            store: Mutex::new(store),
            session: Mutex::new(None),
            acquire_timeout,
        })
    }

    /// Takes the cluster-wide critical section on behalf of a producer.
    ///
    /// One producer session at a time: while the node is held for a session,
    /// every other request is denied immediately and the producer is expected
    /// to retry with backoff. Otherwise the node runs the lock protocol and
    /// records the session once the cluster admits it.
    pub async fn acquire_for(&self, requester: u64) -> GrantDecision {
        {
            let session = self.lock_session();
            if let Some(holder) = *session {
                let reason = if holder == requester {
                    DenyReason::AlreadyHeld
                } else {
                    DenyReason::Busy
                };
                tracing::info!("Denying lock to producer session {}: {}", requester, reason);
                return GrantDecision::Denied(reason);
            }
        }

        match self.mutex.acquire(self.acquire_timeout).await {
            AcquireOutcome::Granted => {
                *self.lock_session() = Some(requester);
                tracing::info!("Producer session {} holds the critical section", requester);
                GrantDecision::Granted
            }
            AcquireOutcome::Busy => {
                tracing::info!(
                    "Denying lock to producer session {}: a claim is already in flight",
                    requester
                );
                GrantDecision::Denied(DenyReason::Busy)
            }
            AcquireOutcome::TimedOut => GrantDecision::Denied(DenyReason::Timeout),
        }
    }

    /// Gives the critical section back and flushes deferred peer replies.
    ///
    /// Only the session the lock was granted to may release it; anything else
    /// is logged and refused without touching the lock.
    pub async fn release_for(&self, requester: u64) -> bool {
        {
            let mut session = self.lock_session();
            match *session {
                Some(holder) if holder == requester => {
                    *session = None;
                }
                Some(holder) => {
                    tracing::warn!(
                        "Refusing release from session {}: session {} holds the node",
                        requester,
                        holder
                    );
                    return false;
                }
                None => {
                    tracing::warn!(
                        "Refusing release from session {}: the node is not held",
                        requester
                    );
                    return false;
                }
            }
        }

        if let Err(err) = self.mutex.release().await {
            // The session table and the lock state disagree; the lock wins.
            tracing::error!("Release for session {} found no held lock: {}", requester, err);
            return false;
        }

        tracing::info!("Producer session {} released the critical section", requester);
        true
    }

    /// Admits a file into the store.
    ///
    /// Requires the node to actually hold the cluster-wide critical section.
    /// The check is against the lock state itself, never against whatever an
    /// RPC call returned to the producer.
    pub fn upload(&self, filename: &str, payload: &[u8]) -> UploadVerdict {
        if !self.mutex.is_holding() {
            tracing::warn!(
                "Refusing upload of {:?}: critical section not held",
                filename
            );
            return UploadVerdict::NotHolding;
        }

        let committed = {
            let mut store = self.lock_store();
            store.commit(filename, payload)
        };

        match committed {
            Ok(CommitOutcome::Committed { digest }) => {
                tracing::info!("Stored {} ({} bytes)", filename, payload.len());
                UploadVerdict::Stored { digest }
            }
            Ok(CommitOutcome::Rejected(reason)) => {
                tracing::info!("Rejected upload of {}: {}", filename, reason);
                UploadVerdict::Rejected(reason)
            }
            Err(err) => {
                tracing::error!("Failed to persist {}: {:#}", filename, err);
                UploadVerdict::StorageFailed
            }
        }
    }

    /// Looks up a stored file. Reads take no cluster-wide lock.
    pub fn download(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        self.lock_store().fetch(filename)
    }

    /// Number of files the store currently tracks.
    pub fn stored_files(&self) -> usize {
        self.lock_store().len()
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<u64>> {
        match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_store(&self) -> MutexGuard<'_, ContentStore> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
