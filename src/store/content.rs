use super::types::{CommitOutcome, RejectReason};

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File store that indexes every payload by name and by content digest.
///
/// The manifest on disk is the source of truth: a JSON object mapping each
/// stored filename to the lowercase hex SHA-256 of its bytes. Payload files
/// live under `storage_dir` named exactly as they were uploaded.
pub struct ContentStore {
    storage_dir: PathBuf,
    manifest_path: PathBuf,
    entries: BTreeMap<String, String>,
    digests: HashSet<String>,
}

impl ContentStore {
    /// Opens the store rooted at `storage_dir`, loading the manifest when one
    /// exists. A missing manifest means an empty store.
    pub fn open(storage_dir: impl AsRef<Path>, manifest_path: impl AsRef<Path>) -> Result<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        let manifest_path = manifest_path.as_ref().to_path_buf();

        fs::create_dir_all(&storage_dir)?;

        let entries: BTreeMap<String, String> = if manifest_path.exists() {
            let raw = fs::read(&manifest_path)?;
            serde_json::from_slice(&raw)?
        } else {
            BTreeMap::new()
        };

        let digests = entries.values().cloned().collect();

        Ok(Self {
            storage_dir,
            manifest_path,
            entries,
            digests,
        })
    }

    /// Admits a file into the store.
    ///
    /// Duplicate names, duplicate content, and unusable names are rejected
    /// before anything touches disk. On the write path the payload file is
    /// flushed first and the manifest second; the in-memory index is updated
    /// only once both are durable, so a failed commit leaves the store exactly
    /// as it was.
    pub fn commit(&mut self, filename: &str, payload: &[u8]) -> Result<CommitOutcome> {
        if !is_safe_filename(filename) {
            tracing::warn!("Rejecting unstorable filename {:?}", filename);
            return Ok(CommitOutcome::Rejected(RejectReason::InvalidName));
        }
        if self.entries.contains_key(filename) {
            return Ok(CommitOutcome::Rejected(RejectReason::DuplicateName));
        }

        let digest = content_digest(payload);
        if self.digests.contains(&digest) {
            return Ok(CommitOutcome::Rejected(RejectReason::DuplicateContent));
        }

        let payload_path = self.storage_dir.join(filename);
        write_durable(&payload_path, payload)?;

        let mut next = self.entries.clone();
        next.insert(filename.to_string(), digest.clone());

        if let Err(err) = self.write_manifest(&next) {
            // The payload file is an orphan without its manifest entry;
            // remove it so a retried commit starts clean.
            if let Err(cleanup) = fs::remove_file(&payload_path) {
                tracing::warn!(
                    "Failed to remove orphaned payload {}: {}",
                    payload_path.display(),
                    cleanup
                );
            }
            return Err(err);
        }

        self.entries = next;
        self.digests.insert(digest.clone());

        tracing::debug!("Committed {} ({} bytes, sha256 {})", filename, payload.len(), digest);

        Ok(CommitOutcome::Committed { digest })
    }

    /// Looks up a stored file. `Ok(None)` means the name is unknown; a name
    /// the manifest lists but whose payload cannot be read is an error.
    pub fn fetch(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        if !self.entries.contains_key(filename) {
            return Ok(None);
        }

        let payload_path = self.storage_dir.join(filename);
        match fs::read(&payload_path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) => Err(anyhow::anyhow!(
                "manifest lists {} but its payload is unreadable: {}",
                filename,
                err
            )),
        }
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    pub fn digest_of(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(|digest| digest.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrites the whole manifest through a temp file in the same directory,
    /// then renames it over the old one.
    fn write_manifest(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let tmp_path = self.manifest_path.with_extension("tmp");
        let raw = serde_json::to_vec_pretty(entries)?;
        write_durable(&tmp_path, &raw)?;
        fs::rename(&tmp_path, &self.manifest_path)?;
        Ok(())
    }
}

/// Lowercase hex SHA-256 of a payload, the identity the store dedups on.
pub fn content_digest(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hex::encode(hasher.finalize())
}

fn write_durable(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

// Filenames become paths under the storage directory, so anything that could
// escape it or collide with path syntax is refused.
fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}
