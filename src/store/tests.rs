//! Store Module Tests
//!
//! Validates the content-addressed store against a real (temporary) filesystem.
//!
//! ## Test Scopes
//! - **Round trips**: committed payloads come back byte for byte.
//! - **Deduplication**: name and content collisions are rejected without
//!   touching disk.
//! - **Durability**: a reopened store sees exactly what was committed.
//! - **Failed commits**: a commit that cannot persist leaves no trace behind.

#[cfg(test)]
mod tests {
    use crate::store::content::{content_digest, ContentStore};
    use crate::store::types::{CommitOutcome, RejectReason};

    fn open_store(dir: &tempfile::TempDir) -> ContentStore {
        ContentStore::open(dir.path().join("files"), dir.path().join("manifest.json")).unwrap()
    }

    // ============================================================
    // ROUND TRIPS
    // ============================================================

    #[test]
    fn test_commit_and_fetch_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);

        // ACT
        let outcome = store.commit("report.txt", b"quarterly numbers").unwrap();

        // ASSERT
        match outcome {
            CommitOutcome::Committed { digest } => {
                assert_eq!(digest, content_digest(b"quarterly numbers"));
            }
            other => panic!("expected a commit, got {:?}", other),
        }

        let fetched = store.fetch("report.txt").unwrap();
        assert_eq!(fetched, Some(b"quarterly numbers".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_fetch_unknown_name_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let fetched = store.fetch("never-uploaded.txt").unwrap();
        assert!(fetched.is_none());
    }

    #[test]
    fn test_empty_payload_is_storable_and_distinct_from_absent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);

        let outcome = store.commit("empty.bin", b"").unwrap();
        assert!(matches!(outcome, CommitOutcome::Committed { .. }));

        // Present-but-empty fetches as Some with zero bytes
        let fetched = store.fetch("empty.bin").unwrap();
        assert_eq!(fetched, Some(Vec::new()));

        // A name that was never stored fetches as None
        assert!(store.fetch("missing.bin").unwrap().is_none());
    }

    #[test]
    fn test_digest_format_and_known_vector() {
        let digest = content_digest(b"hello");

        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    // ============================================================
    // DEDUPLICATION
    // ============================================================

    #[test]
    fn test_duplicate_name_rejected_even_with_new_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);

        store.commit("notes.txt", b"first version").unwrap();

        let outcome = store.commit("notes.txt", b"second version").unwrap();
        assert_eq!(
            outcome,
            CommitOutcome::Rejected(RejectReason::DuplicateName)
        );

        // The original bytes are untouched
        let fetched = store.fetch("notes.txt").unwrap();
        assert_eq!(fetched, Some(b"first version".to_vec()));
    }

    #[test]
    fn test_duplicate_content_rejected_under_any_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);

        let first = store.commit("a.txt", b"same bytes").unwrap();
        assert!(matches!(first, CommitOutcome::Committed { .. }));

        let second = store.commit("b.txt", b"same bytes").unwrap();
        assert_eq!(
            second,
            CommitOutcome::Rejected(RejectReason::DuplicateContent)
        );

        assert_eq!(store.len(), 1);
        assert!(store.contains("a.txt"));
        assert!(!store.contains("b.txt"));
    }

    #[test]
    fn test_content_dedup_is_order_independent() {
        // Whichever name arrives second loses, exactly one copy is kept
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);

        store.commit("b.txt", b"payload").unwrap();
        let outcome = store.commit("a.txt", b"payload").unwrap();

        assert_eq!(
            outcome,
            CommitOutcome::Rejected(RejectReason::DuplicateContent)
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_traversal_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);

        for name in ["", ".", "..", "../escape.txt", "nested/inner.txt", "back\\slash"] {
            let outcome = store.commit(name, b"anything").unwrap();
            assert_eq!(
                outcome,
                CommitOutcome::Rejected(RejectReason::InvalidName),
                "name {:?} should be refused",
                name
            );
        }
        assert!(store.is_empty());
    }

    // ============================================================
    // DURABILITY
    // ============================================================

    #[test]
    fn test_reopened_store_sees_committed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path().join("files");
        let manifest = dir.path().join("manifest.json");

        let digest = {
            let mut store = ContentStore::open(&storage, &manifest).unwrap();
            match store.commit("kept.txt", b"survives restarts").unwrap() {
                CommitOutcome::Committed { digest } => digest,
                other => panic!("expected a commit, got {:?}", other),
            }
        };

        // Reopen at the same paths, as a restarted node would
        let reopened = ContentStore::open(&storage, &manifest).unwrap();

        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.digest_of("kept.txt"), Some(digest.as_str()));
        assert_eq!(
            reopened.fetch("kept.txt").unwrap(),
            Some(b"survives restarts".to_vec())
        );
    }

    #[test]
    fn test_reopened_store_still_dedups_content() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path().join("files");
        let manifest = dir.path().join("manifest.json");

        {
            let mut store = ContentStore::open(&storage, &manifest).unwrap();
            store.commit("original.txt", b"dedup me").unwrap();
        }

        let mut reopened = ContentStore::open(&storage, &manifest).unwrap();
        let outcome = reopened.commit("copy.txt", b"dedup me").unwrap();

        assert_eq!(
            outcome,
            CommitOutcome::Rejected(RejectReason::DuplicateContent)
        );
    }

    #[test]
    fn test_manifest_has_no_leftover_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path().join("files");
        let manifest = dir.path().join("manifest.json");

        let mut store = ContentStore::open(&storage, &manifest).unwrap();
        store.commit("one.txt", b"1").unwrap();
        store.commit("two.txt", b"2").unwrap();

        assert!(manifest.exists());
        assert!(!dir.path().join("manifest.tmp").exists());
    }

    // ============================================================
    // FAILED COMMITS
    // ============================================================

    #[test]
    fn test_failed_manifest_write_leaves_the_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path().join("files");
        // The manifest's parent directory does not exist, so the payload
        // write succeeds but persisting the manifest cannot.
        let manifest = dir.path().join("missing-dir").join("manifest.json");

        let mut store = ContentStore::open(&storage, &manifest).unwrap();

        let result = store.commit("doomed.txt", b"never durable");
        assert!(result.is_err());

        // The index never saw the entry
        assert!(!store.contains("doomed.txt"));
        assert_eq!(store.len(), 0);

        // The orphaned payload file was cleaned up
        assert!(!storage.join("doomed.txt").exists());

        // Once the manifest can be written, the same commit goes through
        std::fs::create_dir_all(dir.path().join("missing-dir")).unwrap();
        let outcome = store.commit("doomed.txt", b"never durable").unwrap();
        assert!(matches!(outcome, CommitOutcome::Committed { .. }));
        assert_eq!(
            store.fetch("doomed.txt").unwrap(),
            Some(b"never durable".to_vec())
        );
    }

    #[test]
    fn test_failed_commit_does_not_poison_content_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let storage = dir.path().join("files");
        let manifest = dir.path().join("missing-dir").join("manifest.json");

        let mut store = ContentStore::open(&storage, &manifest).unwrap();
        assert!(store.commit("first.txt", b"shared bytes").is_err());

        // The failed commit recorded neither the name nor the digest, so the
        // same content is accepted under another name once writes succeed
        std::fs::create_dir_all(dir.path().join("missing-dir")).unwrap();
        let outcome = store.commit("second.txt", b"shared bytes").unwrap();
        assert!(matches!(outcome, CommitOutcome::Committed { .. }));
        assert_eq!(store.len(), 1);
        assert!(store.contains("second.txt"));
        assert!(!store.contains("first.txt"));
    }
}
