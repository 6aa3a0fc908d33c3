use std::fmt;

/// Why the store refused a file.
///
/// Rejections are ordinary outcomes, not errors: the store stays untouched and
/// the reason is reported back to the producer verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A file with this name is already stored.
    DuplicateName,
    /// The same bytes are already stored under another name.
    DuplicateContent,
    /// The name cannot be used as a storage path.
    InvalidName,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::DuplicateName => write!(f, "file name already exists"),
            RejectReason::DuplicateContent => {
                write!(f, "file content already stored under a different name")
            }
            RejectReason::InvalidName => write!(f, "file name is not storable"),
        }
    }
}

/// Result of admitting a file into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The payload and its manifest entry are durable on disk.
    Committed { digest: String },
    /// The store refused the file; nothing was written.
    Rejected(RejectReason),
}
