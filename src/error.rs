//! Error taxonomy of the tree-processing core.
//!
//! [`NotViewable`](ProcessError::NotViewable) is deliberately uniform across
//! "does not exist" and "exists but forbidden", so callers cannot let end
//! users enumerate tree ids. Everything else maps to an opaque server
//! failure.

use thiserror::Error;

// ----------------------------------------------------------------------------
// Store Error

/// Failure at the database or object-storage seam.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No object at the recorded storage location.
    #[error("object not found: s3://{bucket}/{key}")]
    ObjectMissing { bucket: String, key: String },

    /// The backend itself failed (connection, timeout, ...).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

// ----------------------------------------------------------------------------
// Process Error

/// Failure of a tree-processing request. No partial tree is ever returned
/// alongside one of these.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The tree does not exist or the user may not view it; the two cases
    /// are indistinguishable on purpose.
    #[error("phylo tree {tree_id} is not viewable by user {user_id}")]
    NotViewable { tree_id: i64, user_id: i64 },

    /// An authorized tree has no associated run: a data-integrity violation,
    /// not an authorization failure.
    #[error("no phylo run found for phylo tree {0}")]
    MissingRun(i64),

    /// Fetching the stored document failed.
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// The stored document is not a valid tree JSON document.
    #[error("failed to parse tree document: {0}")]
    Parse(#[from] serde_json::Error),
}
