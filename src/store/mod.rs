//! Seams to the external database and object store.
//!
//! Production backends (a relational database with a geo-distance function,
//! an S3-compatible object store) implement these traits; the in-memory
//! [`MemoryDatabase`] and [`MemoryStore`] back tests and the offline CLI.

mod memory;

#[doc(inline)]
pub use memory::{MemoryDatabase, MemoryStore};

use crate::error::StoreError;
use crate::model::{DataType, PhyloRun, PhyloTree, Sample};
use async_trait::async_trait;
use std::collections::BTreeSet;

// ----------------------------------------------------------------------------
// Object Store

/// Read access to immutable JSON documents addressed by `(bucket, key)`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the raw bytes at `(bucket, key)`.
    ///
    /// Absent or inaccessible objects fail with a [`StoreError`]; retries
    /// are the implementation's concern, never the caller's.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;
}

// ----------------------------------------------------------------------------
// Database

/// Read access to the relational surveillance data, with related entities
/// (run owner group, group default location) eager-loaded.
#[async_trait]
pub trait Database: Send + Sync {
    /// Returns the tree with the given id, if it exists.
    async fn phylo_tree(&self, tree_id: i64) -> Result<Option<PhyloTree>, StoreError>;

    /// Returns the run a tree belongs to, with its owning group and that
    /// group's default location eager-loaded.
    async fn run_for_tree(&self, tree_id: i64) -> Result<Option<PhyloRun>, StoreError>;

    /// Returns every sample submitted by a group.
    async fn samples_for_group(&self, group_id: i64) -> Result<Vec<Sample>, StoreError>;

    /// Returns the ids of groups that granted `viewer_group_id` visibility
    /// into their data of the given [`DataType`].
    async fn can_see_group_ids(
        &self,
        viewer_group_id: i64,
        data_type: DataType,
    ) -> Result<BTreeSet<i64>, StoreError>;

    /// Returns up to `limit` distinct countries from `candidates`, ordered by
    /// great-circle distance from `origin_country` ascending.
    ///
    /// Only country-level location rows participate. An origin country with
    /// no country-level row yields an empty ranking; that is an anomaly for
    /// the caller to absorb, not an error.
    async fn nearest_countries(
        &self,
        origin_country: &str,
        candidates: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<String>, StoreError>;
}
