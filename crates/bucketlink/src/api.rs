// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Bucketlink Authors

//! Backend gateway trait.

use async_trait::async_trait;
use bucketlink_core::{ApplicationKey, BucketInfo, Capability, ReplicationConfiguration, Result};

/// Gateway to the storage backend that owns buckets and application keys.
///
/// Implementations perform the actual network calls. Errors are returned as-is
/// to the caller; nothing in this crate retries or translates them.
#[async_trait]
pub trait Api: Send + Sync {
    /// Looks up an application key by id.
    ///
    /// Returns `Ok(None)` if the key does not exist (for example, it was deleted).
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    async fn get_key(&self, key_id: &str) -> Result<Option<ApplicationKey>>;

    /// Creates a new application key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses to create the key.
    async fn create_key(
        &self,
        capabilities: &[Capability],
        key_name: &str,
        bucket_id: Option<&str>,
        name_prefix: Option<&str>,
    ) -> Result<ApplicationKey>;

    /// Gets a bucket snapshot by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket does not exist.
    async fn get_bucket_by_name(&self, name: &str) -> Result<BucketInfo>;

    /// Replaces a bucket's replication configuration.
    ///
    /// The write only happens if the stored revision equals `if_revision_is`;
    /// otherwise the backend reports a conflict. On success the returned
    /// snapshot carries the new revision.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket does not exist, the revision has moved on,
    /// or the configuration is rejected.
    async fn update_bucket(
        &self,
        bucket_id: &str,
        if_revision_is: u64,
        replication: ReplicationConfiguration,
    ) -> Result<BucketInfo>;
}
