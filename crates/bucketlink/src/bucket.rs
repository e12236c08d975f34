// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Bucketlink Authors

//! Bucket handles.

use std::sync::Arc;

use bucketlink_core::{BucketInfo, ReplicationConfiguration, Result};
use tracing::debug;

use crate::api::Api;

/// A bucket snapshot together with the gateway that owns it.
///
/// Source and destination buckets may belong to different accounts, so each
/// handle carries its own [`Api`].
#[derive(Clone)]
pub struct Bucket {
    api: Arc<dyn Api>,
    info: BucketInfo,
}

impl Bucket {
    /// Wraps a snapshot read through `api`.
    pub fn new(api: Arc<dyn Api>, info: BucketInfo) -> Self {
        Self { api, info }
    }

    /// Loads a bucket by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket cannot be read.
    pub async fn fetch(api: Arc<dyn Api>, name: &str) -> Result<Self> {
        let info = api.get_bucket_by_name(name).await?;
        Ok(Self::new(api, info))
    }

    /// The gateway this bucket was read through.
    pub fn api(&self) -> &Arc<dyn Api> {
        &self.api
    }

    /// Bucket id.
    pub fn id(&self) -> &str {
        &self.info.id
    }

    /// Bucket name.
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Revision observed when the snapshot was read.
    pub fn revision(&self) -> u64 {
        self.info.revision
    }

    /// Replication settings, if any.
    pub fn replication(&self) -> Option<&ReplicationConfiguration> {
        self.info.replication.as_ref()
    }

    /// Writes `replication` if the bucket is still at `if_revision_is`.
    ///
    /// Returns a fresh handle for the updated bucket; `self` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns the backend's error unchanged, including the conflict raised when
    /// the bucket was modified since it was read.
    pub async fn update(
        &self,
        if_revision_is: u64,
        replication: ReplicationConfiguration,
    ) -> Result<Self> {
        debug!(bucket = %self.info.name, revision = if_revision_is, "Updating bucket replication");
        let info = self.api.update_bucket(&self.info.id, if_revision_is, replication).await?;
        Ok(Self::new(Arc::clone(&self.api), info))
    }
}

impl std::fmt::Debug for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket").field("info", &self.info).finish_non_exhaustive()
    }
}
