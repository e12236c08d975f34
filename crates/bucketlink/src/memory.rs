// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Bucketlink Authors

//! In-memory backend.
//!
//! Keeps buckets and application keys in process memory and enforces the same
//! revision check on bucket updates as the real service. Used for tests and
//! local experiments.

use async_trait::async_trait;
use bucketlink_core::{
    ApplicationKey, BucketInfo, Capability, Error, ErrorCode, ReplicationConfiguration, Result,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::api::Api;

/// An [`Api`] backed by concurrent in-memory maps.
#[derive(Debug, Default)]
pub struct InMemoryApi {
    /// Keys by id.
    keys: DashMap<String, ApplicationKey>,
    /// Buckets by id.
    buckets: DashMap<String, BucketInfo>,
    /// Bucket ids by name.
    names: DashMap<String, String>,
}

impl InMemoryApi {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bucket at revision 1.
    ///
    /// # Errors
    ///
    /// Returns an error if a bucket with the same name exists.
    pub fn create_bucket(&self, name: &str) -> Result<BucketInfo> {
        let info = match self.names.entry(name.to_string()) {
            Entry::Occupied(_) => {
                return Err(Error::api_with_resource(
                    ErrorCode::BadRequest,
                    "bucket name is already in use",
                    name,
                ));
            }
            Entry::Vacant(slot) => {
                let info = BucketInfo::new(Uuid::new_v4().simple().to_string(), name);
                // Inserted while the name shard is still locked.
                self.buckets.insert(info.id.clone(), info.clone());
                slot.insert(info.id.clone());
                info
            }
        };
        Ok(info)
    }

    /// Deletes a key. Returns the removed key, if it existed.
    pub fn delete_key(&self, key_id: &str) -> Option<ApplicationKey> {
        self.keys.remove(key_id).map(|(_, key)| key)
    }

    /// Number of keys on the account.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Current snapshot of a bucket by id.
    pub fn bucket(&self, bucket_id: &str) -> Option<BucketInfo> {
        self.buckets.get(bucket_id).map(|b| b.value().clone())
    }
}

#[async_trait]
impl Api for InMemoryApi {
    async fn get_key(&self, key_id: &str) -> Result<Option<ApplicationKey>> {
        Ok(self.keys.get(key_id).map(|k| k.value().clone()))
    }

    async fn create_key(
        &self,
        capabilities: &[Capability],
        key_name: &str,
        bucket_id: Option<&str>,
        name_prefix: Option<&str>,
    ) -> Result<ApplicationKey> {
        if let Some(id) = bucket_id {
            if !self.buckets.contains_key(id) {
                return Err(Error::api_with_resource(ErrorCode::NotFound, "no such bucket", id));
            }
        }

        let key = ApplicationKey {
            id: Uuid::new_v4().simple().to_string(),
            name: key_name.to_string(),
            bucket_id: bucket_id.map(str::to_string),
            name_prefix: name_prefix.map(str::to_string),
            capabilities: capabilities.iter().cloned().collect(),
        };
        debug!(key_id = %key.id, key_name, "Created application key");
        self.keys.insert(key.id.clone(), key.clone());
        Ok(key)
    }

    async fn get_bucket_by_name(&self, name: &str) -> Result<BucketInfo> {
        self.names
            .get(name)
            .and_then(|id| self.bucket(id.value()))
            .ok_or_else(|| Error::api_with_resource(ErrorCode::NotFound, "no such bucket", name))
    }

    async fn update_bucket(
        &self,
        bucket_id: &str,
        if_revision_is: u64,
        replication: ReplicationConfiguration,
    ) -> Result<BucketInfo> {
        replication.validate()?;

        let mut bucket = self.buckets.get_mut(bucket_id).ok_or_else(|| {
            Error::api_with_resource(ErrorCode::NotFound, "no such bucket", bucket_id)
        })?;
        if bucket.revision != if_revision_is {
            return Err(Error::RevisionMismatch {
                bucket: bucket_id.to_string(),
                expected: if_revision_is,
                actual: bucket.revision,
            });
        }

        bucket.revision += 1;
        bucket.replication = Some(replication);
        debug!(bucket = %bucket.name, revision = bucket.revision, "Stored bucket replication");
        Ok(bucket.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bucketlink_core::{ReplicationRule, ReplicationSourceConfiguration};

    use super::*;

    #[tokio::test]
    async fn test_create_and_fetch_bucket() {
        let api = InMemoryApi::new();
        let created = api.create_bucket("photos").unwrap();
        assert_eq!(created.revision, 1);

        let fetched = api.get_bucket_by_name("photos").await.unwrap();
        assert_eq!(fetched, created);

        let err = api.get_bucket_by_name("missing").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(api.create_bucket("photos").is_err());
    }

    #[test]
    fn test_concurrent_create_bucket_with_same_name() {
        let api = Arc::new(InMemoryApi::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let api = Arc::clone(&api);
                std::thread::spawn(move || api.create_bucket("photos").is_ok())
            })
            .collect();

        let created = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
        assert_eq!(created, 1);
        assert_eq!(api.buckets.len(), 1);
    }

    #[tokio::test]
    async fn test_key_lifecycle() {
        let api = InMemoryApi::new();
        let bucket = api.create_bucket("photos").unwrap();

        let key = api
            .create_key(&[Capability::ReadFiles], "photos-replisrc", Some(&bucket.id), None)
            .await
            .unwrap();
        assert_eq!(api.key_count(), 1);
        assert_eq!(api.get_key(&key.id).await.unwrap(), Some(key.clone()));

        assert!(api.delete_key(&key.id).is_some());
        assert_eq!(api.get_key(&key.id).await.unwrap(), None);
        assert!(api.delete_key(&key.id).is_none());
    }

    #[tokio::test]
    async fn test_create_key_for_unknown_bucket() {
        let api = InMemoryApi::new();
        let err = api.create_key(&[], "k", Some("nope"), None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_update_checks_revision() {
        let api = InMemoryApi::new();
        let bucket = api.create_bucket("photos").unwrap();

        let updated = api
            .update_bucket(&bucket.id, 1, ReplicationConfiguration::default())
            .await
            .unwrap();
        assert_eq!(updated.revision, 2);

        let err = api
            .update_bucket(&bucket.id, 1, ReplicationConfiguration::default())
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(matches!(err, Error::RevisionMismatch { expected: 1, actual: 2, .. }));
        assert_eq!(api.bucket(&bucket.id).unwrap().revision, 2);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_configuration() {
        let api = InMemoryApi::new();
        let bucket = api.create_bucket("photos").unwrap();
        let config = ReplicationConfiguration::new(
            Some(ReplicationSourceConfiguration {
                source_application_key_id: Some("k".to_string()),
                rules: vec![ReplicationRule::new("dup", "b2"), ReplicationRule::new("dup", "b3")],
            }),
            None,
        );

        let err = api.update_bucket(&bucket.id, 1, config).await.unwrap_err();
        assert!(matches!(err, Error::InvalidReplication(_)));
        assert_eq!(api.bucket(&bucket.id).unwrap().revision, 1);
    }
}
