// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Bucketlink Authors

//! Common types used throughout Bucketlink.

use serde::{Deserialize, Serialize};

use crate::replication::ReplicationConfiguration;

/// A snapshot of a bucket record as stored by the backend.
///
/// `revision` increases on every update and guards conditional writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketInfo {
    /// Bucket id.
    #[serde(rename = "bucketId")]
    pub id: String,
    /// Bucket name.
    #[serde(rename = "bucketName")]
    pub name: String,
    /// Optimistic-concurrency revision.
    pub revision: u64,
    /// Replication settings, if any have been written.
    #[serde(default, rename = "replicationConfiguration")]
    pub replication: Option<ReplicationConfiguration>,
}

impl BucketInfo {
    /// Creates a bucket snapshot at revision 1 with no replication settings.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), revision: 1, replication: None }
    }
}

/// Splits `bucket/path/inside` into `("bucket", "path/inside")`.
///
/// The path is empty when there is no `/`.
#[must_use]
pub fn partition_bucket_path(bucket_path: &str) -> (&str, &str) {
    bucket_path.split_once('/').unwrap_or((bucket_path, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_bucket_path() {
        assert_eq!(partition_bucket_path("photos"), ("photos", ""));
        assert_eq!(partition_bucket_path("photos/"), ("photos", ""));
        assert_eq!(partition_bucket_path("photos/2024/june"), ("photos", "2024/june"));
        assert_eq!(partition_bucket_path(""), ("", ""));
    }

    #[test]
    fn test_bucket_info_wire_format() {
        let json = r#"{"bucketId": "b1", "bucketName": "photos", "revision": 7}"#;
        let info: BucketInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.id, "b1");
        assert_eq!(info.name, "photos");
        assert_eq!(info.revision, 7);
        assert!(info.replication.is_none());
    }
}
