// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Bucketlink Authors

//! Application keys and their capabilities.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A named permission an application key can hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// List application keys.
    ListKeys,
    /// Create application keys.
    WriteKeys,
    /// Delete application keys.
    DeleteKeys,
    /// List buckets.
    ListBuckets,
    /// List the names of all buckets on the account.
    ListAllBucketNames,
    /// Read bucket settings.
    ReadBuckets,
    /// Create and update buckets.
    WriteBuckets,
    /// Delete buckets.
    DeleteBuckets,
    /// Read bucket default retention.
    ReadBucketRetentions,
    /// Update bucket default retention.
    WriteBucketRetentions,
    /// Read bucket default encryption.
    ReadBucketEncryption,
    /// Update bucket default encryption.
    WriteBucketEncryption,
    /// Read bucket replication settings.
    ReadBucketReplications,
    /// Update bucket replication settings.
    WriteBucketReplications,
    /// List files.
    ListFiles,
    /// Download files.
    ReadFiles,
    /// Create download authorizations.
    ShareFiles,
    /// Upload files.
    WriteFiles,
    /// Delete files.
    DeleteFiles,
    /// Read file legal holds.
    ReadFileLegalHolds,
    /// Set file legal holds.
    WriteFileLegalHolds,
    /// Read file retention settings.
    ReadFileRetentions,
    /// Set file retention settings.
    WriteFileRetentions,
    /// Bypass governance-mode retention.
    BypassGovernance,
    /// A capability this crate does not know by name.
    Other(String),
}

impl Capability {
    /// Parse from the wire name. Unknown names become [`Capability::Other`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "listKeys" => Self::ListKeys,
            "writeKeys" => Self::WriteKeys,
            "deleteKeys" => Self::DeleteKeys,
            "listBuckets" => Self::ListBuckets,
            "listAllBucketNames" => Self::ListAllBucketNames,
            "readBuckets" => Self::ReadBuckets,
            "writeBuckets" => Self::WriteBuckets,
            "deleteBuckets" => Self::DeleteBuckets,
            "readBucketRetentions" => Self::ReadBucketRetentions,
            "writeBucketRetentions" => Self::WriteBucketRetentions,
            "readBucketEncryption" => Self::ReadBucketEncryption,
            "writeBucketEncryption" => Self::WriteBucketEncryption,
            "readBucketReplications" => Self::ReadBucketReplications,
            "writeBucketReplications" => Self::WriteBucketReplications,
            "listFiles" => Self::ListFiles,
            "readFiles" => Self::ReadFiles,
            "shareFiles" => Self::ShareFiles,
            "writeFiles" => Self::WriteFiles,
            "deleteFiles" => Self::DeleteFiles,
            "readFileLegalHolds" => Self::ReadFileLegalHolds,
            "writeFileLegalHolds" => Self::WriteFileLegalHolds,
            "readFileRetentions" => Self::ReadFileRetentions,
            "writeFileRetentions" => Self::WriteFileRetentions,
            "bypassGovernance" => Self::BypassGovernance,
            other => Self::Other(other.to_string()),
        }
    }

    /// Convert to the wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ListKeys => "listKeys",
            Self::WriteKeys => "writeKeys",
            Self::DeleteKeys => "deleteKeys",
            Self::ListBuckets => "listBuckets",
            Self::ListAllBucketNames => "listAllBucketNames",
            Self::ReadBuckets => "readBuckets",
            Self::WriteBuckets => "writeBuckets",
            Self::DeleteBuckets => "deleteBuckets",
            Self::ReadBucketRetentions => "readBucketRetentions",
            Self::WriteBucketRetentions => "writeBucketRetentions",
            Self::ReadBucketEncryption => "readBucketEncryption",
            Self::WriteBucketEncryption => "writeBucketEncryption",
            Self::ReadBucketReplications => "readBucketReplications",
            Self::WriteBucketReplications => "writeBucketReplications",
            Self::ListFiles => "listFiles",
            Self::ReadFiles => "readFiles",
            Self::ShareFiles => "shareFiles",
            Self::WriteFiles => "writeFiles",
            Self::DeleteFiles => "deleteFiles",
            Self::ReadFileLegalHolds => "readFileLegalHolds",
            Self::WriteFileLegalHolds => "writeFileLegalHolds",
            Self::ReadFileRetentions => "readFileRetentions",
            Self::WriteFileRetentions => "writeFileRetentions",
            Self::BypassGovernance => "bypassGovernance",
            Self::Other(name) => name,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Capability {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name: String = Deserialize::deserialize(deserializer)?;
        Ok(Self::parse(&name))
    }
}

/// An application key as reported by the backend.
///
/// The secret is never part of this record; only the metadata needed to
/// decide whether a key can be reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationKey {
    /// Key id.
    #[serde(rename = "applicationKeyId")]
    pub id: String,

    /// Human-readable key name.
    #[serde(rename = "keyName")]
    pub name: String,

    /// Bucket the key is restricted to, if any.
    #[serde(default)]
    pub bucket_id: Option<String>,

    /// File name prefix the key is restricted to, if any.
    #[serde(default)]
    pub name_prefix: Option<String>,

    /// Capabilities granted to the key.
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
}

impl ApplicationKey {
    /// Returns true if the key holds every capability in `required`.
    #[must_use]
    pub fn has_capabilities(&self, required: &[Capability]) -> bool {
        required.iter().all(|c| self.capabilities.contains(c))
    }

    /// Returns true if the key is limited to a file name prefix.
    ///
    /// An empty prefix restricts nothing.
    #[must_use]
    pub fn is_prefix_restricted(&self) -> bool {
        self.name_prefix.as_deref().is_some_and(|p| !p.is_empty())
    }
}
