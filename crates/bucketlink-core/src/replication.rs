// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Bucketlink Authors

//! Bucket replication configuration types.
//!
//! A bucket can act as a replication source (it owns rules pointing at
//! destination buckets and names the key the replication service reads with),
//! as a replication destination (it maps source key ids to the local key the
//! service writes with), or both.
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "asReplicationSource": {
//!     "sourceApplicationKeyId": "0014ab0c6e3a0000000000001",
//!     "replicationRules": [
//!       {
//!         "destinationBucketId": "9a6b2e1f0d3c",
//!         "fileNamePrefix": "logs/",
//!         "includeExistingFiles": false,
//!         "isEnabled": true,
//!         "priority": 128,
//!         "replicationRuleName": "archive"
//!       }
//!     ]
//!   },
//!   "asReplicationDestination": null
//! }
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// Replication configuration attached to a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationConfiguration {
    /// Settings used when the bucket replicates to other buckets.
    #[serde(default)]
    pub as_replication_source: Option<ReplicationSourceConfiguration>,

    /// Settings used when other buckets replicate into this one.
    #[serde(default)]
    pub as_replication_destination: Option<ReplicationDestinationConfiguration>,
}

impl ReplicationConfiguration {
    /// Creates a configuration from its two optional halves.
    #[must_use]
    pub fn new(
        source: Option<ReplicationSourceConfiguration>,
        destination: Option<ReplicationDestinationConfiguration>,
    ) -> Self {
        Self { as_replication_source: source, as_replication_destination: destination }
    }

    /// Rules of the source half, or an empty slice when the bucket is not a source.
    #[must_use]
    pub fn source_rules(&self) -> &[ReplicationRule] {
        self.as_replication_source.as_ref().map_or(&[], |s| s.rules.as_slice())
    }

    /// Key id the replication service reads the source bucket with, if any.
    #[must_use]
    pub fn source_key_id(&self) -> Option<&str> {
        self.as_replication_source.as_ref().and_then(|s| s.source_application_key_id.as_deref())
    }

    /// Returns true if neither half is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_replication_source.is_none() && self.as_replication_destination.is_none()
    }

    /// Validate the source half.
    ///
    /// The destination half is a plain key mapping with nothing to check.
    pub fn validate(&self) -> Result<(), ReplicationConfigError> {
        if let Some(ref source) = self.as_replication_source {
            source.validate()?;
        }
        Ok(())
    }
}

/// Source half of a replication configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationSourceConfiguration {
    /// Key the replication service uses to read from the source bucket.
    #[serde(default)]
    pub source_application_key_id: Option<String>,

    /// Ordered list of replication rules.
    #[serde(default, rename = "replicationRules")]
    pub rules: Vec<ReplicationRule>,
}

impl ReplicationSourceConfiguration {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ReplicationConfigError> {
        let mut names = HashSet::new();
        for rule in &self.rules {
            if !names.insert(rule.name.as_str()) {
                return Err(ReplicationConfigError::DuplicateRuleName(rule.name.clone()));
            }
        }

        for rule in &self.rules {
            rule.validate()?;
        }

        Ok(())
    }
}

/// Destination half of a replication configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationDestinationConfiguration {
    /// Maps a source bucket's key id to the key id used to write here.
    #[serde(default)]
    pub source_to_destination_key_mapping: BTreeMap<String, String>,
}

impl ReplicationDestinationConfiguration {
    /// Creates a destination configuration from an existing mapping.
    #[must_use]
    pub fn new(source_to_destination_key_mapping: BTreeMap<String, String>) -> Self {
        Self { source_to_destination_key_mapping }
    }

    /// Distinct destination key ids referenced by the mapping, in mapping order.
    pub fn destination_key_ids(&self) -> impl Iterator<Item = &str> {
        let mut seen = HashSet::new();
        self.source_to_destination_key_mapping
            .values()
            .map(String::as_str)
            .filter(move |id| seen.insert(*id))
    }
}

/// A single replication rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationRule {
    /// Rule name, unique within the source configuration.
    #[serde(rename = "replicationRuleName")]
    pub name: String,

    /// Priority of the rule.
    #[serde(default = "default_priority")]
    pub priority: u32,

    /// Bucket the matching files are copied to.
    pub destination_bucket_id: String,

    /// Only files whose names start with this prefix are replicated.
    #[serde(default)]
    pub file_name_prefix: String,

    /// Whether files that existed before the rule was created are copied too.
    #[serde(default)]
    pub include_existing_files: bool,

    /// Whether the rule is active.
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

const fn default_priority() -> u32 {
    ReplicationRule::DEFAULT_PRIORITY
}

const fn default_enabled() -> bool {
    true
}

impl ReplicationRule {
    /// Priority assigned to the first rule of a bucket.
    pub const DEFAULT_PRIORITY: u32 = 128;
    /// Lowest accepted priority.
    pub const MIN_PRIORITY: u32 = 1;
    /// Highest accepted priority (2^31 - 1).
    pub const MAX_PRIORITY: u32 = i32::MAX as u32;
    /// Maximum length of a rule name.
    pub const MAX_NAME_LEN: usize = 64;

    /// Creates an enabled rule with the default priority and no prefix.
    #[must_use]
    pub fn new(name: impl Into<String>, destination_bucket_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: Self::DEFAULT_PRIORITY,
            destination_bucket_id: destination_bucket_id.into(),
            file_name_prefix: String::new(),
            include_existing_files: false,
            is_enabled: true,
        }
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the file name prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_name_prefix = prefix.into();
        self
    }

    /// Sets whether existing files are replicated.
    #[must_use]
    pub fn with_include_existing_files(mut self, include: bool) -> Self {
        self.include_existing_files = include;
        self
    }

    /// Validate the rule.
    pub fn validate(&self) -> Result<(), ReplicationConfigError> {
        if self.destination_bucket_id.is_empty() {
            return Err(ReplicationConfigError::MissingDestination);
        }
        if !is_valid_rule_name(&self.name) {
            return Err(ReplicationConfigError::InvalidRuleName(self.name.clone()));
        }
        if !(Self::MIN_PRIORITY..=Self::MAX_PRIORITY).contains(&self.priority) {
            return Err(ReplicationConfigError::PriorityOutOfRange(self.priority));
        }
        Ok(())
    }
}

/// Rule names are 1 to 64 ASCII letters, digits, `-` or `_`.
fn is_valid_rule_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= ReplicationRule::MAX_NAME_LEN
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Errors from replication configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplicationConfigError {
    /// Duplicate rule name.
    #[error("duplicate replication rule name: {0}")]
    DuplicateRuleName(String),

    /// Rule name has invalid characters or length.
    #[error("invalid replication rule name: {0:?}")]
    InvalidRuleName(String),

    /// Destination bucket is required.
    #[error("destination bucket id is required")]
    MissingDestination,

    /// Priority outside the accepted range.
    #[error(
        "priority {0} is out of range [{min}, {max}]",
        min = ReplicationRule::MIN_PRIORITY,
        max = ReplicationRule::MAX_PRIORITY
    )]
    PriorityOutOfRange(u32),
}
