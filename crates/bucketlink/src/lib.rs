// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Bucketlink Authors

//! Cross-bucket replication setup for Bucketlink.
//!
//! This crate prepares the configuration a backend replication service
//! consumes: it creates or reuses the application keys each side needs and
//! writes the replication rule and key mapping onto the buckets.
//!
//! - **Source side**: a rule pointing at the destination bucket, plus a key
//!   that can read files, legal holds and retention settings
//! - **Destination side**: a mapping from that source key to a local key that
//!   can write and delete files, legal holds and retention settings
//!
//! Buckets are updated with optimistic concurrency: every write names the
//! revision it was based on and fails if the bucket moved on in between.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use bucketlink::{Bucket, InMemoryApi, NewRule, ReplicationSetupHelper};
//!
//! let api = Arc::new(InMemoryApi::new());
//! api.create_bucket("photos")?;
//! api.create_bucket("photos-backup")?;
//!
//! let source = Bucket::fetch(api.clone(), "photos").await?;
//! let destination = Bucket::fetch(api.clone(), "photos-backup").await?;
//!
//! let helper = ReplicationSetupHelper::default();
//! let (source, destination) =
//!     helper.setup_both(&source, &destination, NewRule::new().prefix("raw/")).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod bucket;
mod logging;
mod memory;
mod setup;

pub use api::Api;
pub use bucket::Bucket;
pub use bucketlink_core::{
    partition_bucket_path, ApplicationKey, BucketInfo, Capability, Config, Error, ErrorCode,
    LogFormat, LoggingConfig, ReplicationConfigError, ReplicationConfiguration,
    ReplicationDestinationConfiguration, ReplicationRule, ReplicationSourceConfiguration, Result,
    SetupConfig,
};
pub use logging::init_logging;
pub use memory::InMemoryApi;
pub use setup::{
    NewRule, ReplicationSetupHelper, DEFAULT_DESTINATION_CAPABILITIES, DEFAULT_SOURCE_CAPABILITIES,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exports() {
        let helper = ReplicationSetupHelper::default();
        assert_eq!(helper.config(), &SetupConfig::default());
        assert_eq!(DEFAULT_SOURCE_CAPABILITIES.len(), 3);
        assert_eq!(DEFAULT_DESTINATION_CAPABILITIES.len(), 4);
    }

    #[test]
    fn test_init_logging_rejects_bad_level() {
        let config = LoggingConfig { level: "bucketlink=loudest".to_string(), format: LogFormat::Pretty };
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(init_logging(&config), Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_new_rule_builder() {
        let rule =
            NewRule::new().name("r1").priority(3).prefix("logs/").include_existing_files(true);
        assert_eq!(rule.name.as_deref(), Some("r1"));
        assert_eq!(rule.priority, Some(3));
        assert_eq!(rule.prefix.as_deref(), Some("logs/"));
        assert!(rule.include_existing_files);
    }
}
