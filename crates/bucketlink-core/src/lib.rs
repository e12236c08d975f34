// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Bucketlink Authors

//! Core types and utilities for Bucketlink.
//!
//! This crate provides the building blocks shared by the replication setup code:
//! - Replication rule and configuration types, in the backend's wire format
//! - Application keys and capabilities
//! - Bucket snapshots
//! - Error types with backend-compatible error codes
//! - Configuration management

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod key;
pub mod replication;
pub mod types;

pub use config::{Config, LogFormat, LoggingConfig, SetupConfig};
pub use error::{Error, ErrorCode, Result};
pub use key::{ApplicationKey, Capability};
pub use replication::{
    ReplicationConfigError, ReplicationConfiguration, ReplicationDestinationConfiguration,
    ReplicationRule, ReplicationSourceConfiguration,
};
pub use types::{partition_bucket_path, BucketInfo};
