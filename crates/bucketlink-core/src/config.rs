// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Bucketlink Authors

//! Configuration management for Bucketlink.

use serde::{Deserialize, Serialize};

use crate::replication::ReplicationRule;

/// Default distance between the highest existing rule priority and a new rule.
pub const DEFAULT_PRIORITY_OFFSET: u32 = 5;

/// Suffix appended to the bucket name when naming a new source key.
pub const DEFAULT_SOURCE_KEY_SUFFIX: &str = "-replisrc";

/// Suffix appended to the bucket name when naming a new destination key.
pub const DEFAULT_DESTINATION_KEY_SUFFIX: &str = "-replidst";

/// Number of bucket name characters kept in a generated key name.
pub const DEFAULT_KEY_NAME_BUCKET_CHARS: usize = 91;

/// Main configuration for Bucketlink.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Replication setup configuration.
    pub setup: SetupConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(crate::Error::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string cannot be parsed or a section is invalid.
    pub fn parse(content: &str) -> crate::Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.setup.validate()?;
        Ok(config)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format.
    #[default]
    Pretty,
    /// JSON format.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub level: String,
    /// Log output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}

/// Tunables for replication setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// How far above the highest existing priority a new rule is placed.
    pub priority_offset: u32,

    /// Priority of the first rule on a bucket.
    pub default_priority: u32,

    /// Suffix of generated source key names.
    pub source_key_suffix: String,

    /// Suffix of generated destination key names.
    pub destination_key_suffix: String,

    /// How many characters of the bucket name go into a generated key name.
    pub key_name_bucket_chars: usize,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            priority_offset: DEFAULT_PRIORITY_OFFSET,
            default_priority: ReplicationRule::DEFAULT_PRIORITY,
            source_key_suffix: DEFAULT_SOURCE_KEY_SUFFIX.to_string(),
            destination_key_suffix: DEFAULT_DESTINATION_KEY_SUFFIX.to_string(),
            key_name_bucket_chars: DEFAULT_KEY_NAME_BUCKET_CHARS,
        }
    }
}

impl SetupConfig {
    /// Creates a setup configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the priority offset.
    pub fn priority_offset(mut self, offset: u32) -> Self {
        self.priority_offset = offset;
        self
    }

    /// Sets the priority of the first rule.
    pub fn default_priority(mut self, priority: u32) -> Self {
        self.default_priority = priority;
        self
    }

    /// Sets the source key name suffix.
    pub fn source_key_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.source_key_suffix = suffix.into();
        self
    }

    /// Sets the destination key name suffix.
    pub fn destination_key_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.destination_key_suffix = suffix.into();
        self
    }

    /// Builds a source key name for `bucket_name`.
    pub fn source_key_name(&self, bucket_name: &str) -> String {
        self.key_name(bucket_name, &self.source_key_suffix)
    }

    /// Builds a destination key name for `bucket_name`.
    pub fn destination_key_name(&self, bucket_name: &str) -> String {
        self.key_name(bucket_name, &self.destination_key_suffix)
    }

    fn key_name(&self, bucket_name: &str, suffix: &str) -> String {
        let head: String = bucket_name.chars().take(self.key_name_bucket_chars).collect();
        format!("{head}{suffix}")
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the default priority is outside the accepted range.
    pub fn validate(&self) -> crate::Result<()> {
        if !(ReplicationRule::MIN_PRIORITY..=ReplicationRule::MAX_PRIORITY)
            .contains(&self.default_priority)
        {
            return Err(crate::Error::Config(format!(
                "default_priority must be between {} and {}, got {}",
                ReplicationRule::MIN_PRIORITY,
                ReplicationRule::MAX_PRIORITY,
                self.default_priority
            )));
        }
        Ok(())
    }
}
