// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Bucketlink Authors

//! Replication setup between a source and a destination bucket.
//!
//! Setting up replication touches both sides:
//!
//! ```text
//!  source bucket                              destination bucket
//! ┌─────────────────────────────┐            ┌──────────────────────────────┐
//! │ asReplicationSource         │            │ asReplicationDestination     │
//! │   sourceApplicationKeyId ───┼──── K ────►│   sourceToDestinationKeyMap  │
//! │   replicationRules          │            │     K ──► D (write key)      │
//! │     + new rule ─────────────┼─ bucketId ►│                              │
//! └─────────────────────────────┘            └──────────────────────────────┘
//! ```
//!
//! Keys are reused when they are still fit for the job and created otherwise.
//! Each side is written with a single conditional update; a concurrent change
//! makes that update fail and the caller has to start again from a fresh read.
//! There is no rollback: if the destination step fails, the source rule stays.

use std::collections::HashSet;

use bucketlink_core::{
    ApplicationKey, Capability, Error, ReplicationConfiguration,
    ReplicationDestinationConfiguration, ReplicationRule, ReplicationSourceConfiguration, Result,
    SetupConfig,
};
use metrics::counter;
use tracing::{debug, info, warn};

use crate::api::Api;
use crate::bucket::Bucket;

/// Capabilities a key needs to act as a replication source.
pub const DEFAULT_SOURCE_CAPABILITIES: [Capability; 3] =
    [Capability::ReadFiles, Capability::ReadFileLegalHolds, Capability::ReadFileRetentions];

/// Capabilities a key needs to act as a replication destination.
pub const DEFAULT_DESTINATION_CAPABILITIES: [Capability; 4] = [
    Capability::WriteFiles,
    Capability::WriteFileLegalHolds,
    Capability::WriteFileRetentions,
    Capability::DeleteFiles,
];

/// Options for the rule created by [`ReplicationSetupHelper::setup_source`].
///
/// Everything left unset is derived from the existing rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewRule {
    /// Rule name. Used verbatim when set.
    pub name: Option<String>,
    /// Rule priority. Used verbatim when set.
    pub priority: Option<u32>,
    /// File name prefix to replicate. Defaults to everything.
    pub prefix: Option<String>,
    /// Whether files that already exist are replicated too.
    pub include_existing_files: bool,
}

impl NewRule {
    /// Creates options with everything derived.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rule name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the rule priority.
    pub fn priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Restricts the rule to files under `prefix`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets whether existing files are replicated.
    pub fn include_existing_files(mut self, include: bool) -> Self {
        self.include_existing_files = include;
        self
    }
}

/// Creates or reuses replication keys and writes replication rules.
#[derive(Debug, Clone, Default)]
pub struct ReplicationSetupHelper {
    config: SetupConfig,
}

impl ReplicationSetupHelper {
    /// Creates a helper with the given settings.
    pub fn new(config: SetupConfig) -> Self {
        Self { config }
    }

    /// Returns the helper's settings.
    pub fn config(&self) -> &SetupConfig {
        &self.config
    }

    /// Sets up both sides of a replication: the rule on the source bucket and
    /// the key mapping on the destination bucket.
    ///
    /// Returns the updated source and destination buckets.
    ///
    /// # Errors
    ///
    /// Returns the first error from either side. The source side is not rolled
    /// back if the destination side fails.
    pub async fn setup_both(
        &self,
        source_bucket: &Bucket,
        destination_bucket: &Bucket,
        rule: NewRule,
    ) -> Result<(Bucket, Bucket)> {
        let new_source_bucket = self.setup_source(source_bucket, destination_bucket, rule).await?;

        let source_key_id = new_source_bucket
            .replication()
            .and_then(ReplicationConfiguration::source_key_id)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Internal(format!(
                    "bucket {} has no source key after replication setup",
                    new_source_bucket.name()
                ))
            })?;

        let new_destination_bucket =
            self.setup_destination(&source_key_id, destination_bucket).await?;

        Ok((new_source_bucket, new_destination_bucket))
    }

    /// Adds a rule replicating `source_bucket` into `destination_bucket`.
    ///
    /// Existing rules and the bucket's destination settings are kept. The
    /// source key is reused if it still qualifies and replaced otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the new rule is invalid or a backend call fails,
    /// including the conflict raised when `source_bucket` changed since it was
    /// read.
    pub async fn setup_source(
        &self,
        source_bucket: &Bucket,
        destination_bucket: &Bucket,
        rule: NewRule,
    ) -> Result<Bucket> {
        let prefix = rule.prefix.unwrap_or_default();

        let current = source_bucket.replication();
        let current_source_rules =
            current.map(ReplicationConfiguration::source_rules).unwrap_or_default();
        let destination_configuration =
            current.and_then(|r| r.as_replication_destination.clone());

        let source_key = self.get_source_key(source_bucket, &prefix, current).await?;
        let priority = self.get_priority_for_new_rule(current_source_rules, rule.priority);
        let name =
            Self::get_new_rule_name(current_source_rules, destination_bucket.name(), rule.name);

        let new_rule = ReplicationRule::new(name, destination_bucket.id())
            .with_priority(priority)
            .with_prefix(prefix)
            .with_include_existing_files(rule.include_existing_files);
        new_rule.validate()?;

        info!(
            source = %source_bucket.name(),
            destination = %destination_bucket.name(),
            rule = %new_rule.name,
            priority = new_rule.priority,
            prefix = %new_rule.file_name_prefix,
            "Adding replication rule"
        );

        let mut rules = current_source_rules.to_vec();
        rules.push(new_rule);
        let new_replication_configuration = ReplicationConfiguration::new(
            Some(ReplicationSourceConfiguration {
                source_application_key_id: Some(source_key.id),
                rules,
            }),
            destination_configuration,
        );

        let updated =
            source_bucket.update(source_bucket.revision(), new_replication_configuration).await?;
        counter!("replication_rules_created_total").increment(1);
        Ok(updated)
    }

    /// Lets the holder of `source_key_id` replicate into `destination_bucket`.
    ///
    /// A destination key is reused or created and mapped from `source_key_id`,
    /// overwriting any previous mapping for it. The bucket's source settings
    /// are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if a backend call fails, including the conflict raised
    /// when `destination_bucket` changed since it was read.
    pub async fn setup_destination(
        &self,
        source_key_id: &str,
        destination_bucket: &Bucket,
    ) -> Result<Bucket> {
        let current = destination_bucket.replication();
        let source_configuration = current.and_then(|r| r.as_replication_source.clone());
        let mut destination_configuration =
            current.and_then(|r| r.as_replication_destination.clone()).unwrap_or_default();

        let (keys_to_purge, destination_key) = self
            .get_destination_key(
                destination_bucket.api().as_ref(),
                destination_bucket,
                &destination_configuration,
            )
            .await?;
        // Zombie ids are reported only; the mapping keeps them.
        if !keys_to_purge.is_empty() {
            warn!(
                bucket = %destination_bucket.name(),
                zombie_keys = ?keys_to_purge,
                "Destination key mapping references deleted keys"
            );
        }

        info!(
            bucket = %destination_bucket.name(),
            source_key_id,
            destination_key_id = %destination_key.id,
            "Mapping source key to destination key"
        );
        destination_configuration
            .source_to_destination_key_mapping
            .insert(source_key_id.to_string(), destination_key.id);

        let new_replication_configuration =
            ReplicationConfiguration::new(source_configuration, Some(destination_configuration));
        destination_bucket
            .update(destination_bucket.revision(), new_replication_configuration)
            .await
    }

    /// Finds a usable destination key among those already mapped, or creates one.
    ///
    /// Returns the mapped key ids that no longer resolve along with the key.
    /// Every mapped key is inspected; when several qualify, the last one in
    /// mapping order wins.
    async fn get_destination_key(
        &self,
        api: &dyn Api,
        destination_bucket: &Bucket,
        destination_configuration: &ReplicationDestinationConfiguration,
    ) -> Result<(Vec<String>, ApplicationKey)> {
        let mut keys_to_purge = Vec::new();
        let mut key = None;

        for key_id in destination_configuration.destination_key_ids() {
            match api.get_key(key_id).await? {
                None => {
                    debug!(key_id, "Zombie key found in destination key mapping");
                    counter!("replication_zombie_keys_total").increment(1);
                    keys_to_purge.push(key_id.to_string());
                }
                Some(candidate)
                    if candidate.has_capabilities(&DEFAULT_DESTINATION_CAPABILITIES)
                        && !candidate.is_prefix_restricted() =>
                {
                    debug!(key_id, "Matching destination key found");
                    key = Some(candidate);
                }
                Some(candidate) => {
                    info!(
                        key_id,
                        name_prefix = ?candidate.name_prefix,
                        capabilities = ?candidate.capabilities,
                        "Non-matching destination key found"
                    );
                }
            }
        }

        let key = match key {
            Some(key) => key,
            None => {
                debug!(
                    bucket = %destination_bucket.name(),
                    "No matching key found, making a new one"
                );
                self.create_destination_key(destination_bucket).await?
            }
        };
        Ok((keys_to_purge, key))
    }

    /// Returns the current source key if it still qualifies, or a new one.
    async fn get_source_key(
        &self,
        source_bucket: &Bucket,
        prefix: &str,
        current: Option<&ReplicationConfiguration>,
    ) -> Result<ApplicationKey> {
        let current_source_key = match current.and_then(ReplicationConfiguration::source_key_id) {
            Some(key_id) => source_bucket.api().get_key(key_id).await?,
            None => None,
        };

        let do_create_key = Self::should_make_new_source_key(current, current_source_key.as_ref());
        match current_source_key {
            Some(key) if !do_create_key => {
                debug!(key_id = %key.id, "Reusing current source key");
                Ok(key)
            }
            _ => self.create_source_key(source_bucket, prefix).await,
        }
    }

    fn should_make_new_source_key(
        current: Option<&ReplicationConfiguration>,
        current_source_key: Option<&ApplicationKey>,
    ) -> bool {
        let Some(key_id) = current.and_then(ReplicationConfiguration::source_key_id) else {
            debug!("Will create a new source key because no key is set");
            return true;
        };

        let Some(key) = current_source_key else {
            debug!(key_id, "Will create a new source key because the current key was deleted");
            return true;
        };

        if key.is_prefix_restricted() {
            debug!(
                key_id,
                name_prefix = ?key.name_prefix,
                "Will create a new source key because the current key has a prefix"
            );
            return true;
        }

        if !key.has_capabilities(&DEFAULT_SOURCE_CAPABILITIES) {
            debug!(
                key_id,
                capabilities = ?key.capabilities,
                "Will create a new source key because the current key lacks replication capabilities"
            );
            return true;
        }

        false
    }

    /// Creates an unrestricted source key.
    ///
    /// `prefix` only narrows the rule. A prefix on the key would force every
    /// destination sharing it onto a new key once a wider rule is needed.
    async fn create_source_key(&self, bucket: &Bucket, prefix: &str) -> Result<ApplicationKey> {
        if !prefix.is_empty() {
            debug!(prefix, "Source key is created without a prefix; the rule carries it");
        }
        let name = self.config.source_key_name(bucket.name());
        let key = bucket
            .api()
            .create_key(&DEFAULT_SOURCE_CAPABILITIES, &name, Some(bucket.id()), None)
            .await?;
        info!(key_id = %key.id, key_name = %name, "Created replication source key");
        counter!("replication_keys_created_total", "role" => "source").increment(1);
        Ok(key)
    }

    async fn create_destination_key(&self, bucket: &Bucket) -> Result<ApplicationKey> {
        let name = self.config.destination_key_name(bucket.name());
        let key = bucket
            .api()
            .create_key(&DEFAULT_DESTINATION_CAPABILITIES, &name, Some(bucket.id()), None)
            .await?;
        info!(key_id = %key.id, key_name = %name, "Created replication destination key");
        counter!("replication_keys_created_total", "role" => "destination").increment(1);
        Ok(key)
    }

    /// Priority for a new rule: the explicit one, else above the current maximum.
    ///
    /// Existing rules are never shifted; at the top of the range the result is
    /// clamped to [`ReplicationRule::MAX_PRIORITY`].
    fn get_priority_for_new_rule(
        &self,
        current_rules: &[ReplicationRule],
        priority: Option<u32>,
    ) -> u32 {
        if let Some(priority) = priority {
            return priority;
        }
        match current_rules.iter().map(|r| r.priority).max() {
            Some(existing) => existing
                .saturating_add(self.config.priority_offset)
                .min(ReplicationRule::MAX_PRIORITY),
            None => self.config.default_priority,
        }
    }

    /// Name for a new rule: the explicit one, else the first free
    /// `<destination><suffix>` candidate.
    fn get_new_rule_name(
        current_rules: &[ReplicationRule],
        destination_bucket_name: &str,
        name: Option<String>,
    ) -> String {
        if let Some(name) = name {
            return name;
        }
        let existing_names: HashSet<&str> = current_rules.iter().map(|r| r.name.as_str()).collect();
        // The candidate sequence is unbounded, so `find` always succeeds.
        rule_name_candidate_suffixes()
            .map(|suffix| format!("{destination_bucket_name}{suffix}"))
            .find(|candidate| !existing_names.contains(candidate.as_str()))
            .unwrap_or_default()
    }
}

/// `""`, `"2"`, `"3"`, ...
fn rule_name_candidate_suffixes() -> impl Iterator<Item = String> {
    std::iter::once(String::new()).chain((2u64..).map(|n| n.to_string()))
}
