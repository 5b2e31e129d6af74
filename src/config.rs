//! Configuration management
//!
//! The broker client is configured through a flat mapping of string
//! keys to string values. [`WatchConfig`] holds the handful of values
//! the dashboard cares about (bootstrap servers, consumer group, topic,
//! offset-reset policy) plus a passthrough map for any further client
//! properties, and renders the whole thing into a `ClientConfig`.
//!
//! Values are resolved command line first, then an optional YAML config
//! file, then defaults. The consumer group id defaults to a fresh
//! `kafkawatch-{uuid}` so an unconfigured instance never joins (and
//! rebalances) an existing group by accident.

use anyhow::{Context, Result};
use rdkafka::config::{ClientConfig, RDKafkaLogLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::error::WatchError;

/// Kafka session timeout (milliseconds)
const SESSION_TIMEOUT_MS: &str = "6000";

/// Default bootstrap address when neither CLI nor config file names one
const DEFAULT_BROKERS: &str = "localhost:9092";

/// Default offset-reset policy for a fresh consumer group
const DEFAULT_OFFSET_RESET: &str = "latest";

/// Optional on-disk configuration, all fields overridable from the CLI.
///
/// Loaded from a YAML file; absent fields fall back to CLI values or
/// defaults during [`WatchConfig::resolve`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Bootstrap broker address (e.g., "localhost:9092")
    #[serde(default)]
    pub brokers: Option<String>,
    /// Consumer group identifier
    #[serde(default)]
    pub group_id: Option<String>,
    /// Topic to consume
    #[serde(default)]
    pub topic: Option<String>,
    /// Offset-reset policy ("earliest" or "latest")
    #[serde(default)]
    pub offset_reset: Option<String>,
    /// Additional librdkafka properties passed through verbatim
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl FileConfig {
    /// Loads configuration from `path`.
    ///
    /// Returns an empty config if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(FileConfig::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: FileConfig =
            serde_yaml::from_str(&contents).with_context(|| "Failed to parse config file")?;

        Ok(config)
    }
}

/// Fully resolved dashboard configuration.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Bootstrap broker address
    pub brokers: String,
    /// Consumer group identifier
    pub group_id: String,
    /// Topic to consume
    pub topic: String,
    /// Offset-reset policy
    pub offset_reset: String,
    /// Additional librdkafka properties
    pub properties: HashMap<String, String>,
}

impl WatchConfig {
    /// Merges CLI values over file values over defaults.
    ///
    /// The topic is the one value with no default; everything else can
    /// be derived.
    ///
    /// # Errors
    /// `Configuration` if no topic was supplied anywhere or a supplied
    /// value is empty.
    pub fn resolve(
        file: FileConfig,
        brokers: Option<String>,
        group_id: Option<String>,
        topic: Option<String>,
    ) -> Result<Self, WatchError> {
        let topic = topic
            .or(file.topic)
            .ok_or_else(|| WatchError::Configuration("no topic specified".to_string()))?;
        if topic.is_empty() {
            return Err(WatchError::Configuration("topic is empty".to_string()));
        }

        let brokers = brokers
            .or(file.brokers)
            .unwrap_or_else(|| DEFAULT_BROKERS.to_string());
        if brokers.is_empty() {
            return Err(WatchError::Configuration(
                "broker address is empty".to_string(),
            ));
        }

        let group_id = group_id
            .or(file.group_id)
            .unwrap_or_else(|| format!("kafkawatch-{}", Uuid::new_v4()));

        let offset_reset = file
            .offset_reset
            .unwrap_or_else(|| DEFAULT_OFFSET_RESET.to_string());

        Ok(WatchConfig {
            brokers,
            group_id,
            topic,
            offset_reset,
            properties: file.properties,
        })
    }

    /// Renders the flat key/value client configuration.
    ///
    /// Auto-commit is disabled: the dashboard is a read-only observer
    /// and must not move the group's committed offsets.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", &self.group_id)
            .set("enable.partition.eof", "false")
            .set("session.timeout.ms", SESSION_TIMEOUT_MS)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", &self.offset_reset)
            .set_log_level(RDKafkaLogLevel::Error);

        for (key, value) in &self.properties {
            config.set(key, value);
        }

        config
    }
}
