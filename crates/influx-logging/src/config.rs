// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Handler configuration, loadable from YAML.

use crate::classify::ClassificationTable;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default number of records buffered before a flush.
pub const DEFAULT_CAPACITY: usize = 64;

/// Default interval between background flushes (milliseconds).
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5000;

/// Configuration of an immediate or buffered handler.
///
/// Fixed for the lifetime of the handler that is built from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Target database.
    pub database: String,
    /// Write every record to this measurement instead of deriving names
    /// from the logger.
    #[serde(default)]
    pub measurement: Option<String>,
    /// Retention policy passed along with every write.
    #[serde(default)]
    pub retention_policy: Option<String>,
    /// Write one point per ancestor level of the logger name.
    #[serde(default = "default_backpop")]
    pub backpop: bool,
    /// Skip the database existence check at construction.
    #[serde(default)]
    pub lazy_init: bool,
    /// Host name added to every point as the `host` tag.
    #[serde(default)]
    pub localname: Option<String>,
    /// Tag/field classification rules.
    #[serde(default)]
    pub classification: ClassificationTable,
    /// Records buffered before a flush (buffered handler only).
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Background flush interval in milliseconds; `null` disables the timer
    /// (buffered handler only).
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: Option<u64>,
}

fn default_backpop() -> bool {
    true
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_flush_interval_ms() -> Option<u64> {
    Some(DEFAULT_FLUSH_INTERVAL_MS)
}

impl HandlerConfig {
    /// Default configuration for `database`.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            measurement: None,
            retention_policy: None,
            backpop: true,
            lazy_init: false,
            localname: None,
            classification: ClassificationTable::default(),
            capacity: DEFAULT_CAPACITY,
            flush_interval_ms: Some(DEFAULT_FLUSH_INTERVAL_MS),
        }
    }

    /// Create a new builder.
    pub fn builder(database: impl Into<String>) -> HandlerConfigBuilder {
        HandlerConfigBuilder {
            config: Self::new(database),
        }
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: HandlerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Reject values no handler can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::Invalid("capacity must be at least 1".into()));
        }
        if self.flush_interval_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "flush_interval_ms must be positive or null".into(),
            ));
        }
        Ok(())
    }

    /// Background flush interval, `None` when disabled.
    pub fn flush_interval(&self) -> Option<Duration> {
        self.flush_interval_ms.map(Duration::from_millis)
    }
}

/// Builder for [`HandlerConfig`].
#[derive(Debug, Clone)]
pub struct HandlerConfigBuilder {
    config: HandlerConfig,
}

impl HandlerConfigBuilder {
    /// Write every record to one measurement.
    pub fn measurement(mut self, name: impl Into<String>) -> Self {
        self.config.measurement = Some(name.into());
        self
    }

    pub fn retention_policy(mut self, policy: impl Into<String>) -> Self {
        self.config.retention_policy = Some(policy.into());
        self
    }

    pub fn backpop(mut self, enabled: bool) -> Self {
        self.config.backpop = enabled;
        self
    }

    pub fn lazy_init(mut self, enabled: bool) -> Self {
        self.config.lazy_init = enabled;
        self
    }

    pub fn localname(mut self, host: impl Into<String>) -> Self {
        self.config.localname = Some(host.into());
        self
    }

    pub fn classification(mut self, table: ClassificationTable) -> Self {
        self.config.classification = table;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the background flush interval.
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval_ms = Some(interval.as_millis() as u64);
        self
    }

    /// Only flush at capacity or on explicit calls.
    pub fn no_flush_interval(mut self) -> Self {
        self.config.flush_interval_ms = None;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> HandlerConfig {
        self.config
    }
}
