// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structured log records handed to a handler.

use crate::value::{ExceptionInfo, Value};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Attribute holding the hierarchical logger name.
pub const ATTR_LOGGER: &str = "logger";
/// Attribute holding the rendered message.
pub const ATTR_MESSAGE: &str = "message";
/// Attribute holding the level name.
pub const ATTR_LEVEL: &str = "level";
/// Attribute holding the numeric level.
pub const ATTR_LEVEL_NO: &str = "level_no";
/// Attribute holding the creation time in seconds.
pub const ATTR_CREATED: &str = "created";
/// Attribute holding the exception descriptor.
pub const ATTR_EXCEPTION: &str = "exception";

/// Prefix of private attributes that are never converted.
pub const PRIVATE_PREFIX: char = '_';

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum LogLevel {
    /// Debug messages for development.
    Debug = 10,
    /// Informational messages.
    #[default]
    Info = 20,
    /// Warning messages.
    Warning = 30,
    /// Error messages.
    Error = 40,
    /// Critical errors.
    Critical = 50,
}

impl LogLevel {
    /// Get level name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Numeric level code.
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Parse level from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" | "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARN" | "WARNING" => Some(Self::Warning),
            "ERROR" | "ERR" => Some(Self::Error),
            "CRITICAL" | "FATAL" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured log event.
///
/// The record keeps an ordered list of named attributes. The constructor
/// fills in the logger name, message, level and creation time; builder
/// methods add source location, thread, process, exception and caller
/// attributes. Setting an attribute that already exists replaces its value in
/// place, so the attribute order stays stable.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    name: String,
    created: f64,
    message: String,
    level: LogLevel,
    attributes: Vec<(String, Value)>,
}

impl LogRecord {
    /// Create a record stamped with the current time.
    pub fn new(name: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let created = Utc::now().timestamp_micros() as f64 / 1_000_000.0;

        let attributes = vec![
            (ATTR_LOGGER.to_string(), Value::from(name.as_str())),
            (ATTR_MESSAGE.to_string(), Value::from(message.as_str())),
            (ATTR_LEVEL.to_string(), Value::from(level.as_str())),
            (ATTR_LEVEL_NO.to_string(), Value::from(level.code())),
            (ATTR_CREATED.to_string(), Value::from(created)),
        ];

        Self {
            name,
            created,
            message,
            level,
            attributes,
        }
    }

    /// Dotted hierarchical logger name (e.g. `"app.db.pool"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation time in fractional seconds since the Unix epoch.
    pub fn created(&self) -> f64 {
        self.created
    }

    /// Creation time as a UTC timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        let secs = self.created.floor();
        let nanos = ((self.created - secs) * 1_000_000_000.0) as u32;
        Utc.timestamp_opt(secs as i64, nanos.min(999_999_999))
            .single()
            .unwrap_or_default()
    }

    /// Rendered message.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// All attributes in walk order.
    pub fn attributes(&self) -> &[(String, Value)] {
        &self.attributes
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Override the creation time (fractional seconds).
    pub fn with_created(mut self, created: f64) -> Self {
        self.created = created;
        self.set_attribute(ATTR_CREATED, created);
        self
    }

    /// Override the creation time from a UTC timestamp.
    pub fn with_created_at(self, at: DateTime<Utc>) -> Self {
        let created = at.timestamp() as f64 + at.timestamp_subsec_nanos() as f64 / 1e9;
        self.with_created(created)
    }

    /// Set source location.
    pub fn with_location(
        mut self,
        file: impl Into<String>,
        line: u32,
        function: impl Into<String>,
    ) -> Self {
        self.set_attribute("file", file.into());
        self.set_attribute("function", function.into());
        self.set_attribute("line", line);
        self
    }

    /// Set source file and line only.
    pub fn with_source(mut self, file: impl Into<String>, line: u32) -> Self {
        self.set_attribute("file", file.into());
        self.set_attribute("line", line);
        self
    }

    /// Set the module path.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.set_attribute("module", module.into());
        self
    }

    /// Set producing thread.
    pub fn with_thread(mut self, id: u64, name: impl Into<String>) -> Self {
        self.set_attribute("thread_id", id);
        self.set_attribute("thread_name", name.into());
        self
    }

    /// Set producing process.
    pub fn with_process(mut self, id: u32, name: impl Into<String>) -> Self {
        self.set_attribute("process_id", id);
        self.set_attribute("process_name", name.into());
        self
    }

    /// Attach an exception descriptor.
    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.set_attribute(ATTR_EXCEPTION, exception);
        self
    }

    /// Add or replace a caller attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Add or replace an attribute in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }
}
