// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for handlers, configuration and storage clients.

use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by an [`InfluxClient`](crate::InfluxClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying transport failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The backend refused the request.
    #[error("write rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Handler errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Delivery to the storage backend failed.
    #[error("storage client error: {0}")]
    Client(#[from] ClientError),

    /// The handler configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The background flush thread could not be started.
    #[error("failed to spawn flush thread: {0}")]
    Spawn(#[source] io::Error),
}
