// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InfluxDB Log Handler
//!
//! Turns structured log records into InfluxDB points.
//!
//! This crate provides:
//! - Tag/field classification of record attributes
//! - Hierarchical measurement names derived from the logger name
//! - An immediate handler (one write per record)
//! - A buffered handler flushing at capacity, on a timer and at close
//! - A `tracing` layer feeding either handler
//! - InfluxDB Line Protocol encoding for file or stdout sinks
//!
//! # Overview
//!
//! Network transport is pluggable through [`InfluxClient`]; the crate ships
//! an in-memory client and a Line Protocol writer.
//!
//! ```text
//! LogRecord --> flatten --> MeasurementResolver --> Vec<Point> --> InfluxClient
//!                              (a, a:b, a:b:c)
//! ```
//!
//! A logger named `app.db.pool` produces one point in each of `app`,
//! `app:db` and `app:db:pool`, all with the same tags, fields and timestamp.

pub mod buffered;
pub mod classify;
pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod handler;
pub mod layer;
pub mod line_protocol;
pub mod measurement;
pub mod record;
pub mod value;

pub use buffered::{BufferedInfluxHandler, StatsSnapshot};
pub use classify::ClassificationTable;
pub use client::{InfluxClient, MemoryClient, WriteCall};
pub use config::HandlerConfig;
pub use convert::{flatten, Point, PointConverter};
pub use error::{ClientError, ConfigError, Error, Result};
pub use handler::{Emit, InfluxHandler};
pub use layer::InfluxLayer;
pub use line_protocol::LineProtocolClient;
pub use measurement::{resolve_measurements, MeasurementResolver};
pub use record::{LogLevel, LogRecord};
pub use value::{ExceptionInfo, Scalar, Value};
