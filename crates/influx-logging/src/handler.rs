// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Immediate handler: every record becomes one write.

use crate::client::InfluxClient;
use crate::config::HandlerConfig;
use crate::convert::{Point, PointConverter};
use crate::error::Result;
use crate::measurement::MeasurementResolver;
use crate::record::LogRecord;
use std::sync::Arc;

/// Anything that accepts log records.
pub trait Emit: Send + Sync {
    /// Deliver or queue one record.
    fn emit(&self, record: LogRecord) -> Result<()>;
}

impl<E: Emit + ?Sized> Emit for Arc<E> {
    fn emit(&self, record: LogRecord) -> Result<()> {
        (**self).emit(record)
    }
}

/// Converts each record and writes its points right away.
///
/// All points of one record (one per resolved measurement) go out in a
/// single `write_points` call. Errors are returned to the caller; nothing is
/// retried.
pub struct InfluxHandler {
    converter: PointConverter,
    client: Arc<dyn InfluxClient>,
    database: String,
    retention_policy: Option<String>,
}

impl InfluxHandler {
    /// Create a handler.
    ///
    /// Unless `lazy_init` is set, the database is created when
    /// `list_databases` does not report it.
    pub fn new<C>(config: HandlerConfig, client: C) -> Result<Self>
    where
        C: InfluxClient + 'static,
    {
        config.validate()?;

        let resolver = MeasurementResolver::new(config.measurement, config.backpop);
        let mut converter = PointConverter::new(config.classification, resolver);
        if let Some(host) = config.localname {
            converter = converter.with_localname(host);
        }

        let handler = Self {
            converter,
            client: Arc::new(client),
            database: config.database,
            retention_policy: config.retention_policy,
        };

        if !config.lazy_init {
            handler.ensure_database()?;
        }

        Ok(handler)
    }

    /// Create the configured database if the backend does not have it.
    pub fn ensure_database(&self) -> Result<()> {
        let databases = self.client.list_databases()?;
        if !databases.iter().any(|name| *name == self.database) {
            tracing::debug!(database = %self.database, "creating database");
            self.client.create_database(&self.database)?;
        }
        Ok(())
    }

    /// Convert a record without writing it.
    pub fn points(&self, record: &LogRecord) -> Vec<Point> {
        self.converter.convert(record)
    }

    /// Write points with the configured retention policy.
    pub fn write(&self, points: &[Point]) -> Result<()> {
        self.client
            .write_points(points, self.retention_policy.as_deref())?;
        Ok(())
    }

    /// Convert and write one record.
    pub fn emit(&self, record: &LogRecord) -> Result<()> {
        let points = self.points(record);
        self.write(&points)
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn retention_policy(&self) -> Option<&str> {
        self.retention_policy.as_deref()
    }

    pub fn converter(&self) -> &PointConverter {
        &self.converter
    }
}

impl Emit for InfluxHandler {
    fn emit(&self, record: LogRecord) -> Result<()> {
        InfluxHandler::emit(self, &record)
    }
}
