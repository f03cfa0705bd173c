// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Storage client seam.
//!
//! Handlers never talk to InfluxDB directly. They hand converted points to an
//! [`InfluxClient`], which owns connections, encoding and transport.

use crate::convert::Point;
use crate::error::ClientError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Time-series storage client used by the handlers.
pub trait InfluxClient: Send + Sync {
    /// Write a batch of points in one request.
    fn write_points(&self, points: &[Point], retention_policy: Option<&str>)
        -> Result<(), ClientError>;

    /// Names of the existing databases.
    fn list_databases(&self) -> Result<Vec<String>, ClientError>;

    /// Create a database.
    fn create_database(&self, name: &str) -> Result<(), ClientError>;
}

impl<C: InfluxClient + ?Sized> InfluxClient for Arc<C> {
    fn write_points(
        &self,
        points: &[Point],
        retention_policy: Option<&str>,
    ) -> Result<(), ClientError> {
        (**self).write_points(points, retention_policy)
    }

    fn list_databases(&self) -> Result<Vec<String>, ClientError> {
        (**self).list_databases()
    }

    fn create_database(&self, name: &str) -> Result<(), ClientError> {
        (**self).create_database(name)
    }
}

impl<C: InfluxClient + ?Sized> InfluxClient for Box<C> {
    fn write_points(
        &self,
        points: &[Point],
        retention_policy: Option<&str>,
    ) -> Result<(), ClientError> {
        (**self).write_points(points, retention_policy)
    }

    fn list_databases(&self) -> Result<Vec<String>, ClientError> {
        (**self).list_databases()
    }

    fn create_database(&self, name: &str) -> Result<(), ClientError> {
        (**self).create_database(name)
    }
}

/// One recorded `write_points` call.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteCall {
    pub points: Vec<Point>,
    pub retention_policy: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    databases: Vec<String>,
    writes: Vec<WriteCall>,
}

/// Client that keeps everything in memory.
///
/// Writes are recorded even when the failure switch is on, so callers can see
/// what would have been sent.
#[derive(Debug, Default)]
pub struct MemoryClient {
    state: Mutex<MemoryState>,
    fail_writes: AtomicBool,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given databases already present.
    pub fn with_databases<I, S>(databases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        client.state.lock().databases = databases.into_iter().map(Into::into).collect();
        client
    }

    /// Make every subsequent write fail with [`ClientError::Rejected`].
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// All recorded write calls, oldest first.
    pub fn writes(&self) -> Vec<WriteCall> {
        self.state.lock().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    /// Every recorded point, in write order.
    pub fn points(&self) -> Vec<Point> {
        self.state
            .lock()
            .writes
            .iter()
            .flat_map(|w| w.points.iter().cloned())
            .collect()
    }

    pub fn databases(&self) -> Vec<String> {
        self.state.lock().databases.clone()
    }
}

impl InfluxClient for MemoryClient {
    fn write_points(
        &self,
        points: &[Point],
        retention_policy: Option<&str>,
    ) -> Result<(), ClientError> {
        self.state.lock().writes.push(WriteCall {
            points: points.to_vec(),
            retention_policy: retention_policy.map(str::to_string),
        });
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClientError::Rejected(format!(
                "memory client refused {} points",
                points.len()
            )));
        }
        Ok(())
    }

    fn list_databases(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.databases())
    }

    fn create_database(&self, name: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        if !state.databases.iter().any(|d| d == name) {
            state.databases.push(name.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn point(measurement: &str) -> Point {
        Point {
            measurement: measurement.to_string(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp_ns: 1,
        }
    }

    #[test]
    fn test_memory_client_records_writes() {
        let client = MemoryClient::new();
        client
            .write_points(&[point("a"), point("a:b")], Some("week"))
            .unwrap();

        let writes = client.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].points.len(), 2);
        assert_eq!(writes[0].retention_policy.as_deref(), Some("week"));
        assert_eq!(client.points()[1].measurement, "a:b");
    }

    #[test]
    fn test_memory_client_failure_switch() {
        let client = MemoryClient::new();
        client.fail_writes(true);

        let err = client.write_points(&[point("a")], None).unwrap_err();
        assert!(matches!(err, ClientError::Rejected(_)));
        assert_eq!(client.write_count(), 1);

        client.fail_writes(false);
        assert!(client.write_points(&[point("a")], None).is_ok());
    }

    #[test]
    fn test_create_database_is_idempotent() {
        let client = MemoryClient::with_databases(["_internal"]);
        client.create_database("logs").unwrap();
        client.create_database("logs").unwrap();

        assert_eq!(client.list_databases().unwrap(), vec!["_internal", "logs"]);
    }

    #[test]
    fn test_shared_client_through_arc() {
        let client = Arc::new(MemoryClient::new());
        let shared: Box<dyn InfluxClient> = Box::new(client.clone());
        shared.write_points(&[point("x")], None).unwrap();

        assert_eq!(client.write_count(), 1);
    }
}
