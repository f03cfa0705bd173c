// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InfluxDB Line Protocol client.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! [`LineProtocolClient`] encodes points and writes one line per point to any
//! `io::Write` (stdout, a file, a pipe to Telegraf). It does not speak HTTP.
//!
//! See: <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use crate::client::InfluxClient;
use crate::convert::Point;
use crate::error::ClientError;
use crate::value::Scalar;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Format a value as a Line Protocol field value.
///
/// - Float: written as-is (e.g., `3.14`)
/// - Integer: suffixed with `i` (e.g., `42i`)
/// - String: quoted with double quotes, inner quotes escaped (e.g., `"hello"`)
/// - Boolean: `true` or `false`
pub fn field_value(value: &Scalar) -> String {
    match value {
        Scalar::Float(v) => format!("{}", v),
        Scalar::Integer(v) => format!("{}i", v),
        Scalar::String(v) => {
            let escaped = v
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n");
            format!("\"{}\"", escaped)
        }
        Scalar::Boolean(v) => v.to_string(),
    }
}

/// Encode a point as a single Line Protocol line (without newline).
///
/// Tags are sorted by key. Tags with an empty value are dropped since Line
/// Protocol cannot represent them. A point without fields is rejected.
pub fn encode_point(point: &Point) -> Result<String, ClientError> {
    if point.fields.is_empty() {
        return Err(ClientError::Rejected(format!(
            "point for measurement '{}' has no fields",
            point.measurement
        )));
    }

    let mut line = escape_measurement(&point.measurement);

    for (key, value) in &point.tags {
        let value = value.to_string();
        if value.is_empty() {
            continue;
        }
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(&value));
    }

    line.push(' ');

    for (i, (key, value)) in point.fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&field_value(value));
    }

    line.push(' ');
    line.push_str(&point.timestamp_ns.to_string());

    Ok(line)
}

/// Escape a measurement name for Line Protocol.
/// Spaces and commas must be escaped with backslash.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,")
        .replace(' ', "\\ ")
        .replace('\n', "\\n")
}

/// Escape tag keys, tag values and field keys.
/// Commas, equals signs, and spaces must be escaped.
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
        .replace('\n', "\\n")
}

/// Storage client writing Line Protocol to an `io::Write`.
///
/// The retention policy is not part of Line Protocol and is ignored.
/// Databases only exist in memory.
pub struct LineProtocolClient<W: Write + Send> {
    writer: Mutex<W>,
    databases: Mutex<Vec<String>>,
}

impl<W: Write + Send> LineProtocolClient<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            databases: Mutex::new(Vec::new()),
        }
    }

    /// Consume the client and return the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl LineProtocolClient<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl LineProtocolClient<BufWriter<File>> {
    /// Append to `path`, creating it and its parent directories if needed.
    pub fn to_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> InfluxClient for LineProtocolClient<W> {
    fn write_points(
        &self,
        points: &[Point],
        _retention_policy: Option<&str>,
    ) -> Result<(), ClientError> {
        let lines = points
            .iter()
            .map(encode_point)
            .collect::<Result<Vec<_>, _>>()?;

        let mut writer = self.writer.lock();
        for line in &lines {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    fn list_databases(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.databases.lock().clone())
    }

    fn create_database(&self, name: &str) -> Result<(), ClientError> {
        let mut databases = self.databases.lock();
        if !databases.iter().any(|d| d == name) {
            databases.push(name.to_string());
        }
        Ok(())
    }
}
