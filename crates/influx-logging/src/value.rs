// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Attribute values carried by a [`LogRecord`](crate::LogRecord).
//!
//! A record attribute is one of a closed set of shapes: a scalar, a sequence
//! of scalars, a nested ordered map, or an exception descriptor. The point
//! converter flattens these into InfluxDB tags and fields.

use serde::Serialize;
use std::fmt;

/// A tag or field value as stored in InfluxDB.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// UTF-8 string.
    String(String),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// Boolean value.
    Boolean(bool),
}

impl Scalar {
    /// Numbers and booleans are numeric; they default to fields.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Scalar::String(_))
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(s),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// Structured description of an error attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionInfo {
    /// Error type name (e.g. `std::io::Error`).
    pub type_name: String,
    /// Error message.
    pub message: String,
    /// Formatted trace text.
    pub stack_trace: String,
}

impl ExceptionInfo {
    pub fn new(
        type_name: impl Into<String>,
        message: impl Into<String>,
        stack_trace: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            stack_trace: stack_trace.into(),
        }
    }

    /// Build a descriptor from an error and its `source()` chain.
    ///
    /// The trace lists the error followed by each cause, one per line.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut trace = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            trace.push_str("\nCaused by: ");
            trace.push_str(&cause.to_string());
            source = cause.source();
        }
        Self {
            type_name: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            stack_trace: trace,
        }
    }
}

impl fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

/// Value of a record attribute.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value; never emitted.
    #[default]
    Null,
    /// A single scalar.
    Scalar(Scalar),
    /// Ordered sequence of scalars, emitted space-joined.
    Sequence(Vec<Scalar>),
    /// Nested mapping, flattened with dotted keys.
    Map(Vec<(String, Value)>),
    /// Exception descriptor.
    Exception(ExceptionInfo),
}

impl Value {
    /// Build a nested map from `(key, value)` pairs, keeping their order.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::String(s))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Boolean(b))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(Scalar::Float(v))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Scalar(Scalar::Float(v as f64))
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Scalar(Scalar::Integer(v as i64))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Scalar(Scalar::Integer(i64::try_from(v).unwrap_or(i64::MAX)))
    }
}

impl From<ExceptionInfo> for Value {
    fn from(e: ExceptionInfo) -> Self {
        Value::Exception(e)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Integer(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Integer(v as i64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Boolean(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().filter_map(json_to_scalar).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
            scalar => json_to_scalar(scalar).map_or(Value::Null, Value::Scalar),
        }
    }
}

/// Convert a JSON value to a scalar with type inference.
///
/// Nested arrays and objects inside a sequence are kept as their JSON text.
fn json_to_scalar(val: serde_json::Value) -> Option<Scalar> {
    match val {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(Scalar::Boolean(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Scalar::Integer(i))
            } else {
                n.as_f64().map(Scalar::Float)
            }
        }
        serde_json::Value::String(s) => Some(Scalar::String(s)),
        nested => Some(Scalar::String(nested.to_string())),
    }
}
