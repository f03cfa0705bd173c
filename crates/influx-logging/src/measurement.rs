// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Measurement names derived from hierarchical logger names.
//!
//! With backpop enabled a record logged by `a.b.c` is written to `a`, `a:b`
//! and `a:b:c`, so each ancestor level can be queried on its own.

/// Measurement used when the logger name is empty.
pub const ROOT_MEASUREMENT: &str = "root";

/// Resolve the measurements a record is written to.
///
/// Always returns at least one name. Duplicates are kept.
pub fn resolve_measurements(name: &str, override_name: Option<&str>, backpop: bool) -> Vec<String> {
    if let Some(measurement) = override_name {
        return vec![measurement.to_string()];
    }

    if !backpop {
        let flat = name.replace('.', ":");
        return vec![if flat.is_empty() {
            ROOT_MEASUREMENT.to_string()
        } else {
            flat
        }];
    }

    let mut segments = name.split('.');
    let mut current = match segments.next() {
        Some(first) if !first.is_empty() => first.to_string(),
        _ => ROOT_MEASUREMENT.to_string(),
    };

    let mut names = vec![current.clone()];
    for segment in segments {
        current.push(':');
        current.push_str(segment);
        names.push(current.clone());
    }
    names
}

/// Measurement settings of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementResolver {
    override_name: Option<String>,
    backpop: bool,
}

impl MeasurementResolver {
    pub fn new(override_name: Option<String>, backpop: bool) -> Self {
        Self {
            override_name,
            backpop,
        }
    }

    pub fn resolve(&self, name: &str) -> Vec<String> {
        resolve_measurements(name, self.override_name.as_deref(), self.backpop)
    }
}

impl Default for MeasurementResolver {
    fn default() -> Self {
        Self::new(None, true)
    }
}
