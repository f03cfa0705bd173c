// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record to point conversion.
//!
//! Walks the attributes of a [`LogRecord`] in order, flattens nested maps into
//! dotted keys, joins scalar sequences, and classifies each leaf as a tag or a
//! field using a [`ClassificationTable`]. The resulting tag/field sets are
//! copied onto one [`Point`] per resolved measurement.
//!
//! ```text
//! LogRecord --> flatten (ClassificationTable) --> tags + fields
//!           --> MeasurementResolver           --> [Point; fan-out]
//! ```

use crate::classify::ClassificationTable;
use crate::measurement::MeasurementResolver;
use crate::record::{LogRecord, ATTR_EXCEPTION, PRIVATE_PREFIX};
use crate::value::{ExceptionInfo, Scalar, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// Tag holding the exception type.
pub const THROWN_TYPE: &str = "thrown.type";
/// Field holding the exception message.
pub const THROWN_MESSAGE: &str = "thrown.message";
/// Field holding the formatted trace.
pub const THROWN_STACK_TRACE: &str = "thrown.stackTrace";

/// Tag set and field set extracted from a record.
pub type TagsAndFields = (BTreeMap<String, Scalar>, BTreeMap<String, Scalar>);

/// One time-stamped measurement, the unit written to InfluxDB.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, Scalar>,
    pub fields: BTreeMap<String, Scalar>,
    /// Nanoseconds since the Unix epoch.
    pub timestamp_ns: i64,
}

/// Convert fractional epoch seconds to nanoseconds, truncating.
pub fn timestamp_ns(created: f64) -> i64 {
    (created * 1_000_000_000.0).trunc() as i64
}

/// Classify the attributes of `record` into tags and fields.
///
/// Never fails: attributes whose shape does not fit a rule fall through to
/// the next one.
pub fn flatten(record: &LogRecord, table: &ClassificationTable) -> TagsAndFields {
    let mut collector = Collector::new(table);
    collector.walk_record(record);
    (collector.tags, collector.fields)
}

/// Leaf reached by the attribute walk.
enum Leaf<'a> {
    Scalar(Scalar),
    Exception(&'a ExceptionInfo),
}

impl Leaf<'_> {
    fn into_scalar(self) -> Scalar {
        match self {
            Leaf::Scalar(s) => s,
            Leaf::Exception(e) => Scalar::String(e.to_string()),
        }
    }
}

struct Collector<'t> {
    table: &'t ClassificationTable,
    tags: BTreeMap<String, Scalar>,
    fields: BTreeMap<String, Scalar>,
}

impl<'t> Collector<'t> {
    fn new(table: &'t ClassificationTable) -> Self {
        Self {
            table,
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    fn walk_record(&mut self, record: &LogRecord) {
        for (name, value) in record.attributes() {
            if name.starts_with(PRIVATE_PREFIX) {
                continue;
            }
            self.walk(name, value);
        }
    }

    fn walk(&mut self, key: &str, value: &Value) {
        match value {
            Value::Null => {}
            Value::Map(entries) => {
                for (sub, sub_value) in entries {
                    if key.is_empty() {
                        self.walk(sub, sub_value);
                    } else {
                        self.walk(&format!("{}.{}", key, sub), sub_value);
                    }
                }
            }
            Value::Sequence(items) => {
                let joined = items
                    .iter()
                    .map(Scalar::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                self.classify(key, Leaf::Scalar(Scalar::String(joined)));
            }
            Value::Scalar(s) => self.classify(key, Leaf::Scalar(s.clone())),
            Value::Exception(e) => self.classify(key, Leaf::Exception(e)),
        }
    }

    fn classify(&mut self, key: &str, leaf: Leaf<'_>) {
        let table = self.table;

        if let Some(tag) = table.include_tags.get(key) {
            if !table.exclude_tags.contains(key) && !table.exclude_tags.contains(tag) {
                self.tag(tag.clone(), leaf.into_scalar());
            }
            return;
        }

        if let Some(field) = table.include_fields.get(key) {
            if !table.exclude_fields.contains(key) && !table.exclude_fields.contains(field) {
                self.field(field.clone(), leaf.into_scalar());
            }
            return;
        }

        if key == ATTR_EXCEPTION && table.include_stacktrace {
            if let Leaf::Exception(e) = &leaf {
                self.tag(THROWN_TYPE.to_string(), Scalar::String(e.type_name.clone()));
                self.field(THROWN_MESSAGE.to_string(), Scalar::String(e.message.clone()));
                self.field(
                    THROWN_STACK_TRACE.to_string(),
                    Scalar::String(e.stack_trace.clone()),
                );
                return;
            }
        }

        if table.skip_attributes.contains(key) {
            return;
        }

        let scalar = leaf.into_scalar();
        if scalar.is_numeric() {
            if table.extra_fields && !table.exclude_fields.contains(key) {
                self.field(key.to_string(), scalar);
            }
        } else if table.extra_tags && !table.exclude_tags.contains(key) {
            self.tag(key.to_string(), scalar);
        }
    }

    // A key lives in exactly one of the two sets; the latest write decides.
    fn tag(&mut self, key: String, value: Scalar) {
        self.fields.remove(&key);
        self.tags.insert(key, value);
    }

    fn field(&mut self, key: String, value: Scalar) {
        self.tags.remove(&key);
        self.fields.insert(key, value);
    }
}

/// Converts records into points for every resolved measurement.
#[derive(Debug, Clone)]
pub struct PointConverter {
    table: ClassificationTable,
    resolver: MeasurementResolver,
    localname: Option<String>,
}

impl PointConverter {
    pub fn new(table: ClassificationTable, resolver: MeasurementResolver) -> Self {
        Self {
            table,
            resolver,
            localname: None,
        }
    }

    /// Tag every point with `host=<localname>`.
    pub fn with_localname(mut self, localname: impl Into<String>) -> Self {
        self.localname = Some(localname.into());
        self
    }

    pub fn table(&self) -> &ClassificationTable {
        &self.table
    }

    /// Convert a record into one point per measurement.
    pub fn convert(&self, record: &LogRecord) -> Vec<Point> {
        let mut collector = Collector::new(&self.table);
        if let Some(host) = &self.localname {
            collector.tag("host".to_string(), Scalar::String(host.clone()));
        }
        collector.walk_record(record);

        let timestamp_ns = timestamp_ns(record.created());
        self.resolver
            .resolve(record.name())
            .into_iter()
            .map(|measurement| Point {
                measurement,
                tags: collector.tags.clone(),
                fields: collector.fields.clone(),
                timestamp_ns,
            })
            .collect()
    }
}

impl Default for PointConverter {
    fn default() -> Self {
        Self::new(ClassificationTable::default(), MeasurementResolver::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LogLevel;

    fn record() -> LogRecord {
        LogRecord::new("app.db.pool", LogLevel::Warning, "pool exhausted")
            .with_created(1_700_000_000.123456)
            .with_location("pool.rs", 88, "acquire")
            .with_thread(7, "worker-1")
    }

    fn s(v: &str) -> Scalar {
        Scalar::String(v.to_string())
    }

    #[test]
    fn test_default_partition() {
        let rec = record()
            .with_attribute("tenant", "acme")
            .with_attribute("waiters", 12)
            .with_attribute("degraded", true);

        let (tags, fields) = flatten(&rec, &ClassificationTable::default());

        let tag_keys: Vec<&str> = tags.keys().map(String::as_str).collect();
        assert_eq!(
            tag_keys,
            vec!["file", "function", "level", "line", "tenant", "thread", "thread_name"]
        );
        assert_eq!(tags["level"], s("WARNING"));
        assert_eq!(tags["line"], Scalar::Integer(88));
        assert_eq!(tags["thread"], Scalar::Integer(7));

        let field_keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(field_keys, vec!["degraded", "message", "waiters"]);
        assert_eq!(fields["message"], s("pool exhausted"));
        assert_eq!(fields["waiters"], Scalar::Integer(12));
    }

    #[test]
    fn test_extra_flags_filter_unclassified() {
        let rec = record()
            .with_attribute("tenant", "acme")
            .with_attribute("waiters", 12);

        let table = ClassificationTable::default()
            .extra_tags(false)
            .extra_fields(false);
        let (tags, fields) = flatten(&rec, &table);

        assert!(!tags.contains_key("tenant"));
        assert!(!fields.contains_key("waiters"));
        assert!(tags.contains_key("file"));
        assert!(fields.contains_key("message"));
    }

    #[test]
    fn test_exclusion_overrides_inclusion() {
        let table = ClassificationTable::default()
            .exclude_tag("line")
            .exclude_field("message");
        let (tags, fields) = flatten(&record(), &table);

        assert!(!tags.contains_key("line"));
        assert!(!fields.contains_key("line"));
        assert!(!fields.contains_key("message"));
        assert!(!tags.contains_key("message"));
    }

    #[test]
    fn test_exclusion_applies_to_extra_attributes() {
        let rec = record()
            .with_attribute("tenant", "acme")
            .with_attribute("waiters", 12);
        let table = ClassificationTable::default()
            .exclude_tag("tenant")
            .exclude_field("waiters");
        let (tags, fields) = flatten(&rec, &table);

        assert!(!tags.contains_key("tenant"));
        assert!(!fields.contains_key("waiters"));
    }

    #[test]
    fn test_tag_rule_checked_before_field_rule() {
        let table = ClassificationTable::default().tag("message", "msg");
        let (tags, fields) = flatten(&record(), &table);

        assert_eq!(tags["msg"], s("pool exhausted"));
        assert!(!fields.contains_key("message"));
    }

    #[test]
    fn test_nested_maps_flatten_with_dotted_keys() {
        let rec = record().with_attribute(
            "http",
            Value::map([
                ("method", Value::from("GET")),
                ("status", Value::from(503)),
                ("peer", Value::map([("port", 8086)])),
                ("skipped", Value::Null),
            ]),
        );
        let (tags, fields) = flatten(&rec, &ClassificationTable::default());

        assert_eq!(tags["http.method"], s("GET"));
        assert_eq!(fields["http.status"], Scalar::Integer(503));
        assert_eq!(fields["http.peer.port"], Scalar::Integer(8086));
        assert!(!tags.contains_key("http.skipped") && !fields.contains_key("http.skipped"));
    }

    #[test]
    fn test_nested_keys_are_classified_by_full_path() {
        let rec = record().with_attribute("http", Value::map([("status", 503)]));
        let table = ClassificationTable::default().tag("http.status", "status");
        let (tags, fields) = flatten(&rec, &table);

        assert_eq!(tags["status"], Scalar::Integer(503));
        assert!(!fields.contains_key("http.status"));
    }

    #[test]
    fn test_empty_attribute_name_uses_bare_sub_keys() {
        let rec = record().with_attribute("", Value::map([("zone", "eu-1")]));
        let (tags, _) = flatten(&rec, &ClassificationTable::default());
        assert_eq!(tags["zone"], s("eu-1"));
    }

    #[test]
    fn test_sequences_join_as_string_tag() {
        let rec = record()
            .with_attribute("roles", vec!["admin", "ops"])
            .with_attribute("ports", vec![80, 443]);
        let (tags, fields) = flatten(&rec, &ClassificationTable::default());

        assert_eq!(tags["roles"], s("admin ops"));
        assert_eq!(tags["ports"], s("80 443"));
        assert!(!fields.contains_key("ports"));
    }

    #[test]
    fn test_private_attributes_never_walked() {
        let rec = record()
            .with_attribute("_internal", "secret")
            .with_attribute("_count", 5);
        let (tags, fields) = flatten(&rec, &ClassificationTable::default());

        assert!(!tags.contains_key("_internal"));
        assert!(!fields.contains_key("_count"));
    }

    #[test]
    fn test_stacktrace_expansion() {
        let rec = record().with_exception(ExceptionInfo::new(
            "io::Error",
            "connection reset",
            "at pool.rs:88\nat main.rs:10",
        ));
        let (tags, fields) = flatten(&rec, &ClassificationTable::default());

        assert_eq!(tags[THROWN_TYPE], s("io::Error"));
        assert_eq!(fields[THROWN_MESSAGE], s("connection reset"));
        assert_eq!(fields[THROWN_STACK_TRACE], s("at pool.rs:88\nat main.rs:10"));
        assert!(!tags.contains_key("exception"));
    }

    #[test]
    fn test_stacktrace_ignores_exclude_sets() {
        let rec = record().with_exception(ExceptionInfo::new("E", "m", "t"));
        let table = ClassificationTable::default()
            .exclude_tag(THROWN_TYPE)
            .exclude_field(THROWN_MESSAGE)
            .extra_tags(false)
            .extra_fields(false);
        let (tags, fields) = flatten(&rec, &table);

        assert!(tags.contains_key(THROWN_TYPE));
        assert!(fields.contains_key(THROWN_MESSAGE));
    }

    #[test]
    fn test_stacktrace_disabled_falls_to_skip_rule() {
        let rec = record().with_exception(ExceptionInfo::new("E", "m", "t"));
        let table = ClassificationTable::default().include_stacktrace(false);
        let (tags, fields) = flatten(&rec, &table);

        assert!(!tags.contains_key(THROWN_TYPE));
        assert!(!fields.contains_key(THROWN_STACK_TRACE));
        assert!(!tags.contains_key("exception"));
    }

    #[test]
    fn test_malformed_exception_falls_through() {
        let rec = record().with_attribute("exception", "just text");
        let mut table = ClassificationTable::default();
        table.skip_attributes.remove("exception");
        let (tags, fields) = flatten(&rec, &table);

        assert_eq!(tags["exception"], s("just text"));
        assert!(!fields.contains_key(THROWN_MESSAGE));
    }

    #[test]
    fn test_unexpanded_exception_renders_as_tag() {
        let rec = record().with_exception(ExceptionInfo::new("E", "m", "t"));
        let mut table = ClassificationTable::default().include_stacktrace(false);
        table.skip_attributes.remove("exception");
        let (tags, _) = flatten(&rec, &table);

        assert_eq!(tags["exception"], s("E: m"));
    }

    #[test]
    fn test_tags_and_fields_stay_disjoint() {
        // `status` first lands as a tag through the nested map, then the
        // numeric top-level attribute of the same name moves it to fields.
        let rec = record()
            .with_attribute("", Value::map([("status", "degraded")]))
            .with_attribute("status", 3);
        let (tags, fields) = flatten(&rec, &ClassificationTable::default());

        assert!(!tags.contains_key("status"));
        assert_eq!(fields["status"], Scalar::Integer(3));
    }

    #[test]
    fn test_timestamp_truncates() {
        assert_eq!(timestamp_ns(1_700_000_000.123456), 1_700_000_000_123_456_000);
        assert_eq!(timestamp_ns(1.9999999999), 1_999_999_999);
    }

    #[test]
    fn test_convert_fans_out_identical_points() {
        let converter = PointConverter::default();
        let points = converter.convert(&record());

        let names: Vec<&str> = points.iter().map(|p| p.measurement.as_str()).collect();
        assert_eq!(names, vec!["app", "app:db", "app:db:pool"]);
        for point in &points {
            assert_eq!(point.tags, points[0].tags);
            assert_eq!(point.fields, points[0].fields);
            assert_eq!(point.timestamp_ns, 1_700_000_000_123_456_000);
        }
    }

    #[test]
    fn test_convert_without_backpop() {
        let converter = PointConverter::new(
            ClassificationTable::default(),
            MeasurementResolver::new(None, false),
        );
        let points = converter.convert(&record());

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].measurement, "app:db:pool");
    }

    #[test]
    fn test_convert_is_deterministic() {
        let converter = PointConverter::default();
        let rec = record()
            .with_attribute("ctx", Value::map([("a", 1), ("b", 2)]))
            .with_attribute("tenant", "acme");

        assert_eq!(converter.convert(&rec), converter.convert(&rec));
    }

    #[test]
    fn test_localname_adds_host_tag() {
        let converter = PointConverter::default().with_localname("node-3");
        let points = converter.convert(&record());
        assert!(points.iter().all(|p| p.tags["host"] == s("node-3")));
    }
}
