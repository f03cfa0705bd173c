// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Classification of record attributes into InfluxDB tags and fields.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Rules deciding which output role each record attribute takes.
///
/// Tag rules are consulted before field rules, and an exclusion always wins
/// over the inclusion at the same role. Every handler owns its table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationTable {
    /// Attribute name to tag name.
    pub include_tags: BTreeMap<String, String>,
    /// Attribute name to field name.
    pub include_fields: BTreeMap<String, String>,
    /// Bookkeeping attributes never emitted as extra tags or fields.
    pub skip_attributes: BTreeSet<String>,
    /// Emit unclassified non-numeric attributes as tags.
    pub extra_tags: bool,
    /// Emit unclassified numeric attributes as fields.
    pub extra_fields: bool,
    /// Names never emitted as tags.
    pub exclude_tags: BTreeSet<String>,
    /// Names never emitted as fields.
    pub exclude_fields: BTreeSet<String>,
    /// Expand the exception attribute into `thrown.*` keys.
    pub include_stacktrace: bool,
}

const DEFAULT_TAGS: &[(&str, &str)] = &[
    ("file", "file"),
    ("function", "function"),
    ("line", "line"),
    ("level", "level"),
    ("thread_id", "thread"),
    ("thread_name", "thread_name"),
    ("process_name", "process_name"),
];

const DEFAULT_FIELDS: &[(&str, &str)] = &[("message", "message")];

const DEFAULT_SKIP: &[&str] = &[
    "logger",
    "level_no",
    "created",
    "module",
    "process_id",
    "exception",
    "args",
    "msecs",
    "relative_created",
];

impl Default for ClassificationTable {
    fn default() -> Self {
        Self {
            include_tags: to_map(DEFAULT_TAGS),
            include_fields: to_map(DEFAULT_FIELDS),
            skip_attributes: DEFAULT_SKIP.iter().map(|s| s.to_string()).collect(),
            extra_tags: true,
            extra_fields: true,
            exclude_tags: BTreeSet::new(),
            exclude_fields: BTreeSet::new(),
            include_stacktrace: true,
        }
    }
}

fn to_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl ClassificationTable {
    /// A table with no rules; every attribute falls through to the extra
    /// tag/field rule.
    pub fn empty() -> Self {
        Self {
            include_tags: BTreeMap::new(),
            include_fields: BTreeMap::new(),
            skip_attributes: BTreeSet::new(),
            ..Default::default()
        }
    }

    /// Map an attribute to a tag.
    pub fn tag(mut self, attribute: impl Into<String>, tag: impl Into<String>) -> Self {
        self.include_tags.insert(attribute.into(), tag.into());
        self
    }

    /// Map an attribute to a field.
    pub fn field(mut self, attribute: impl Into<String>, field: impl Into<String>) -> Self {
        self.include_fields.insert(attribute.into(), field.into());
        self
    }

    /// Never emit `attribute` as an extra tag or field.
    pub fn skip(mut self, attribute: impl Into<String>) -> Self {
        self.skip_attributes.insert(attribute.into());
        self
    }

    pub fn exclude_tag(mut self, name: impl Into<String>) -> Self {
        self.exclude_tags.insert(name.into());
        self
    }

    pub fn exclude_field(mut self, name: impl Into<String>) -> Self {
        self.exclude_fields.insert(name.into());
        self
    }

    pub fn extra_tags(mut self, enabled: bool) -> Self {
        self.extra_tags = enabled;
        self
    }

    pub fn extra_fields(mut self, enabled: bool) -> Self {
        self.extra_fields = enabled;
        self
    }

    pub fn include_stacktrace(mut self, enabled: bool) -> Self {
        self.include_stacktrace = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let table = ClassificationTable::default();

        assert_eq!(table.include_tags.get("thread_id").map(String::as_str), Some("thread"));
        assert_eq!(table.include_fields.get("message").map(String::as_str), Some("message"));
        assert!(table.skip_attributes.contains("created"));
        assert!(table.extra_tags && table.extra_fields && table.include_stacktrace);
        assert!(table.exclude_tags.is_empty() && table.exclude_fields.is_empty());
    }

    #[test]
    fn test_instances_do_not_share_maps() {
        let base = ClassificationTable::default();
        let tuned = base.clone().tag("user", "user").exclude_tag("line");

        assert!(!base.include_tags.contains_key("user"));
        assert!(base.exclude_tags.is_empty());
        assert!(tuned.include_tags.contains_key("user"));
        assert_ne!(base, tuned);
        assert_eq!(ClassificationTable::default(), base);
    }

    #[test]
    fn test_empty_table() {
        let table = ClassificationTable::empty();
        assert!(table.include_tags.is_empty());
        assert!(table.include_fields.is_empty());
        assert!(table.skip_attributes.is_empty());
        assert!(table.extra_tags);
    }
}
