//! Flat Record - one log file's measurements plus filename metadata

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::Value;

/// Flat Record represents one repetition of one benchmark configuration.
///
/// Metrics come from the tagged lines of the log file; metadata comes from
/// the file name (`work`, `dataset`, `threads`, ...). Lookups through
/// [`FlatRecord::field`] give metadata precedence over a metric with the
/// same name.
///
/// Records are immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    source: String,
    metrics: FxHashMap<String, Value>,
    metadata: BTreeMap<String, String>,
}

/// Borrowed view of a record field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    /// Filename-derived field
    Metadata(&'a str),
    /// Parsed metric
    Metric(&'a Value),
}

impl Field<'_> {
    /// Numeric view of the field, if it has one.
    #[must_use]
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Field::Metadata(s) => s.trim().parse().ok(),
            Field::Metric(v) => v.to_number(),
        }
    }
}

impl FlatRecord {
    /// Create a record from parsed metrics, without metadata.
    #[must_use]
    pub fn new(source: impl Into<String>, metrics: FxHashMap<String, Value>) -> Self {
        Self {
            source: source.into(),
            metrics,
            metadata: BTreeMap::new(),
        }
    }

    /// Create a builder for assembling a record by hand.
    #[must_use]
    pub fn builder(source: impl Into<String>) -> FlatRecordBuilder {
        FlatRecordBuilder::new(source)
    }

    /// Return this record with `metadata` merged in (metadata overrides).
    #[must_use]
    pub fn with_metadata<I, K, V>(mut self, metadata: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.metadata
            .extend(metadata.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Get the name of the file this record was parsed from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Look up a field, metadata first.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Field<'_>> {
        self.metadata
            .get(name)
            .map(|s| Field::Metadata(s))
            .or_else(|| self.metrics.get(name).map(Field::Metric))
    }

    /// Get a parsed metric by normalized name.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<&Value> {
        self.metrics.get(name)
    }

    /// Get a filename-derived field.
    #[must_use]
    pub fn metadata(&self, name: &str) -> Option<&str> {
        self.metadata.get(name).map(String::as_str)
    }

    /// All parsed metrics.
    #[must_use]
    pub const fn metrics(&self) -> &FxHashMap<String, Value> {
        &self.metrics
    }

    /// All metadata fields, ordered by name.
    #[must_use]
    pub const fn metadata_fields(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Number of distinct field names (metrics and metadata combined).
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.len()
            + self
                .metadata
                .keys()
                .filter(|k| !self.metrics.contains_key(*k))
                .count()
    }

    /// Check if the record has no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.metadata.is_empty()
    }
}

/// Builder for `FlatRecord`.
#[derive(Debug, Default)]
pub struct FlatRecordBuilder {
    record: FlatRecord,
}

impl FlatRecordBuilder {
    /// Create a new builder for a record parsed from `source`.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            record: FlatRecord {
                source: source.into(),
                ..FlatRecord::default()
            },
        }
    }

    /// Add a metric. A later call with the same name replaces the value.
    #[must_use]
    pub fn metric(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.record.metrics.insert(name.into(), value.into());
        self
    }

    /// Add a metadata field.
    #[must_use]
    pub fn meta(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.record.metadata.insert(name.into(), value.into());
        self
    }

    /// Build the `FlatRecord`.
    #[must_use]
    pub fn build(self) -> FlatRecord {
        self.record
    }
}
