//! Metric Schema - closed set of permitted metric names

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::parse::normalize_key;
use crate::{Error, Result};

/// Closed set of metric names a log may carry.
///
/// Names are normalized the same way tagged-line keys are, so
/// `"Cache Misses"` admits the key `cache_misses`. An empty schema is never
/// constructed implicitly: loading without a schema accepts any key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSchema {
    names: BTreeSet<String>,
}

impl MetricSchema {
    /// Create a schema from metric names (normalized on insert).
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(|n| normalize_key(n.as_ref())).collect(),
        }
    }

    /// Check whether a normalized key is permitted.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.names.contains(key)
    }

    /// Validate a normalized key read from `source_name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMetric`] if the key is not in the schema.
    pub fn validate(&self, key: &str, source_name: &str) -> Result<()> {
        if self.contains(key) {
            Ok(())
        } else {
            Err(Error::UnknownMetric {
                key: key.to_string(),
                source_name: source_name.to_string(),
            })
        }
    }

    /// Permitted names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of permitted names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the schema admits nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_normalizes_names() {
        let schema = MetricSchema::new(["Cache Misses", "throughput"]);
        assert!(schema.contains("cache_misses"));
        assert!(schema.contains("throughput"));
        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_schema_rejects_unknown() {
        let schema = MetricSchema::new(["ingest"]);
        assert!(schema.validate("ingest", "a.txt").is_ok());

        let err = schema.validate("bfs", "a.txt").unwrap_err();
        match err {
            Error::UnknownMetric { key, source_name } => {
                assert_eq!(key, "bfs");
                assert_eq!(source_name, "a.txt");
            }
            other => panic!("Expected UnknownMetric, got {other:?}"),
        }
    }
}
