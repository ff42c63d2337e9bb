//! Tagged-line log parsing
//!
//! A benchmark log is free-form text. Only lines containing the sentinel
//! marker (default `[EXPOUT]`) carry measurements:
//!
//! ```text
//! loading graph ... done
//! [EXPOUT]Throughput: 12.5 Mops/s
//! [EXPOUT]latencies: [1.0, 2.5, 3.0]
//! ```
//!
//! The text after the marker is split on its first colon into key and
//! value. Keys are lower-cased, trimmed, and have spaces replaced by
//! underscores. Values are a scalar (first numeric substring), a bracketed
//! sequence, or raw text.
//!
//! A malformed number is fatal for the whole file: it surfaces as
//! [`Error::Parse`] instead of being replaced by a default.

mod filename;

pub use filename::{file_stem, FilenameFields, DEFAULT_SEPARATOR};

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::record::{FlatRecord, MetricSchema, Value};
use crate::{Error, Result};

/// Sentinel marking a significant log line
pub const EXPOUT_TAG: &str = "[EXPOUT]";

/// First numeric substring: optional sign, integer or decimal, optional exponent
fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?")
            .expect("numeric pattern is a valid regex")
    })
}

/// Normalize a metric name: lower-case, trim, spaces to underscores.
///
/// ```
/// use expout_tables::parse::normalize_key;
///
/// assert_eq!(normalize_key("  Cache Misses "), "cache_misses");
/// ```
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().trim().replace(' ', "_")
}

/// Parser for tagged benchmark output.
#[derive(Debug, Clone)]
pub struct TaggedLineParser {
    marker: String,
    schema: Option<MetricSchema>,
}

impl Default for TaggedLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TaggedLineParser {
    /// Create a parser for the default `[EXPOUT]` marker accepting any key.
    #[must_use]
    pub fn new() -> Self {
        Self {
            marker: EXPOUT_TAG.to_string(),
            schema: None,
        }
    }

    /// Use a different sentinel marker.
    #[must_use]
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Reject keys outside `schema`.
    #[must_use]
    pub fn schema(mut self, schema: MetricSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Parse the full text of one log.
    ///
    /// Later lines overwrite earlier lines with the same key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] on a tagged line without a colon or with a
    /// malformed number, and [`Error::UnknownMetric`] when a schema is set
    /// and a key falls outside it.
    ///
    /// # Example
    ///
    /// ```
    /// use expout_tables::parse::TaggedLineParser;
    /// use expout_tables::record::Value;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let text = "warmup\n[EXPOUT]Ingest Time: 3.25 s\n[EXPOUT]list: [1, 2, 3]\n";
    /// let metrics = TaggedLineParser::new().parse_str(text, "inline")?;
    ///
    /// assert_eq!(metrics["ingest_time"], Value::Scalar(3.25));
    /// assert_eq!(metrics["list"], Value::Sequence(vec![1.0, 2.0, 3.0]));
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse_str(&self, text: &str, source_name: &str) -> Result<FxHashMap<String, Value>> {
        let mut metrics = FxHashMap::default();

        for (idx, line) in text.lines().enumerate() {
            let Some((_, tagged)) = line.split_once(self.marker.as_str()) else {
                continue;
            };
            let line_no = idx + 1;
            let parse_err = |message: String| Error::Parse {
                source_name: source_name.to_string(),
                line: line_no,
                message,
            };

            let (raw_key, raw_value) = tagged
                .split_once(':')
                .ok_or_else(|| parse_err(format!("tagged line has no ':' separator: {tagged:?}")))?;

            let key = normalize_key(raw_key);
            if let Some(schema) = &self.schema {
                schema.validate(&key, source_name)?;
            }

            let value = parse_value(raw_value).map_err(parse_err)?;
            metrics.insert(key, value);
        }

        Ok(metrics)
    }

    /// Read and parse one log file into a record without metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise as
    /// [`TaggedLineParser::parse_str`].
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<FlatRecord> {
        let path = path.as_ref();
        let source_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        let text = std::fs::read_to_string(path)?;
        let metrics = self.parse_str(&text, &source_name)?;
        debug!(file = %source_name, metrics = metrics.len(), "parsed log");

        Ok(FlatRecord::new(source_name, metrics))
    }
}

/// Parse the text after `key:` on a tagged line.
///
/// The error is a bare message; the caller attaches file and line.
fn parse_value(raw: &str) -> std::result::Result<Value, String> {
    let value = raw.trim();
    let Some(first) = value.chars().next() else {
        return Ok(Value::Text(String::new()));
    };

    match first {
        '-' | '+' | '.' | '0'..='9' => {
            let m = number_pattern()
                .find(value)
                .ok_or_else(|| format!("no number in value {value:?}"))?;
            m.as_str()
                .parse::<f64>()
                .map(Value::Scalar)
                .map_err(|e| format!("bad number {:?}: {e}", m.as_str()))
        }
        '[' => parse_sequence(value).map(Value::Sequence),
        _ => Ok(Value::Text(value.to_string())),
    }
}

fn parse_sequence(value: &str) -> std::result::Result<Vec<f64>, String> {
    let close = value
        .rfind(']')
        .ok_or_else(|| format!("unterminated list {value:?}"))?;
    let interior = value[1..close].trim();
    if interior.is_empty() {
        return Ok(Vec::new());
    }

    interior
        .split(',')
        .map(|item| {
            let item = item.trim();
            item.parse::<f64>()
                .map_err(|e| format!("bad list element {item:?}: {e}"))
        })
        .collect()
}

/// Parse text with the default marker and no schema.
///
/// # Errors
///
/// See [`TaggedLineParser::parse_str`].
pub fn parse_output(text: &str) -> Result<FxHashMap<String, Value>> {
    TaggedLineParser::new().parse_str(text, "<input>")
}
