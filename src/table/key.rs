//! Row and column keys

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::record::{Field, Value};
use crate::{Error, Result};

/// Key of a table row or column.
///
/// Filename fields are strings; a key that reads as a finite number
/// (`"4"`, `"0.5"`) becomes [`CellKey::Number`] so thread counts sort as
/// 1, 2, 4, 16 rather than 1, 16, 2, 4.
///
/// Ordering: every number sorts before every text key; numbers by value,
/// text lexicographically.
///
/// Numeric coercion is by value, so `"04"`, `"4"` and `"4.0"` are the same
/// key and files named that way land in the same cell (last write wins).
/// Non-finite numbers (`inf`, `NaN`) are always text keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellKey {
    /// Numeric key
    Number(f64),
    /// Text key
    Text(String),
}

impl CellKey {
    /// Coerce a raw string: finite numbers become `Number`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Self::Number(v),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// Key for a record field named `name`.
    ///
    /// A non-finite scalar becomes a text key, as in [`CellKey::parse`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a sequence-valued metric.
    pub fn from_field(field: Field<'_>, name: &str) -> Result<Self> {
        match field {
            Field::Metadata(s) => Ok(Self::parse(s)),
            Field::Metric(Value::Text(s)) => Ok(Self::parse(s)),
            Field::Metric(Value::Scalar(v)) if v.is_finite() => Ok(Self::Number(*v)),
            Field::Metric(Value::Scalar(v)) => Ok(Self::Text(v.to_string())),
            Field::Metric(Value::Sequence(_)) => Err(Error::InvalidInput(format!(
                "field '{name}' is a sequence and cannot be used as a table key"
            ))),
        }
    }

    /// Numeric value, if numeric.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    /// Text value, if text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl PartialEq for CellKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellKey {}

impl PartialOrd for CellKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

impl Hash for CellKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Number(v) => {
                0u8.hash(state);
                v.to_bits().hash(state);
            }
            Self::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for CellKey {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for CellKey {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<&str> for CellKey {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellKey {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&CellKey> for CellKey {
    fn from(key: &CellKey) -> Self {
        key.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_keys_sort_numerically() {
        let mut keys: Vec<CellKey> = ["16", "2", "1", "4"].iter().map(|s| CellKey::parse(s)).collect();
        keys.sort();
        let shown: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(shown, ["1", "2", "4", "16"]);
    }

    #[test]
    fn test_numbers_before_text() {
        let mut keys = vec![CellKey::from("bubble"), CellKey::from(8), CellKey::from("lsgraph")];
        keys.sort();
        assert_eq!(keys, vec![CellKey::from(8), CellKey::from("bubble"), CellKey::from("lsgraph")]);
    }

    #[test]
    fn test_parse_keeps_non_finite_as_text() {
        assert_eq!(CellKey::parse("nan"), CellKey::from("nan"));
        assert_eq!(CellKey::parse("inf"), CellKey::from("inf"));
        assert_eq!(CellKey::parse("0.5"), CellKey::from(0.5));
    }

    #[test]
    fn test_from_field() {
        let seq = Value::Sequence(vec![1.0]);
        assert!(CellKey::from_field(Field::Metric(&seq), "lat").is_err());

        let scalar = Value::Scalar(3.0);
        assert_eq!(CellKey::from_field(Field::Metric(&scalar), "x").unwrap(), CellKey::from(3));
        assert_eq!(
            CellKey::from_field(Field::Metadata("Twitter"), "dataset").unwrap(),
            CellKey::from("Twitter")
        );
    }

    #[test]
    fn test_numeric_spellings_share_a_key() {
        assert_eq!(CellKey::parse("04"), CellKey::parse("4"));
        assert_eq!(CellKey::parse("4.0"), CellKey::from(4));
        assert_eq!(CellKey::parse("04").to_string(), "4");
    }

    #[test]
    fn test_non_finite_scalar_key_is_text() {
        let inf = Value::Scalar(f64::NEG_INFINITY);
        assert_eq!(CellKey::from_field(Field::Metric(&inf), "x").unwrap(), CellKey::from("-inf"));
        let nan = Value::Scalar(f64::NAN);
        assert_eq!(CellKey::from_field(Field::Metric(&nan), "x").unwrap(), CellKey::from("NaN"));
    }

    #[test]
    fn test_json_untagged() {
        let keys = vec![CellKey::from(4), CellKey::from("x")];
        assert_eq!(serde_json::to_string(&keys).unwrap(), r#"[4.0,"x"]"#);
    }
}
