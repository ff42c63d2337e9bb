//! Parsed measurement values

use serde::{Deserialize, Serialize};

/// Value carried by one tagged line.
///
/// Serialized untagged: a scalar is a JSON number, a sequence a JSON array
/// and text a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Single number (`throughput: 12.5 Mops/s`)
    Scalar(f64),
    /// Bracketed list (`latencies: [1, 2, 3]`)
    Sequence(Vec<f64>),
    /// Anything else, kept verbatim
    Text(String),
}

impl Value {
    /// Scalar payload, if this is a scalar.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Sequence payload, if this is a sequence.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[f64]> {
        match self {
            Self::Sequence(v) => Some(v),
            _ => None,
        }
    }

    /// Text payload, if this is raw text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view: scalars as-is, text only if it parses as a number.
    #[must_use]
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Sequence(_) => None,
        }
    }

    /// Short name of the variant, for error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Sequence(_) => "sequence",
            Self::Text(_) => "text",
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Scalar(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Self::Sequence(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}
