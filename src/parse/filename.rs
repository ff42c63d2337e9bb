//! Filename metadata extraction
//!
//! A log named `bubble-Twitter-8.txt` read with field names
//! `["work", "dataset", "threads"]` yields
//! `{work: "bubble", dataset: "Twitter", threads: "8"}`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default separator between filename fields
pub const DEFAULT_SEPARATOR: &str = "-";

/// File name without its last extension (`work-4.txt` -> `work-4`).
#[must_use]
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Positional field names encoded in log file names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenameFields {
    names: Vec<String>,
    separator: String,
}

impl Default for FilenameFields {
    fn default() -> Self {
        Self::new(["work"])
    }
}

impl FilenameFields {
    /// Create field names split by the default `-` separator.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// Use a different separator.
    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Expected field names, in filename order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Separator between fields.
    #[must_use]
    pub fn sep(&self) -> &str {
        &self.separator
    }

    /// Split a stem and zip the parts with the field names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldCountMismatch`] unless the stem splits into
    /// exactly as many parts as there are names.
    ///
    /// # Example
    ///
    /// ```
    /// use expout_tables::parse::FilenameFields;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let fields = FilenameFields::new(["work", "threads"]);
    /// let pairs = fields.extract("bubble-8")?;
    /// assert_eq!(pairs, vec![
    ///     ("work".to_string(), "bubble".to_string()),
    ///     ("threads".to_string(), "8".to_string()),
    /// ]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn extract(&self, stem: &str) -> Result<Vec<(String, String)>> {
        let parts: Vec<String> = stem.split(self.separator.as_str()).map(String::from).collect();

        if parts.len() != self.names.len() {
            return Err(Error::FieldCountMismatch {
                stem: stem.to_string(),
                parts,
                names: self.names.clone(),
            });
        }

        Ok(self.names.iter().cloned().zip(parts).collect())
    }

    /// Extract fields from a path's stem.
    ///
    /// # Errors
    ///
    /// See [`FilenameFields::extract`].
    pub fn extract_path(&self, path: &Path) -> Result<Vec<(String, String)>> {
        self.extract(&file_stem(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_three_fields() {
        let fields = FilenameFields::new(["work", "dataset", "alpha"]);
        let pairs = fields.extract_path(Path::new("/runs/bubble-Twitter-0.5.txt")).unwrap();

        assert_eq!(pairs[0], ("work".to_string(), "bubble".to_string()));
        assert_eq!(pairs[1], ("dataset".to_string(), "Twitter".to_string()));
        assert_eq!(pairs[2], ("alpha".to_string(), "0.5".to_string()));
    }

    #[test]
    fn test_custom_separator() {
        let fields = FilenameFields::new(["work", "threads"]).separator("_");
        let pairs = fields.extract("lsgraph_16").unwrap();
        assert_eq!(pairs[1].1, "16");
        assert_eq!(fields.sep(), "_");
    }

    #[test]
    fn test_count_mismatch() {
        let fields = FilenameFields::new(["work", "dataset"]);
        let err = fields.extract("bubble-Twitter-8").unwrap_err();

        match &err {
            Error::FieldCountMismatch { parts, names, .. } => {
                assert_eq!(parts.len(), 3);
                assert_eq!(names.len(), 2);
            }
            other => panic!("Expected FieldCountMismatch, got {other:?}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("length mismatch"));
        assert!(msg.contains("3 parts vs 2 names"));
    }

    #[test]
    fn test_file_stem_strips_last_extension() {
        assert_eq!(file_stem(Path::new("work-4.txt")), "work-4");
        assert_eq!(file_stem(Path::new("a/b/work-4.log.txt")), "work-4.log");
    }
}
