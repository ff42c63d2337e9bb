//! Directory loading
//!
//! One directory holds one repetition of an experiment: a log file per
//! configuration, named after the configuration (`work-dataset.txt`).
//! Loading applies the tagged-line parser and the filename extractor to
//! every file in lexicographic order.
//!
//! Loading is fail-fast: the first malformed file aborts the directory and
//! no partial result is returned.
//!
//! ## Example
//!
//! ```rust,no_run
//! use expout_tables::loader::{latest_entries, load_runs, LoadOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = LoadOptions::builder()
//!     .fields(["work", "dataset", "threads"])
//!     .build();
//!
//! // Newest five repetitions of the scalability experiment
//! let dirs: Vec<_> = latest_entries("data/experiments/scalability/raw", 5, 0)?
//!     .into_iter()
//!     .map(|entry| entry.path)
//!     .collect();
//! let runs = load_runs(&dirs, &options)?;
//! println!("{} runs", runs.len());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::parse::{FilenameFields, TaggedLineParser, DEFAULT_SEPARATOR, EXPOUT_TAG};
use crate::record::{FlatRecord, MetricSchema};
use crate::Result;

/// Options controlling how a directory of logs becomes records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Sentinel marking significant lines
    pub marker: String,
    /// Field names encoded in file names
    pub fields: FilenameFields,
    /// Permitted metric names; `None` accepts any key
    pub schema: Option<MetricSchema>,
    /// Only load files with this extension (without the dot)
    pub extension: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            marker: EXPOUT_TAG.to_string(),
            fields: FilenameFields::default(),
            schema: None,
            extension: None,
        }
    }
}

impl LoadOptions {
    /// Create a builder starting from the defaults.
    #[must_use]
    pub fn builder() -> LoadOptionsBuilder {
        LoadOptionsBuilder::default()
    }

    /// Options of the oldest loader: `work-dataset` file names.
    #[must_use]
    pub fn work_dataset() -> Self {
        Self::builder().fields(["work", "dataset"]).build()
    }

    /// Read options from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn parser(&self) -> TaggedLineParser {
        let parser = TaggedLineParser::new().marker(self.marker.as_str());
        match &self.schema {
            Some(schema) => parser.schema(schema.clone()),
            None => parser,
        }
    }
}

/// Builder for `LoadOptions`.
#[derive(Debug, Default)]
pub struct LoadOptionsBuilder {
    options: LoadOptions,
    separator: Option<String>,
}

impl LoadOptionsBuilder {
    /// Set the filename field names.
    #[must_use]
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.fields = FilenameFields::new(names);
        self
    }

    /// Set the filename field separator (default `-`).
    #[must_use]
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Set the sentinel marker (default `[EXPOUT]`).
    #[must_use]
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.options.marker = marker.into();
        self
    }

    /// Restrict metric names to `schema`.
    #[must_use]
    pub fn schema(mut self, schema: MetricSchema) -> Self {
        self.options.schema = Some(schema);
        self
    }

    /// Only load files ending in `.{extension}`.
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.options.extension = Some(extension.into());
        self
    }

    /// Build the `LoadOptions`.
    #[must_use]
    pub fn build(self) -> LoadOptions {
        let mut options = self.options;
        let separator = self.separator.unwrap_or_else(|| DEFAULT_SEPARATOR.to_string());
        options.fields = options.fields.separator(separator);
        options
    }
}

/// Loads every log file of a directory into records.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    parser: TaggedLineParser,
    options: LoadOptions,
}

impl DirectoryLoader {
    /// Create a loader for the given options.
    #[must_use]
    pub fn new(options: LoadOptions) -> Self {
        Self {
            parser: options.parser(),
            options,
        }
    }

    /// Options this loader was built from.
    #[must_use]
    pub const fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Parse one file and merge its filename metadata.
    ///
    /// # Errors
    ///
    /// Returns the parse error of the file, or
    /// [`crate::Error::FieldCountMismatch`] if its name does not match the
    /// configured fields.
    pub fn load_file(&self, path: &Path) -> Result<FlatRecord> {
        let metadata = self.options.fields.extract_path(path)?;
        let record = self.parser.parse_file(path)?.with_metadata(metadata);
        debug!(file = %record.source(), fields = record.len(), "loaded record");
        Ok(record)
    }

    /// Load all files of `dir` in lexicographic file-name order.
    ///
    /// Subdirectories are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first IO, parse, or filename error encountered.
    pub fn load_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<FlatRecord>> {
        let dir = dir.as_ref();
        let files = self.list_files(dir)?;

        let records = files
            .iter()
            .map(|path| self.load_file(path))
            .collect::<Result<Vec<_>>>()?;

        info!(dir = %dir.display(), records = records.len(), "loaded run directory");
        Ok(records)
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if let Some(ext) = &self.options.extension {
                if path.extension().and_then(|e| e.to_str()) != Some(ext.as_str()) {
                    continue;
                }
            }
            files.push(path);
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}

/// Load one repetition directory.
///
/// # Errors
///
/// See [`DirectoryLoader::load_dir`].
pub fn load_dir(dir: impl AsRef<Path>, options: &LoadOptions) -> Result<Vec<FlatRecord>> {
    DirectoryLoader::new(options.clone()).load_dir(dir)
}

/// Load a directory of `work-dataset.txt` logs.
///
/// # Errors
///
/// See [`DirectoryLoader::load_dir`].
pub fn load_dir_default(dir: impl AsRef<Path>) -> Result<Vec<FlatRecord>> {
    load_dir(dir, &LoadOptions::work_dataset())
}

/// Load several repetition directories, in the given order.
///
/// # Errors
///
/// Returns the first error of any directory.
pub fn load_runs<P: AsRef<Path>>(dirs: &[P], options: &LoadOptions) -> Result<Vec<Vec<FlatRecord>>> {
    let loader = DirectoryLoader::new(options.clone());
    let runs = dirs
        .iter()
        .map(|dir| loader.load_dir(dir))
        .collect::<Result<Vec<_>>>()?;
    info!(runs = runs.len(), "loaded run set");
    Ok(runs)
}

/// Load several repetition directories concurrently.
///
/// Output order matches `dirs`. Any failing directory fails the whole call.
///
/// # Errors
///
/// Returns an error of a failing directory.
#[cfg(feature = "rayon")]
pub fn load_runs_parallel<P>(dirs: &[P], options: &LoadOptions) -> Result<Vec<Vec<FlatRecord>>>
where
    P: AsRef<Path> + Sync,
{
    use rayon::prelude::*;

    let loader = DirectoryLoader::new(options.clone());
    let runs = dirs
        .par_iter()
        .map(|dir| loader.load_dir(dir))
        .collect::<Result<Vec<_>>>()?;
    info!(runs = runs.len(), "loaded run set in parallel");
    Ok(runs)
}

/// A directory entry with its modification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEntry {
    /// Full path of the entry
    pub path: PathBuf,
    /// Last modification time
    pub modified: DateTime<Utc>,
}

/// Select the newest entries of `dir` by modification time.
///
/// Entries are ordered oldest first (ties broken by name). The newest `n`
/// form a window, and the `ignore_latest` newest of that window are
/// dropped, so at most `n - ignore_latest` entries come back, oldest first.
/// This skips a repetition that is still being written.
///
/// # Errors
///
/// Returns [`crate::Error::Io`] if the directory or an entry's metadata
/// cannot be read.
pub fn latest_entries(dir: impl AsRef<Path>, n: usize, ignore_latest: usize) -> Result<Vec<RunEntry>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let entry = entry?;
        let modified = entry.metadata()?.modified()?;
        entries.push(RunEntry {
            path: entry.path(),
            modified: DateTime::<Utc>::from(modified),
        });
    }
    entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));

    let start = entries.len().saturating_sub(n);
    let end = entries.len().saturating_sub(ignore_latest).max(start);
    Ok(entries.drain(start..end).collect())
}
