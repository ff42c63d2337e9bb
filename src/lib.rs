//! # expout-tables: Benchmark Log Tables
//!
//! **Version**: 0.1.0
//!
//! Benchmark programs print their results as tagged lines
//! (`[EXPOUT] throughput: 12.5`). This crate turns directories of such logs
//! into two-key tables (e.g. threads × workload) and combines repeated runs
//! of the same experiment into one table, optionally trimming outlier runs.
//!
//! ## Pipeline
//!
//! ```text
//! work-4.txt ─┐                      ┌──────────────┐
//! work-8.txt ─┼─ parse + filename ──>│ FlatRecord[] │── build ──> Table
//! ...         ┘   metadata           └──────────────┘
//!
//! run_1/ ─┐
//! run_2/ ─┼─ load_runs ──> aggregate_{mean,robust,to_lists} ──> Table
//! run_N/ ─┘
//! ```
//!
//! - [`parse`]: tagged-line log parsing
//! - [`record`]: flat records (metrics plus filename metadata)
//! - [`loader`]: directory loading and run selection
//! - [`table`]: two-key table assembly, rendering, columnar export
//! - [`aggregate`]: multi-run alignment and cell reducers
//!
//! ## Example Usage
//!
//! ```rust
//! use expout_tables::parse::TaggedLineParser;
//! use expout_tables::record::FlatRecord;
//! use expout_tables::table::{build_all, TableSpec};
//!
//! # fn main() -> expout_tables::Result<()> {
//! let parser = TaggedLineParser::default();
//! let metrics = parser.parse_str("[EXPOUT] throughput: 12.5\nnoise\n", "bubble-4.txt")?;
//!
//! let record = FlatRecord::new("bubble-4.txt", metrics)
//!     .with_metadata([("work", "bubble"), ("threads", "4")]);
//!
//! let table = build_all(&[record], &TableSpec::new("threads", "work", "throughput"))?;
//! assert_eq!(table.get(4, "bubble"), Some(&12.5));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod aggregate;
pub mod error;
pub mod loader;
pub mod parse;
pub mod record;
pub mod table;

pub use error::{Error, Result};
