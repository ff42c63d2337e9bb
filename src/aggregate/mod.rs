//! Multi-run alignment and aggregation
//!
//! Several repetitions of one experiment are combined cell by cell:
//!
//! ```text
//! run 1 records ──┐
//! run 2 records ──┼── shared vocabulary ──> per-run tables ──┬─> mean table
//! run N records ──┘                                          ├─> table of samples
//!                                                            └─> robust table
//! ```
//!
//! A cell missing from a run contributes nothing; the aggregate of a cell
//! is taken over the runs that supplied it and is missing only when no run
//! did.
//!
//! The shared vocabulary follows [`VocabularyPolicy`]: the union of every
//! run (default) or the first run alone.
//!
//! ## Usage
//!
//! ```rust
//! use expout_tables::aggregate::{aggregate_mean, AlignOptions};
//! use expout_tables::record::FlatRecord;
//! use expout_tables::table::{always, TableSpec};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rec = |v: f64| {
//!     FlatRecord::builder("x-4.txt").meta("work", "x").meta("threads", "4").metric("ingest", v).build()
//! };
//! let runs = vec![vec![rec(10.0)], vec![], vec![rec(30.0)]];
//!
//! let spec = TableSpec::new("threads", "work", "ingest");
//! let table = aggregate_mean(&runs, &spec, &AlignOptions::default(), always)?;
//! assert_eq!(table.get(4, "x"), Some(&20.0));
//! # Ok(())
//! # }
//! ```

mod reduce;

pub use reduce::{combine, percentile, trimmed_mean, CellReducer, Mean, Median, TrimmedMean};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::record::FlatRecord;
use crate::table::{self, CellKey, Table, TableSpec};
use crate::Result;

/// Values one cell received from the runs that had it, in run order.
pub type CellSample = Vec<f64>;

/// Which runs define the rows and columns of an aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyPolicy {
    /// Every key seen in any run
    #[default]
    Union,
    /// Only keys seen in the first run; cells outside it are dropped
    FirstRun,
}

/// Options for aligning runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignOptions {
    /// Vocabulary policy
    pub policy: VocabularyPolicy,
}

impl AlignOptions {
    /// Options with the given vocabulary policy.
    #[must_use]
    pub const fn with_policy(policy: VocabularyPolicy) -> Self {
        Self { policy }
    }
}

fn shared_vocabulary<P>(
    runs: &[Vec<FlatRecord>],
    spec: &TableSpec,
    options: &AlignOptions,
    predicate: P,
) -> Result<(BTreeSet<CellKey>, BTreeSet<CellKey>)>
where
    P: Fn(&FlatRecord) -> bool,
{
    match options.policy {
        VocabularyPolicy::FirstRun => match runs.first() {
            Some(first) => table::vocabulary(first, spec, predicate),
            None => Ok((BTreeSet::new(), BTreeSet::new())),
        },
        VocabularyPolicy::Union => table::vocabulary(runs.iter().flatten(), spec, predicate),
    }
}

/// Build one table per run over the shared vocabulary.
///
/// # Errors
///
/// Returns the first table-building error of any run.
pub fn extract_runs<P>(
    runs: &[Vec<FlatRecord>],
    spec: &TableSpec,
    options: &AlignOptions,
    predicate: P,
) -> Result<Vec<Table>>
where
    P: Fn(&FlatRecord) -> bool,
{
    let (rows, cols) = shared_vocabulary(runs, spec, options, &predicate)?;

    let mut tables = Vec::with_capacity(runs.len());
    for (idx, run) in runs.iter().enumerate() {
        let mut table = Table::with_vocabulary(
            spec.row.as_str(),
            spec.col.as_str(),
            rows.iter().cloned(),
            cols.iter().cloned(),
        );
        table::fill(&mut table, run, spec, &predicate)?;
        if table.count() == 0 {
            warn!(run = idx, value = %spec.value, "run contributes no cells");
        }
        tables.push(table);
    }

    debug!(
        runs = tables.len(),
        rows = rows.len(),
        cols = cols.len(),
        policy = ?options.policy,
        "aligned runs"
    );
    Ok(tables)
}

/// Cell-wise mean over runs, ignoring runs that lack the cell.
///
/// # Errors
///
/// See [`extract_runs`].
pub fn aggregate_mean<P>(
    runs: &[Vec<FlatRecord>],
    spec: &TableSpec,
    options: &AlignOptions,
    predicate: P,
) -> Result<Table>
where
    P: Fn(&FlatRecord) -> bool,
{
    aggregate_with(runs, spec, options, predicate, &Mean)
}

/// Cell-wise IQR-trimmed mean over runs.
///
/// # Errors
///
/// See [`extract_runs`].
pub fn aggregate_robust<P>(
    runs: &[Vec<FlatRecord>],
    spec: &TableSpec,
    options: &AlignOptions,
    predicate: P,
) -> Result<Table>
where
    P: Fn(&FlatRecord) -> bool,
{
    aggregate_with(runs, spec, options, predicate, &TrimmedMean::default())
}

/// Cell-wise reduction over runs with any reducer.
///
/// # Errors
///
/// See [`extract_runs`].
pub fn aggregate_with<P, R>(
    runs: &[Vec<FlatRecord>],
    spec: &TableSpec,
    options: &AlignOptions,
    predicate: P,
    reducer: &R,
) -> Result<Table>
where
    P: Fn(&FlatRecord) -> bool,
    R: CellReducer + ?Sized,
{
    let tables = extract_runs(runs, spec, options, predicate)?;
    if tables.is_empty() {
        return Ok(Table::empty(spec.row.as_str(), spec.col.as_str()));
    }
    Ok(combine(&tables, reducer))
}

/// Collect each cell's values across runs without reducing them.
///
/// A cell holds the values of the runs that had it, in run order; a cell
/// no run had is missing.
///
/// # Errors
///
/// See [`extract_runs`].
pub fn aggregate_to_lists<P>(
    runs: &[Vec<FlatRecord>],
    spec: &TableSpec,
    options: &AlignOptions,
    predicate: P,
) -> Result<Table<CellSample>>
where
    P: Fn(&FlatRecord) -> bool,
{
    let tables = extract_runs(runs, spec, options, predicate)?;
    let Some(first) = tables.first() else {
        return Ok(Table::empty(spec.row.as_str(), spec.col.as_str()));
    };

    let mut out = Table::with_vocabulary(
        spec.row.as_str(),
        spec.col.as_str(),
        first.rows().iter().cloned(),
        first.cols().iter().cloned(),
    );
    let (nrows, ncols) = out.shape();
    for r in 0..nrows {
        for c in 0..ncols {
            let sample: CellSample = tables.iter().filter_map(|t| t.at(r, c).copied()).collect();
            if !sample.is_empty() {
                out.set_at(r, c, Some(sample));
            }
        }
    }
    Ok(out)
}

impl Table<CellSample> {
    /// Reduce every sample with `reducer`; NaN results become missing.
    #[must_use]
    pub fn reduce<R>(&self, reducer: &R) -> Table
    where
        R: CellReducer + ?Sized,
    {
        let mut out = Table::with_vocabulary(
            self.row_name(),
            self.col_name(),
            self.rows().iter().cloned(),
            self.cols().iter().cloned(),
        );
        let (nrows, ncols) = self.shape();
        for r in 0..nrows {
            for c in 0..ncols {
                let Some(sample) = self.at(r, c) else {
                    continue;
                };
                let value = reducer.reduce(sample);
                if !value.is_nan() {
                    out.set_at(r, c, Some(value));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::always;

    fn rec(work: &str, threads: &str, ingest: f64) -> FlatRecord {
        FlatRecord::builder(format!("{work}-{threads}.txt"))
            .meta("work", work)
            .meta("threads", threads)
            .metric("ingest", ingest)
            .build()
    }

    fn spec() -> TableSpec {
        TableSpec::new("threads", "work", "ingest")
    }

    #[test]
    fn test_mean_ignores_runs_missing_the_cell() {
        let runs = vec![
            vec![rec("x", "4", 10.0), rec("y", "4", 1.0)],
            vec![rec("y", "4", 3.0)],
            vec![rec("x", "4", 30.0)],
        ];
        let table = aggregate_mean(&runs, &spec(), &AlignOptions::default(), always).unwrap();

        assert_eq!(table.get(4, "x"), Some(&20.0));
        assert_eq!(table.get(4, "y"), Some(&2.0));
    }

    #[test]
    fn test_first_run_policy_drops_later_keys() {
        let runs = vec![vec![rec("x", "4", 1.0)], vec![rec("x", "4", 3.0), rec("x", "8", 5.0)]];

        let first = AlignOptions::with_policy(VocabularyPolicy::FirstRun);
        let table = aggregate_mean(&runs, &spec(), &first, always).unwrap();
        assert_eq!(table.rows(), [CellKey::from(4)]);
        assert_eq!(table.get(4, "x"), Some(&2.0));

        let union = aggregate_mean(&runs, &spec(), &AlignOptions::default(), always).unwrap();
        assert_eq!(union.rows(), [CellKey::from(4), CellKey::from(8)]);
        assert_eq!(union.get(8, "x"), Some(&5.0));
    }

    #[test]
    fn test_first_run_policy_applies_to_lists() {
        let runs = vec![
            vec![rec("x", "4", 1.0)],
            vec![rec("x", "4", 3.0), rec("x", "8", 5.0), rec("y", "4", 7.0)],
        ];

        let first = AlignOptions::with_policy(VocabularyPolicy::FirstRun);
        let lists = aggregate_to_lists(&runs, &spec(), &first, always).unwrap();
        assert_eq!(lists.shape(), (1, 1));
        assert_eq!(lists.get(4, "x"), Some(&vec![1.0, 3.0]));
        assert_eq!(lists.get(8, "x"), None);
        assert_eq!(lists.get(4, "y"), None);

        let union = aggregate_to_lists(&runs, &spec(), &AlignOptions::default(), always).unwrap();
        assert_eq!(union.shape(), (2, 2));
        assert_eq!(union.get(8, "x"), Some(&vec![5.0]));
        assert_eq!(union.get(4, "y"), Some(&vec![7.0]));
    }

    #[test]
    fn test_nan_reading_never_enters_samples() {
        let metrics = crate::parse::parse_output("[EXPOUT]ingest: nan\n").unwrap();
        let nan_run = vec![FlatRecord::new("x-4.txt", metrics).with_metadata([("work", "x"), ("threads", "4")])];
        let runs = vec![nan_run, vec![rec("x", "4", 10.0)]];

        let lists = aggregate_to_lists(&runs, &spec(), &AlignOptions::default(), always).unwrap();
        assert_eq!(lists.get(4, "x"), Some(&vec![10.0]));

        let mean = aggregate_mean(&runs, &spec(), &AlignOptions::default(), always).unwrap();
        assert_eq!(mean.get(4, "x"), Some(&10.0));
    }

    #[test]
    fn test_to_lists_in_run_order() {
        let runs = vec![
            vec![rec("x", "4", 3.0)],
            vec![rec("x", "8", 9.0)],
            vec![rec("x", "4", 1.0)],
        ];
        let lists = aggregate_to_lists(&runs, &spec(), &AlignOptions::default(), always).unwrap();

        assert_eq!(lists.get(4, "x"), Some(&vec![3.0, 1.0]));
        assert_eq!(lists.get(8, "x"), Some(&vec![9.0]));

        let reduced = lists.reduce(&Mean);
        assert_eq!(reduced.get(4, "x"), Some(&2.0));
    }

    #[test]
    fn test_robust_trims_outlier_run() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let runs: Vec<Vec<FlatRecord>> = values.iter().map(|v| vec![rec("x", "1", *v)]).collect();

        let robust = aggregate_robust(&runs, &spec(), &AlignOptions::default(), always).unwrap();
        assert_eq!(robust.get(1, "x"), Some(&3.0));

        let mean = aggregate_mean(&runs, &spec(), &AlignOptions::default(), always).unwrap();
        assert!((mean.get(1, "x").copied().unwrap() - 115.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_predicate_applies_to_every_run() {
        let runs = vec![
            vec![rec("x", "1", 1.0), rec("skip", "1", 50.0)],
            vec![rec("x", "1", 3.0), rec("skip", "1", 70.0)],
        ];
        let keep_x = |r: &FlatRecord| r.metadata("work") == Some("x");
        let table = aggregate_mean(&runs, &spec(), &AlignOptions::default(), keep_x).unwrap();

        assert_eq!(table.cols(), [CellKey::from("x")]);
        assert_eq!(table.get(1, "x"), Some(&2.0));
    }

    #[test]
    fn test_no_runs_gives_empty_table() {
        let runs: Vec<Vec<FlatRecord>> = Vec::new();
        let table = aggregate_mean(&runs, &spec(), &AlignOptions::default(), always).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.row_name(), "threads");

        let lists = aggregate_to_lists(&runs, &spec(), &AlignOptions::default(), always).unwrap();
        assert!(lists.is_empty());
    }

    #[test]
    fn test_extract_runs_share_vocabulary() {
        let runs = vec![vec![rec("x", "1", 1.0)], vec![rec("y", "2", 2.0)]];
        let tables = extract_runs(&runs, &spec(), &AlignOptions::default(), always).unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].shape(), (2, 2));
        assert_eq!(tables[0].rows(), tables[1].rows());
        assert_eq!(tables[0].get(2, "y"), None);
        assert_eq!(tables[1].get(2, "y"), Some(&2.0));
    }

    #[test]
    fn test_policy_from_json() {
        let options: AlignOptions = serde_json::from_str(r#"{"policy": "first_run"}"#).unwrap();
        assert_eq!(options.policy, VocabularyPolicy::FirstRun);
        let defaults: AlignOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.policy, VocabularyPolicy::Union);
    }
}
