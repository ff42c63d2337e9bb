//! Two-key tables projected from flat records
//!
//! A [`Table`] maps `(row key, column key)` to an optional cell. The row
//! and column vocabularies are the sorted distinct values of the chosen
//! record fields, so the shape is derived from the data rather than
//! declared up front.
//!
//! ```text
//!  records ──filter──> vocabulary (sorted rows × sorted cols)
//!          ──fill────> cells[row][col] = record[value]   (last write wins)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use expout_tables::record::FlatRecord;
//! use expout_tables::table::{build_all, TableSpec};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let records = vec![
//!     FlatRecord::builder("work-8.txt").meta("work", "work").meta("threads", "8").metric("throughput", 20.0).build(),
//!     FlatRecord::builder("work-4.txt").meta("work", "work").meta("threads", "4").metric("throughput", 10.0).build(),
//! ];
//!
//! let table = build_all(&records, &TableSpec::new("threads", "work", "throughput"))?;
//! assert_eq!(table.shape(), (2, 1));
//! assert_eq!(table.get(4, "work"), Some(&10.0));
//! assert_eq!(table.get(8, "work"), Some(&20.0));
//! # Ok(())
//! # }
//! ```

mod columnar;
mod format;
mod key;

pub use format::TableFormat;
pub use key::CellKey;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::{Field, FlatRecord, Value};
use crate::{Error, Result};

/// Which record fields form rows, columns, and cell values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Field whose values become row keys
    pub row: String,
    /// Field whose values become column keys
    pub col: String,
    /// Field whose value is written into the cell
    pub value: String,
}

impl TableSpec {
    /// Create a spec from row, column, and value field names.
    #[must_use]
    pub fn new(row: impl Into<String>, col: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            row: row.into(),
            col: col.into(),
            value: value.into(),
        }
    }

    /// Same rows and columns, different value field.
    #[must_use]
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..self.clone()
        }
    }
}

/// Predicate that admits every record.
#[must_use]
pub const fn always(_: &FlatRecord) -> bool {
    true
}

/// Two-dimensional table with optional cells.
///
/// Cells are stored row-major. A missing cell is `None`, never zero.
/// Deserialization rejects documents whose cell count does not match
/// `rows × cols`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "TableRepr<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct Table<T = f64> {
    row_name: String,
    col_name: String,
    rows: Vec<CellKey>,
    cols: Vec<CellKey>,
    cells: Vec<Option<T>>,
}

/// Unchecked wire form of [`Table`].
#[derive(Deserialize)]
struct TableRepr<T> {
    row_name: String,
    col_name: String,
    rows: Vec<CellKey>,
    cols: Vec<CellKey>,
    cells: Vec<Option<T>>,
}

impl<T> TryFrom<TableRepr<T>> for Table<T> {
    type Error = Error;

    fn try_from(repr: TableRepr<T>) -> Result<Self> {
        let expected = repr.rows.len() * repr.cols.len();
        if repr.cells.len() != expected {
            return Err(Error::InvalidInput(format!(
                "table has {} cells but {} rows x {} columns need {expected}",
                repr.cells.len(),
                repr.rows.len(),
                repr.cols.len()
            )));
        }
        Ok(Self {
            row_name: repr.row_name,
            col_name: repr.col_name,
            rows: repr.rows,
            cols: repr.cols,
            cells: repr.cells,
        })
    }
}

impl<T> Table<T> {
    /// Create a table with zero rows and zero columns.
    #[must_use]
    pub fn empty(row_name: impl Into<String>, col_name: impl Into<String>) -> Self {
        Self {
            row_name: row_name.into(),
            col_name: col_name.into(),
            rows: Vec::new(),
            cols: Vec::new(),
            cells: Vec::new(),
        }
    }

    /// Create a table over the given vocabularies with every cell missing.
    #[must_use]
    pub fn with_vocabulary(
        row_name: impl Into<String>,
        col_name: impl Into<String>,
        rows: impl IntoIterator<Item = CellKey>,
        cols: impl IntoIterator<Item = CellKey>,
    ) -> Self {
        let rows: Vec<CellKey> = rows.into_iter().collect();
        let cols: Vec<CellKey> = cols.into_iter().collect();
        let cells = std::iter::repeat_with(|| None)
            .take(rows.len() * cols.len())
            .collect();
        Self {
            row_name: row_name.into(),
            col_name: col_name.into(),
            rows,
            cols,
            cells,
        }
    }

    /// Label of the row axis (the row field name).
    #[must_use]
    pub fn row_name(&self) -> &str {
        &self.row_name
    }

    /// Label of the column axis (the column field name).
    #[must_use]
    pub fn col_name(&self) -> &str {
        &self.col_name
    }

    /// Row keys, in table order.
    #[must_use]
    pub fn rows(&self) -> &[CellKey] {
        &self.rows
    }

    /// Column keys, in table order.
    #[must_use]
    pub fn cols(&self) -> &[CellKey] {
        &self.cols
    }

    /// `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    /// Check if the table has no rows or no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.cols.is_empty()
    }

    /// Number of present cells.
    #[must_use]
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Index of a row key.
    #[must_use]
    pub fn row_position(&self, key: &CellKey) -> Option<usize> {
        self.rows.iter().position(|r| r == key)
    }

    /// Index of a column key.
    #[must_use]
    pub fn col_position(&self, key: &CellKey) -> Option<usize> {
        self.cols.iter().position(|c| c == key)
    }

    /// Cell at `(row, col)`, or `None` if missing or outside the vocabulary.
    #[must_use]
    pub fn get(&self, row: impl Into<CellKey>, col: impl Into<CellKey>) -> Option<&T> {
        let r = self.row_position(&row.into())?;
        let c = self.col_position(&col.into())?;
        self.at(r, c)
    }

    /// Cell at positional indices.
    #[must_use]
    pub fn at(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.rows.len() || col >= self.cols.len() {
            return None;
        }
        self.cells[row * self.cols.len() + col].as_ref()
    }

    /// Overwrite the cell at positional indices, returning the old value.
    pub(crate) fn set_at(&mut self, row: usize, col: usize, value: Option<T>) -> Option<T> {
        let idx = row * self.cols.len() + col;
        std::mem::replace(&mut self.cells[idx], value)
    }

    /// Present cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &CellKey, &T)> {
        let ncols = self.cols.len();
        self.cells.iter().enumerate().filter_map(move |(idx, cell)| {
            cell.as_ref()
                .map(|v| (&self.rows[idx / ncols], &self.cols[idx % ncols], v))
        })
    }

    /// Cell-wise transform; missing cells stay missing.
    #[must_use]
    pub fn map<U, F>(&self, mut f: F) -> Table<U>
    where
        F: FnMut(&T) -> U,
    {
        Table {
            row_name: self.row_name.clone(),
            col_name: self.col_name.clone(),
            rows: self.rows.clone(),
            cols: self.cols.clone(),
            cells: self.cells.iter().map(|c| c.as_ref().map(&mut f)).collect(),
        }
    }
}

impl<T: Clone> Table<T> {
    /// Rearrange rows into `order`.
    ///
    /// Keys absent from this table become all-missing rows; rows not named
    /// in `order` are dropped. Used by reporting code to impose a
    /// presentation order.
    #[must_use]
    pub fn reindex_rows(&self, order: &[CellKey]) -> Self {
        let mut out = Self::with_vocabulary(
            self.row_name.clone(),
            self.col_name.clone(),
            order.iter().cloned(),
            self.cols.iter().cloned(),
        );
        for (r_out, key) in order.iter().enumerate() {
            if let Some(r_in) = self.row_position(key) {
                for c in 0..self.cols.len() {
                    out.set_at(r_out, c, self.at(r_in, c).cloned());
                }
            }
        }
        out
    }

    /// Keep only the columns in `order`, in that order.
    ///
    /// Keys absent from this table become all-missing columns.
    #[must_use]
    pub fn select_cols(&self, order: &[CellKey]) -> Self {
        let mut out = Self::with_vocabulary(
            self.row_name.clone(),
            self.col_name.clone(),
            self.rows.iter().cloned(),
            order.iter().cloned(),
        );
        for (c_out, key) in order.iter().enumerate() {
            if let Some(c_in) = self.col_position(key) {
                for r in 0..self.rows.len() {
                    out.set_at(r, c_out, self.at(r, c_in).cloned());
                }
            }
        }
        out
    }
}

impl Table<f64> {
    /// Cell value with missing cells as NaN.
    #[must_use]
    pub fn value_or_nan(&self, row: impl Into<CellKey>, col: impl Into<CellKey>) -> f64 {
        self.get(row, col).copied().unwrap_or(f64::NAN)
    }

    /// All cells of one row, in column order.
    #[must_use]
    pub fn row_values(&self, row: impl Into<CellKey>) -> Option<Vec<Option<f64>>> {
        let r = self.row_position(&row.into())?;
        Some((0..self.cols.len()).map(|c| self.at(r, c).copied()).collect())
    }

    /// All cells of one column, in row order.
    #[must_use]
    pub fn column_values(&self, col: impl Into<CellKey>) -> Option<Vec<Option<f64>>> {
        let c = self.col_position(&col.into())?;
        Some((0..self.rows.len()).map(|r| self.at(r, c).copied()).collect())
    }

    /// Serialize to JSON for external plotting code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Key of `field` in `record`.
fn record_key(record: &FlatRecord, field: &str) -> Result<CellKey> {
    let value = record.field(field).ok_or_else(|| Error::MissingField {
        field: field.to_string(),
    })?;
    CellKey::from_field(value, field)
}

/// Numeric cell value of `field` in `record`.
///
/// Absent fields and non-finite values (`nan`, `inf` printed by the
/// benchmark) are missing cells.
fn record_value(record: &FlatRecord, field: &str) -> Result<Option<f64>> {
    let Some(value) = record.field(field) else {
        return Ok(None);
    };
    if let Field::Metric(Value::Sequence(_)) = value {
        return Err(Error::InvalidInput(format!(
            "field '{field}' of {} is a sequence, not a scalar cell value",
            record.source()
        )));
    }
    match value.to_number() {
        Some(v) if v.is_finite() => Ok(Some(v)),
        Some(v) => {
            debug!(file = %record.source(), field, value = v, "non-finite value stored as missing cell");
            Ok(None)
        }
        None => Err(Error::InvalidInput(format!(
            "field '{field}' of {} is not numeric",
            record.source()
        ))),
    }
}

/// Sorted distinct row and column keys of the records admitted by `predicate`.
pub(crate) fn vocabulary<'a, I, P>(
    records: I,
    spec: &TableSpec,
    predicate: P,
) -> Result<(BTreeSet<CellKey>, BTreeSet<CellKey>)>
where
    I: IntoIterator<Item = &'a FlatRecord>,
    P: Fn(&FlatRecord) -> bool,
{
    let mut rows = BTreeSet::new();
    let mut cols = BTreeSet::new();
    for record in records.into_iter().filter(|r| predicate(r)) {
        rows.insert(record_key(record, &spec.row)?);
        cols.insert(record_key(record, &spec.col)?);
    }
    Ok((rows, cols))
}

/// Write the admitted records into `table`; keys outside its vocabulary
/// are skipped.
pub(crate) fn fill<P>(
    table: &mut Table<f64>,
    records: &[FlatRecord],
    spec: &TableSpec,
    predicate: P,
) -> Result<()>
where
    P: Fn(&FlatRecord) -> bool,
{
    for record in records.iter().filter(|r| predicate(r)) {
        let row = record_key(record, &spec.row)?;
        let col = record_key(record, &spec.col)?;
        let value = record_value(record, &spec.value)?;

        let (Some(r), Some(c)) = (table.row_position(&row), table.col_position(&col)) else {
            debug!(file = %record.source(), %row, %col, "cell outside vocabulary, skipped");
            continue;
        };
        if let Some(old) = table.set_at(r, c, value) {
            debug!(file = %record.source(), %row, %col, old, "overwrote duplicate cell");
        }
    }
    Ok(())
}

/// Build a table from the records admitted by `predicate`.
///
/// Later records overwrite earlier ones at the same cell. A record lacking
/// the value field writes a missing cell. No admitted records yields an
/// empty table, not an error.
///
/// # Errors
///
/// Returns [`Error::MissingField`] if an admitted record lacks the row or
/// column field, and [`Error::InvalidInput`] if a key or value has the
/// wrong shape.
pub fn build<P>(records: &[FlatRecord], spec: &TableSpec, predicate: P) -> Result<Table>
where
    P: Fn(&FlatRecord) -> bool,
{
    let (rows, cols) = vocabulary(records, spec, &predicate)?;
    let mut table = Table::with_vocabulary(spec.row.as_str(), spec.col.as_str(), rows, cols);
    fill(&mut table, records, spec, &predicate)?;
    debug!(
        row = %spec.row,
        col = %spec.col,
        value = %spec.value,
        shape = ?table.shape(),
        "built table"
    );
    Ok(table)
}

/// Build a table from every record.
///
/// # Errors
///
/// See [`build`].
pub fn build_all(records: &[FlatRecord], spec: &TableSpec) -> Result<Table> {
    build(records, spec, always)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(work: &str, threads: &str, throughput: f64) -> FlatRecord {
        FlatRecord::builder(format!("{work}-{threads}.txt"))
            .meta("work", work)
            .meta("threads", threads)
            .metric("throughput", throughput)
            .build()
    }

    fn spec() -> TableSpec {
        TableSpec::new("threads", "work", "throughput")
    }

    #[test]
    fn test_build_sorted_vocabulary() {
        let records = vec![record("work", "8", 20.0), record("work", "4", 10.0)];
        let table = build_all(&records, &spec()).unwrap();

        assert_eq!(table.rows(), [CellKey::from(4), CellKey::from(8)]);
        assert_eq!(table.cols(), [CellKey::from("work")]);
        assert_eq!(table.get(4, "work"), Some(&10.0));
        assert_eq!(table.get(8, "work"), Some(&20.0));
        assert_eq!(table.row_name(), "threads");
        assert_eq!(table.col_name(), "work");
    }

    #[test]
    fn test_predicate_excluding_all_gives_empty_table() {
        let records = vec![record("a", "1", 1.0)];
        let table = build(&records, &spec(), |_| false).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.shape(), (0, 0));
        assert_eq!(table.count(), 0);
    }

    #[test]
    fn test_last_write_wins() {
        let records = vec![record("a", "1", 1.0), record("a", "1", 2.0)];
        let table = build_all(&records, &spec()).unwrap();
        assert_eq!(table.get(1, "a"), Some(&2.0));
    }

    #[test]
    fn test_missing_value_field_is_missing_cell() {
        let records = vec![
            record("a", "1", 1.0),
            FlatRecord::builder("b-2.txt").meta("work", "b").meta("threads", "2").build(),
        ];
        let table = build_all(&records, &spec()).unwrap();

        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.get(2, "b"), None);
        assert!(table.value_or_nan(2, "b").is_nan());
        assert_eq!(table.get(2, "a"), None);
    }

    #[test]
    fn test_missing_key_field_is_error() {
        let records = vec![FlatRecord::builder("x.txt").metric("throughput", 1.0).build()];
        let err = build_all(&records, &spec()).unwrap_err();
        assert!(matches!(err, Error::MissingField { field } if field == "threads"));
    }

    #[test]
    fn test_sequence_value_is_error() {
        let records = vec![FlatRecord::builder("x.txt")
            .meta("work", "a")
            .meta("threads", "1")
            .metric("throughput", vec![1.0, 2.0])
            .build()];
        assert!(matches!(
            build_all(&records, &spec()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_metadata_value_field() {
        let records = vec![record("a", "1", 1.0)];
        let table = build_all(&records, &TableSpec::new("work", "work", "threads")).unwrap();
        assert_eq!(table.get("a", "a"), Some(&1.0));
    }

    #[test]
    fn test_iter_and_map() {
        let records = vec![record("a", "1", 1.0), record("b", "2", 4.0)];
        let table = build_all(&records, &spec()).unwrap();

        let cells: Vec<_> = table.iter().map(|(r, c, v)| (r.to_string(), c.to_string(), *v)).collect();
        assert_eq!(
            cells,
            vec![("1".to_string(), "a".to_string(), 1.0), ("2".to_string(), "b".to_string(), 4.0)]
        );

        let doubled = table.map(|v| v * 2.0);
        assert_eq!(doubled.get(2, "b"), Some(&8.0));
        assert_eq!(doubled.get(1, "b"), None);
    }

    #[test]
    fn test_reindex_and_select() {
        let records = vec![record("a", "1", 1.0), record("b", "2", 4.0)];
        let table = build_all(&records, &spec()).unwrap();

        let reordered = table
            .reindex_rows(&[CellKey::from(2), CellKey::from(1), CellKey::from(3)])
            .select_cols(&[CellKey::from("b")]);
        assert_eq!(reordered.shape(), (3, 1));
        assert_eq!(reordered.column_values("b"), Some(vec![Some(4.0), None, None]));
        assert_eq!(reordered.row_values(2), Some(vec![Some(4.0)]));
    }

    #[test]
    fn test_nan_value_is_missing_cell() {
        let metrics = crate::parse::parse_output("[EXPOUT]throughput: nan\n").unwrap();
        let records = vec![
            FlatRecord::new("x-4.txt", metrics).with_metadata([("work", "x"), ("threads", "4")]),
            record("x", "8", f64::INFINITY),
        ];
        let table = build_all(&records, &spec()).unwrap();

        assert_eq!(table.shape(), (2, 1));
        assert_eq!(table.get(4, "x"), None);
        assert_eq!(table.get(8, "x"), None);
        assert_eq!(table.count(), 0);
    }

    #[test]
    fn test_json_rejects_wrong_cell_count() {
        let json = r#"{"row_name":"threads","col_name":"work","rows":[1.0,2.0],"cols":["x"],"cells":[1.0]}"#;
        let err = serde_json::from_str::<Table>(json).unwrap_err();
        assert!(err.to_string().contains("2 rows x 1 columns"));

        let ok = r#"{"row_name":"threads","col_name":"work","rows":[1.0,2.0],"cols":["x"],"cells":[1.0,null]}"#;
        let table: Table = serde_json::from_str(ok).unwrap();
        assert_eq!(table.get(1, "x"), Some(&1.0));
        assert_eq!(table.get(2, "x"), None);
    }

    #[test]
    fn test_infinite_key_round_trips_as_text() {
        let records = vec![FlatRecord::builder("x.txt")
            .meta("work", "x")
            .metric("threads", f64::INFINITY)
            .metric("throughput", 1.0)
            .build()];
        let table = build_all(&records, &spec()).unwrap();
        assert_eq!(table.rows(), [CellKey::from("inf")]);

        let back: Table = serde_json::from_str(&table.to_json().unwrap()).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_json_round_trip() {
        let records = vec![record("a", "1", 1.0)];
        let table = build_all(&records, &spec()).unwrap();
        let json = table.to_json().unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
