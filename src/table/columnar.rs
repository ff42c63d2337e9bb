//! Columnar export (Arrow)
//!
//! An aggregated table becomes one record batch: a key column named after
//! the row field, then one nullable `Float64` column per column key.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use super::{CellKey, Table};
use crate::Result;

impl Table<f64> {
    /// Convert to an Arrow record batch.
    ///
    /// The key column is `Float64` when every row key is numeric and `Utf8`
    /// otherwise. Missing cells are nulls.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Arrow`] if the batch cannot be assembled.
    ///
    /// # Example
    ///
    /// ```rust
    /// use expout_tables::record::FlatRecord;
    /// use expout_tables::table::{build_all, TableSpec};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let records = vec![
    ///     FlatRecord::builder("bubble-4.txt").meta("work", "bubble").meta("threads", "4").metric("ingest", 1.5).build(),
    /// ];
    /// let table = build_all(&records, &TableSpec::new("threads", "work", "ingest"))?;
    /// let batch = table.to_record_batch()?;
    ///
    /// assert_eq!(batch.num_rows(), 1);
    /// assert_eq!(batch.num_columns(), 2);
    /// assert_eq!(batch.schema().field(0).name(), "threads");
    /// # Ok(())
    /// # }
    /// ```
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let numeric_rows = self.rows().iter().all(|k| matches!(k, CellKey::Number(_)));

        let (key_type, key_array): (DataType, ArrayRef) = if numeric_rows {
            let keys: Vec<f64> = self.rows().iter().filter_map(CellKey::as_number).collect();
            (DataType::Float64, Arc::new(Float64Array::from(keys)))
        } else {
            let keys: Vec<String> = self.rows().iter().map(ToString::to_string).collect();
            (DataType::Utf8, Arc::new(StringArray::from(keys)))
        };

        let mut fields = vec![Field::new(self.row_name(), key_type, false)];
        let mut columns = vec![key_array];

        for (c, key) in self.cols().iter().enumerate() {
            let values: Vec<Option<f64>> = (0..self.rows().len()).map(|r| self.at(r, c).copied()).collect();
            fields.push(Field::new(key.to_string(), DataType::Float64, true));
            columns.push(Arc::new(Float64Array::from(values)) as ArrayRef);
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }
}
