//! Cell reducers and the positional combinator
//!
//! A reducer collapses the values one cell received across repetitions
//! into a single number. NaN means "no data" and is never replaced by 0.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::table::{CellKey, Table};
use crate::{Error, Result};

/// Collapse a cell's sample into one value.
pub trait CellReducer {
    /// Reduce `values`; NaN signals that nothing usable remained.
    fn reduce(&self, values: &[f64]) -> f64;
}

impl<F> CellReducer for F
where
    F: Fn(&[f64]) -> f64,
{
    fn reduce(&self, values: &[f64]) -> f64 {
        self(values)
    }
}

fn drop_nan(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    values.iter().sum::<f64>() / n
}

/// Percentile of sorted data with linear interpolation between closest
/// ranks (the rank of `pct` is `pct / 100 * (n - 1)`).
///
/// Returns NaN for empty input.
#[must_use]
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            #[allow(clippy::cast_precision_loss)]
            let rank = (pct / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let lo = rank.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let frac = rank - rank.floor();
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Arithmetic mean of the non-NaN values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mean;

impl CellReducer for Mean {
    fn reduce(&self, values: &[f64]) -> f64 {
        mean_of(&drop_nan(values))
    }
}

/// Median of the non-NaN values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Median;

impl CellReducer for Median {
    fn reduce(&self, values: &[f64]) -> f64 {
        let mut kept = drop_nan(values);
        kept.sort_by(f64::total_cmp);
        percentile(&kept, 50.0)
    }
}

/// IQR outlier-trimmed mean.
///
/// 1. Drop NaN; nothing left gives NaN.
/// 2. Fewer than 4 values: plain mean.
/// 3. Otherwise keep values within
///    `[q_lo - m * iqr, q_hi + m * iqr]` (inclusive) and average them.
///
/// Deserialization applies the same checks as [`TrimmedMean::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TrimmedMeanParams")]
pub struct TrimmedMean {
    lower_pct: f64,
    upper_pct: f64,
    multiplier: f64,
}

impl Default for TrimmedMean {
    fn default() -> Self {
        Self {
            lower_pct: 25.0,
            upper_pct: 75.0,
            multiplier: 1.5,
        }
    }
}

/// Unchecked wire form of [`TrimmedMean`].
#[derive(Deserialize)]
struct TrimmedMeanParams {
    lower_pct: f64,
    upper_pct: f64,
    multiplier: f64,
}

impl TryFrom<TrimmedMeanParams> for TrimmedMean {
    type Error = Error;

    fn try_from(params: TrimmedMeanParams) -> Result<Self> {
        Self::new(params.lower_pct, params.upper_pct, params.multiplier)
    }
}

impl TrimmedMean {
    /// Smallest sample for which quartiles are computed
    pub const MIN_SAMPLE: usize = 4;

    /// Create a reducer with custom quartile bounds and IQR multiplier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] unless
    /// `0 <= lower_pct <= upper_pct <= 100` and `multiplier` is finite and
    /// non-negative.
    pub fn new(lower_pct: f64, upper_pct: f64, multiplier: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&lower_pct)
            || !(0.0..=100.0).contains(&upper_pct)
            || lower_pct > upper_pct
        {
            return Err(Error::InvalidInput(format!(
                "quartile bounds ({lower_pct}, {upper_pct}) must satisfy 0 <= lower <= upper <= 100"
            )));
        }
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(Error::InvalidInput(format!(
                "IQR multiplier {multiplier} must be finite and non-negative"
            )));
        }
        Ok(Self {
            lower_pct,
            upper_pct,
            multiplier,
        })
    }

    /// Lower and upper percentile.
    #[must_use]
    pub const fn bounds(&self) -> (f64, f64) {
        (self.lower_pct, self.upper_pct)
    }

    /// IQR multiplier.
    #[must_use]
    pub const fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

impl CellReducer for TrimmedMean {
    fn reduce(&self, values: &[f64]) -> f64 {
        let mut kept = drop_nan(values);
        if kept.len() < Self::MIN_SAMPLE {
            return mean_of(&kept);
        }

        kept.sort_by(f64::total_cmp);
        let q_lo = percentile(&kept, self.lower_pct);
        let q_hi = percentile(&kept, self.upper_pct);
        let iqr = q_hi - q_lo;
        let lo = self.multiplier.mul_add(-iqr, q_lo);
        let hi = self.multiplier.mul_add(iqr, q_hi);

        let inliers: Vec<f64> = kept.into_iter().filter(|v| (lo..=hi).contains(v)).collect();
        mean_of(&inliers)
    }
}

/// Trimmed mean with default bounds (25th/75th percentile, 1.5 × IQR).
///
/// ```
/// use expout_tables::aggregate::trimmed_mean;
///
/// assert_eq!(trimmed_mean(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]), 3.0);
/// assert_eq!(trimmed_mean(&[1.0, 2.0, 3.0]), 2.0);
/// assert!(trimmed_mean(&[f64::NAN, f64::NAN]).is_nan());
/// ```
#[must_use]
pub fn trimmed_mean(values: &[f64]) -> f64 {
    TrimmedMean::default().reduce(values)
}

/// Apply `reducer` positionally across tables.
///
/// The result's vocabulary is the union of all inputs' vocabularies. A cell
/// gathers values only from the tables that have it; a cell nobody has, or
/// whose reduction is NaN, is missing. Axis labels come from the first
/// table.
pub fn combine<R>(tables: &[Table], reducer: &R) -> Table
where
    R: CellReducer + ?Sized,
{
    let Some(first) = tables.first() else {
        return Table::empty("", "");
    };

    let rows: BTreeSet<CellKey> = tables.iter().flat_map(|t| t.rows().iter().cloned()).collect();
    let cols: BTreeSet<CellKey> = tables.iter().flat_map(|t| t.cols().iter().cloned()).collect();
    let mut out = Table::with_vocabulary(first.row_name(), first.col_name(), rows, cols);

    // Per input table: output position -> input position
    let row_maps: Vec<Vec<Option<usize>>> = tables
        .iter()
        .map(|t| out.rows().iter().map(|k| t.row_position(k)).collect())
        .collect();
    let col_maps: Vec<Vec<Option<usize>>> = tables
        .iter()
        .map(|t| out.cols().iter().map(|k| t.col_position(k)).collect())
        .collect();

    let (nrows, ncols) = out.shape();
    let mut sample = Vec::with_capacity(tables.len());
    for r in 0..nrows {
        for c in 0..ncols {
            sample.clear();
            for (t, table) in tables.iter().enumerate() {
                if let (Some(tr), Some(tc)) = (row_maps[t][r], col_maps[t][c]) {
                    if let Some(v) = table.at(tr, tc) {
                        sample.push(*v);
                    }
                }
            }
            if sample.is_empty() {
                continue;
            }
            let value = reducer.reduce(&sample);
            if value.is_nan() {
                warn!(row = %out.rows()[r], col = %out.cols()[c], samples = sample.len(), "no value survived reduction");
            } else {
                out.set_at(r, c, Some(value));
            }
        }
    }
    out
}
