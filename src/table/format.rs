//! Text rendering of tables
//!
//! Formatting is always passed in explicitly; there is no process-wide
//! display state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Table;

/// Options for rendering a table as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableFormat {
    /// Minimum width of every rendered column
    pub min_width: usize,
    /// Digits after the decimal point; `None` prints the shortest exact form
    pub precision: Option<usize>,
    /// Text shown for a missing cell
    pub missing: String,
    /// Field delimiter for CSV output
    pub delimiter: String,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            min_width: 6,
            precision: None,
            missing: "NaN".to_string(),
            delimiter: ",".to_string(),
        }
    }
}

impl TableFormat {
    /// Set the number of decimals.
    #[must_use]
    pub const fn precision(mut self, digits: usize) -> Self {
        self.precision = Some(digits);
        self
    }

    /// Set the minimum column width.
    #[must_use]
    pub const fn min_width(mut self, width: usize) -> Self {
        self.min_width = width;
        self
    }

    /// Set the placeholder for missing cells.
    #[must_use]
    pub fn missing(mut self, text: impl Into<String>) -> Self {
        self.missing = text.into();
        self
    }

    /// Set the CSV delimiter.
    #[must_use]
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    fn cell(&self, value: Option<&f64>) -> String {
        match (value, self.precision) {
            (None, _) => self.missing.clone(),
            (Some(v), Some(p)) => format!("{v:.p$}"),
            (Some(v), None) => v.to_string(),
        }
    }
}

impl Table<f64> {
    /// Render an aligned text grid, header first.
    ///
    /// The top-left corner shows `row_name\col_name`.
    #[must_use]
    pub fn render(&self, format: &TableFormat) -> String {
        let mut grid: Vec<Vec<String>> = Vec::with_capacity(self.rows().len() + 1);

        let mut header = vec![format!("{}\\{}", self.row_name(), self.col_name())];
        header.extend(self.cols().iter().map(ToString::to_string));
        grid.push(header);

        for (r, key) in self.rows().iter().enumerate() {
            let mut line = vec![key.to_string()];
            line.extend((0..self.cols().len()).map(|c| format.cell(self.at(r, c))));
            grid.push(line);
        }

        let ncols = self.cols().len() + 1;
        let widths: Vec<usize> = (0..ncols)
            .map(|c| {
                grid.iter()
                    .map(|line| line[c].chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(format.min_width)
            })
            .collect();

        let mut out = String::new();
        for line in &grid {
            let rendered: Vec<String> = line
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(c, (text, &w))| {
                    if c == 0 {
                        format!("{text:<w$}")
                    } else {
                        format!("{text:>w$}")
                    }
                })
                .collect();
            out.push_str(rendered.join("  ").trim_end());
            out.push('\n');
        }
        out
    }

    /// Render delimited text with a header line.
    ///
    /// Fields containing the delimiter or quotes are quoted.
    #[must_use]
    pub fn to_csv(&self, format: &TableFormat) -> String {
        let quote = |s: String| {
            if s.contains(format.delimiter.as_str()) || s.contains('"') || s.contains('\n') {
                format!("\"{}\"", s.replace('"', "\"\""))
            } else {
                s
            }
        };

        let mut out = String::new();
        let mut header = vec![quote(self.row_name().to_string())];
        header.extend(self.cols().iter().map(|c| quote(c.to_string())));
        out.push_str(&header.join(&format.delimiter));
        out.push('\n');

        for (r, key) in self.rows().iter().enumerate() {
            let mut line = vec![quote(key.to_string())];
            line.extend(
                (0..self.cols().len())
                    .map(|c| self.at(r, c).map_or_else(String::new, |v| quote(format.cell(Some(v))))),
            );
            out.push_str(&line.join(&format.delimiter));
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Table<f64> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&TableFormat::default()))
    }
}
